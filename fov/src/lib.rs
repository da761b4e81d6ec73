//! Generic field-of-view computation.
//!
//! Recursive shadowcasting over eight octants. The caller provides an
//! opacity predicate and a reveal callback, both operating on offsets from
//! the origin cell, so the algorithm knows nothing about maps or absolute
//! coordinates.

/// Octant transformation matrices, `[xx, xy, yx, yy]`.
const OCTANTS: [[i32; 4]; 8] = [
    [1, 0, 0, 1],
    [0, 1, 1, 0],
    [0, -1, 1, 0],
    [-1, 0, 0, 1],
    [-1, 0, 0, -1],
    [0, -1, -1, 0],
    [0, 1, -1, 0],
    [1, 0, 0, -1],
];

/// Compute field of view out to `radius` in the chessboard metric.
///
/// `blocks_sight` reports whether the cell at the given offset from the
/// origin is opaque. `reveal` is called for every visible cell, the origin
/// included. Opaque cells are themselves visible, only the cells behind
/// them fall in shadow. A cell may be revealed more than once when octant
/// seams overlap.
pub fn sweep<V, B, R>(radius: i32, mut blocks_sight: B, mut reveal: R)
where
    V: From<[i32; 2]>,
    B: FnMut(V) -> bool,
    R: FnMut(V),
{
    reveal(V::from([0, 0]));
    for m in &OCTANTS {
        cast(
            radius,
            1,
            1.0,
            0.0,
            m,
            &mut |p| blocks_sight(V::from(p)),
            &mut |p| reveal(V::from(p)),
        );
    }
}

/// Scan one octant from row `row` outward between slopes `start` and `end`.
fn cast(
    radius: i32,
    row: i32,
    mut start: f64,
    end: f64,
    m: &[i32; 4],
    blocks: &mut impl FnMut([i32; 2]) -> bool,
    reveal: &mut impl FnMut([i32; 2]),
) {
    if start < end {
        return;
    }

    let mut new_start = start;
    for dist in row..=radius {
        let dy = -dist;
        let mut blocked = false;
        for dx in -dist..=0 {
            // Slopes at the cell's far and near corners.
            let l_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
            let r_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);
            if start < r_slope {
                continue;
            }
            if end > l_slope {
                break;
            }

            let pos = [m[0] * dx + m[1] * dy, m[2] * dx + m[3] * dy];
            reveal(pos);

            if blocked {
                if blocks(pos) {
                    new_start = r_slope;
                } else {
                    blocked = false;
                    start = new_start;
                }
            } else if blocks(pos) && dist < radius {
                // A shadow starts here, scan the strip before it in a
                // narrowed sub-sweep and continue past it with this one.
                blocked = true;
                cast(radius, dist + 1, start, l_slope, m, blocks, reveal);
                new_start = r_slope;
            }
        }
        if blocked {
            break;
        }
    }
}
