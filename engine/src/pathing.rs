//! Grid pathfinding on top of the terrain and the occupancy index.

use pathfinding::prelude::bfs;

use crate::prelude::*;

impl Runtime {
    /// Shortest path between two cells, inclusive of both ends.
    ///
    /// Breadth-first search over 8-directional steps. Cells occupied by
    /// actors are not traversable, except the source and, when
    /// `destination_must_be_clear` is false, the destination. Diagonal
    /// steps may not cut between two impassable corner cells. Returns an
    /// empty path when the destination is unreachable.
    pub fn shortest_path(
        &self,
        source: IVec2,
        dest: IVec2,
        destination_must_be_clear: bool,
    ) -> Vec<IVec2> {
        if source == dest {
            return vec![source];
        }

        bfs(
            &source,
            |&pos| self.walk_neighbors(pos, dest, destination_must_be_clear),
            |&pos| pos == dest,
        )
        .unwrap_or_default()
    }

    fn walk_neighbors(
        &self,
        pos: IVec2,
        dest: IVec2,
        destination_must_be_clear: bool,
    ) -> Vec<IVec2> {
        DIR_8
            .iter()
            .filter_map(|&d| {
                let next = pos + d;
                if !self.terrain.get(next).is_passable() {
                    return None;
                }
                if !self.move_legal(pos, d) {
                    return None;
                }
                if self.placement.entity_at(next).is_some()
                    && (next != dest || destination_must_be_clear)
                {
                    return None;
                }
                Some(next)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_grid_is_chebyshev_optimal() {
        let r = Runtime::new(
            1,
            "\
xxxxxxxxxx
x........x
x........x
x........x
x.@......x
xxxxxxxxxx",
        )
        .unwrap();

        for (dest, len) in [
            (ivec2(2, 4), 1),
            (ivec2(3, 4), 2),
            (ivec2(5, 1), 4),
            (ivec2(8, 4), 7),
        ] {
            let path = r.shortest_path(ivec2(2, 4), dest, false);
            assert_eq!(path.len(), len, "dest {dest}");
            assert_eq!(path.first(), Some(&ivec2(2, 4)));
            assert_eq!(path.last(), Some(&dest));
        }
    }

    #[test]
    fn no_corner_cutting() {
        // The only diagonal shortcut is pinched between two walls.
        let r = Runtime::new(
            1,
            "\
xxxxx
x@x.x
xx..x
x...x
xxxxx",
        )
        .unwrap();

        let path = r.shortest_path(ivec2(1, 1), ivec2(3, 1), false);
        // Stepping diagonally from (1,1) to (2,2) would cut between the
        // walls at (2,1) and (1,2), so there is no path at all.
        assert!(path.is_empty());
    }

    #[test]
    fn one_open_corner_allows_diagonal() {
        let r = Runtime::new(
            1,
            "\
xxxx
x@.x
xx.x
xxxx",
        )
        .unwrap();

        // (1,1) -> (2,2): corner (2,1) is open, diagonal is legal.
        let path = r.shortest_path(ivec2(1, 1), ivec2(2, 2), false);
        assert_eq!(path, vec![ivec2(1, 1), ivec2(2, 2)]);
    }

    #[test]
    fn occupied_cells_block() {
        let r = Runtime::new(
            1,
            "\
xxxxx
x...x
x@l.x
x...x
xxxxx",
        )
        .unwrap();
        let lancer = ivec2(2, 2);

        // Routing around the monster costs an extra step diagonal-wise.
        let path = r.shortest_path(ivec2(1, 2), ivec2(3, 2), false);
        assert_eq!(path.len(), 3);
        assert!(!path.contains(&lancer));

        // But a path may end on an occupied destination when allowed.
        let onto = r.shortest_path(ivec2(1, 2), lancer, false);
        assert_eq!(onto.last(), Some(&lancer));
        let clear = r.shortest_path(ivec2(1, 2), lancer, true);
        assert!(clear.is_empty());
    }

    #[test]
    fn unreachable_is_empty() {
        let r = Runtime::new(
            1,
            "\
xxxxx
x@x.x
xxxxx",
        )
        .unwrap();
        assert!(r.shortest_path(ivec2(1, 1), ivec2(3, 1), false).is_empty());
        // Degenerate path to self.
        assert_eq!(
            r.shortest_path(ivec2(1, 1), ivec2(1, 1), false),
            vec![ivec2(1, 1)]
        );
    }
}
