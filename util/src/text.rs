//! Text processing utilities.

use glam::{ivec2, IVec2};

/// Iterate the non-space character cells of a text map.
///
/// Lines are y coordinates, columns are x coordinates. Space cells are
/// skipped so maps can be indented freely relative to the origin.
pub fn char_grid(text: &str) -> impl Iterator<Item = (IVec2, char)> + '_ {
    text.lines().enumerate().flat_map(|(y, line)| {
        line.chars().enumerate().filter_map(move |(x, c)| {
            (c != ' ').then_some((ivec2(x as i32, y as i32), c))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_cells() {
        let cells: Vec<_> = char_grid(
            "\
#.
 @",
        )
        .collect();
        assert_eq!(
            cells,
            vec![
                (ivec2(0, 0), '#'),
                (ivec2(1, 0), '.'),
                (ivec2(1, 1), '@')
            ]
        );
    }
}
