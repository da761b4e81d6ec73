use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Basic map cell, passability and opacity are independent properties.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize,
)]
pub enum Tile {
    #[default]
    Wall,
    Floor,
    /// Tunnel between rooms, walkable and see-through like floor but drawn
    /// differently.
    Corridor,
}

impl Tile {
    pub fn is_passable(self) -> bool {
        matches!(self, Tile::Floor | Tile::Corridor)
    }

    pub fn blocks_sight(self) -> bool {
        matches!(self, Tile::Wall)
    }

    pub fn glyph(self) -> char {
        match self {
            Tile::Wall => 'X',
            Tile::Floor => '.',
            Tile::Corridor => '#',
        }
    }
}

/// Fixed map furniture sitting on top of a tile.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Element {
    Upstairs,
    Downstairs,
}

impl Element {
    pub fn glyph(self) -> char {
        match self {
            Element::Upstairs => '<',
            Element::Downstairs => '>',
        }
    }
}

/// Level map, a fixed-size rectangular tile grid.
///
/// Cells outside the grid read as wall.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Terrain {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    elements: Vec<(IVec2, Element)>,
}

impl Terrain {
    pub fn new(width: i32, height: i32) -> Self {
        Terrain {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
            elements: Vec::new(),
        }
    }

    /// Build terrain from a text map.
    ///
    /// `.` is floor, `#` is corridor, `<` and `>` are stairs on floor and
    /// any other glyph is wall. Glyphs that look like creatures, `@` and
    /// letters, read as floor and are returned separately so the caller
    /// can spawn actors on them.
    pub fn from_text(text: &str) -> (Self, Vec<(IVec2, char)>) {
        let width = text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0) as i32;
        let height = text.lines().count() as i32;

        let mut ret = Terrain::new(width, height);
        let mut spawns = Vec::new();
        for (pos, c) in util::text::char_grid(text) {
            let tile = match c {
                '.' => Tile::Floor,
                '#' => Tile::Corridor,
                '<' => {
                    ret.elements.push((pos, Element::Upstairs));
                    Tile::Floor
                }
                '>' => {
                    ret.elements.push((pos, Element::Downstairs));
                    Tile::Floor
                }
                // The conventional wall glyph in text maps, never a
                // creature.
                'x' | 'X' => Tile::Wall,
                c if c == '@' || c.is_ascii_alphabetic() => {
                    spawns.push((pos, c));
                    Tile::Floor
                }
                _ => Tile::Wall,
            };
            ret.set(pos, tile);
        }
        (ret, spawns)
    }

    pub fn contains(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn get(&self, pos: IVec2) -> Tile {
        if self.contains(pos) {
            self.tiles[(pos.y * self.width + pos.x) as usize]
        } else {
            Tile::default()
        }
    }

    pub fn set(&mut self, pos: IVec2, tile: Tile) {
        if self.contains(pos) {
            self.tiles[(pos.y * self.width + pos.x) as usize] = tile;
        }
    }

    pub fn element_at(&self, pos: IVec2) -> Option<Element> {
        self.elements
            .iter()
            .find_map(|&(p, e)| (p == pos).then_some(e))
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}
