use std::collections::BTreeMap;

use crate::prelude::*;

/// Spatial index of live actors.
///
/// All occupancy reads and position changes must go through this one
/// structure so that movement resolution never sees stale positions. One
/// actor per cell.
#[derive(Default)]
pub struct Placement {
    positions: BTreeMap<Entity, IVec2>,
    cells: HashMap<IVec2, Entity>,
}

impl Placement {
    pub(crate) fn insert(&mut self, pos: IVec2, e: Entity) {
        debug_assert!(
            !self.cells.contains_key(&pos),
            "Placement::insert: cell {pos} already occupied"
        );
        if let Some(old) = self.positions.insert(e, pos) {
            self.cells.remove(&old);
        }
        self.cells.insert(pos, e);
    }

    pub(crate) fn remove(&mut self, e: &Entity) -> Option<IVec2> {
        let pos = self.positions.remove(e)?;
        self.cells.remove(&pos);
        Some(pos)
    }

    pub fn entity_at(&self, pos: IVec2) -> Option<Entity> {
        self.cells.get(&pos).copied()
    }

    pub fn entity_pos(&self, e: &Entity) -> Option<IVec2> {
        self.positions.get(e).copied()
    }

    /// Iterate live entities in a deterministic order.
    pub fn all_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.positions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
