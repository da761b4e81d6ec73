//! Field-of-view plumbing between the terrain and the fov crate.

use crate::{ecs::Memory, prelude::*};

/// What a viewpoint can see: cells, and the actors standing on them.
///
/// Always computed fresh right before its user makes a decision, never
/// cached across turns.
#[derive(Clone, Debug, Default)]
pub struct FovResult {
    pub origin: IVec2,
    pub cells: HashSet<IVec2>,
    /// Visible actors, the viewer itself excluded. Deterministic order.
    pub actors: Vec<Entity>,
}

impl FovResult {
    pub fn contains(&self, pos: IVec2) -> bool {
        self.cells.contains(&pos)
    }
}

impl Runtime {
    /// Compute the field of view from a cell.
    ///
    /// Opaque cells are visible but block sight past themselves. The
    /// result never reaches outside the radius in the chessboard metric.
    pub fn fov_from(&self, origin: IVec2, radius: i32) -> FovResult {
        let mut cells = HashSet::default();
        fov::sweep(
            radius,
            |v: IVec2| self.terrain.get(origin + v).blocks_sight(),
            |v: IVec2| {
                cells.insert(origin + v);
            },
        );

        let actors = self
            .placement
            .all_entities()
            .filter(|e| {
                self.placement.entity_pos(e).map_or(false, |pos| {
                    pos != origin && cells.contains(&pos)
                })
            })
            .collect();

        FovResult {
            origin,
            cells,
            actors,
        }
    }

    /// Recompute the player's field of view and extend the player's map
    /// memory with the newly seen cells.
    pub(crate) fn update_player_fov(&mut self) {
        let Some(player) = self.player else { return };
        let Some(loc) = player.loc(self) else { return };

        let view = self.fov_from(loc, FOV_RADIUS);
        player.with_mut(self, |memory: &mut Memory| {
            memory.0.extend(view.cells.iter().copied());
        });
        self.player_fov = view;
    }

    /// The player's current field of view, for display.
    pub fn player_fov(&self) -> &FovResult {
        &self.player_fov
    }
}
