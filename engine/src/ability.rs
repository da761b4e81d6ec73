use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::prelude::*;

/// Special ability, either a monster's innate attack or a card in the
/// player's hand.
///
/// The string forms are the ability codes used in content data.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    EnumString,
    strum::Display,
)]
pub enum Ability {
    /// Extra-damage melee hit.
    #[default]
    #[strum(serialize = "CRITICAL")]
    Critical,
    /// Melee hit that knocks the target back.
    #[strum(serialize = "KNOCK")]
    Knock,
    /// Webs the target in place.
    #[strum(serialize = "STICK")]
    Stick,
    /// Lob a timed explosive at a cell.
    #[strum(serialize = "GRENTHROW")]
    Grenade,
    /// Hit the first actor along a direction.
    #[strum(serialize = "ARROW")]
    Arrow,
    /// Leap next to a distant target and maul it.
    #[strum(serialize = "POUNCE")]
    Pounce,
    /// Hasten self.
    #[strum(serialize = "HASTE")]
    Haste,
    /// Hasten everyone in sight.
    #[strum(serialize = "HASTEALL")]
    HasteAll,
}

impl Ability {
    /// Melee abilities resolve as a modified adjacent attack.
    pub fn is_melee(self) -> bool {
        matches!(self, Ability::Critical | Ability::Knock | Ability::Stick)
    }

    /// Does using the ability require an aiming direction?
    pub fn is_directional(self) -> bool {
        !matches!(self, Ability::Haste | Ability::HasteAll)
    }

    pub fn name(self) -> &'static str {
        match self {
            Ability::Critical => "the damaging attack",
            Ability::Knock => "the punch",
            Ability::Stick => "web-spinning",
            Ability::Grenade => "grenade-throwing",
            Ability::Arrow => "archery",
            Ability::Pounce => "the pounce",
            Ability::Haste => "self-quickening",
            Ability::HasteAll => "the quickening field",
        }
    }

    /// Turn the ability into a concrete action for the given user.
    ///
    /// Returns `None` when the ability can't be used as aimed, e.g. a
    /// melee ability pointed at empty air.
    pub fn action(
        self,
        r: &Runtime,
        user: Entity,
        dir: Option<IVec2>,
    ) -> Option<Action> {
        let loc = user.loc(r)?;

        if self.is_melee() {
            let dir = dir?;
            let target = r.placement.entity_at(loc + dir)?;
            return Some(Action::SpecialMelee(target, self.to_string()));
        }

        match self {
            Ability::Grenade => {
                let cell = throw_cell(r, loc, dir?)?;
                Some(Action::ThrowGrenade(cell))
            }
            Ability::Arrow => Some(Action::FireArrow(dir?)),
            Ability::Pounce => Some(Action::Pounce(dir?)),
            Ability::Haste => Some(Action::Haste(user)),
            Ability::HasteAll => Some(Action::HasteAll),
            _ => None,
        }
    }
}

/// Farthest free cell a grenade thrown along `dir` can land on.
fn throw_cell(r: &Runtime, from: IVec2, dir: IVec2) -> Option<IVec2> {
    let mut landing = None;
    for i in 1..=FOV_RADIUS {
        let cell = from + dir * i;
        if !r.terrain.get(cell).is_passable() {
            break;
        }
        if r.placement.entity_at(cell).is_some() {
            break;
        }
        landing = Some(cell);
    }
    landing
}
