//! Entity component system and the component types.

use std::collections::BTreeMap;

use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Entity component system. Stores all the data of game entities.
#[derive(Default, Deref, DerefMut)]
pub(crate) struct Ecs(pub(crate) hecs::World);

#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Name(pub String);

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Icon(pub char);

/// Ticks one default action costs the actor.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Speed(pub i64);

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Hp {
    pub current: i32,
    pub max: i32,
}

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Stats {
    /// General power, scales damage both ways.
    pub level: i32,
    /// Percentage offense multiplier.
    pub attack: i32,
    /// Percentage defense multiplier, lower is better.
    pub defense: i32,
}

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct IsMob(pub bool);

/// Name of the template the actor was spawned from.
#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Template(pub String);

/// Status effects on the actor, keyed so re-attaching replaces.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Default,
    Deref,
    DerefMut,
    Serialize,
    Deserialize,
)]
pub struct Conditions(pub BTreeMap<ConditionKey, Condition>);

/// Cells the player has observed at some point, display only.
#[derive(
    Clone, Debug, Eq, PartialEq, Default, Deref, DerefMut, Serialize,
    Deserialize,
)]
pub struct Memory(pub HashSet<IVec2>);

/// Abilities the player can use right now.
#[derive(
    Clone, Debug, Eq, PartialEq, Default, Deref, DerefMut, Serialize,
    Deserialize,
)]
pub struct Hand(pub Vec<Ability>);

/// Abilities waiting to be drawn, the last element is drawn first.
#[derive(
    Clone, Debug, Eq, PartialEq, Default, Deref, DerefMut, Serialize,
    Deserialize,
)]
pub struct Deck(pub Vec<Ability>);

/// Innate special attack of a monster.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SpecialAttack {
    pub ability: Ability,
    /// Percent chance per decision to use the ability.
    pub frequency: f64,
    /// Use a plain melee attack instead when adjacent to the target.
    pub prefers_melee: bool,
}

/// Explosive charge payload, offense stats are snapshotted from the
/// thrower so the explosion works even if the thrower has since died.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Fuse {
    pub attack: i32,
    pub level: i32,
}
