//! Game logic layer machinery.

/// How far can actors see.
pub const FOV_RADIUS: i32 = 4;

/// How many ticks does a complete turn contain.
pub const TURN_TICKS: i64 = 72;

/// Default monster action cost in ticks.
pub const NORMAL_SPEED: i64 = 12;

/// Player action cost, the player acts once per turn.
pub const PLAYER_SPEED: i64 = TURN_TICKS;

/// How many abilities fit in the player's hand.
pub const HAND_SIZE: usize = 7;

/// How many 0-cost re-decisions a single actor gets before the turn driver
/// declares a livelock.
pub const MAX_FREE_ACTIONS: usize = 1000;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

pub fn err<T>(msg: impl Into<String>) -> Result<T> {
    Err(anyhow::anyhow!(msg.into()))
}

mod ability;
pub use ability::Ability;

mod action;
pub use action::Action;

mod ai;
pub use ai::Behavior;

mod condition;
pub use condition::{Condition, ConditionKey, ConditionKind, Lifetime};

mod data;
pub use data::{ActorSnapshot, MonsterFactory, MonsterSpec, Snapshot};

pub mod ecs;

mod entity;
pub use entity::Entity;

mod fov;
pub use crate::fov::FovResult;

mod mob;
pub use mob::expected_hp;

mod msg;
pub use msg::MessageLog;

mod pathing;

mod placement;
pub use placement::Placement;

pub mod prelude;

mod queue;
pub use queue::{Schedulable, TurnQueue};

mod runtime;
pub use runtime::{Command, PlayerInput, Runtime, TurnOutcome};

mod terrain;
pub use terrain::{Element, Terrain, Tile};

mod time;
pub use time::Instant;
