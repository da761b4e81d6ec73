pub use crate::{
    err, Ability, Action, Behavior, Command, Condition, ConditionKey,
    ConditionKind, Element, Entity, FovResult, Instant, Lifetime,
    MessageLog, PlayerInput, Result, Runtime, Schedulable, Terrain, Tile,
    TurnOutcome, TurnQueue, FOV_RADIUS, HAND_SIZE, MAX_FREE_ACTIONS,
    NORMAL_SPEED, PLAYER_SPEED, TURN_TICKS,
};
pub use glam::{ivec2, IVec2};
pub use util::{HashMap, HashSet, VecExt, DIR_4, DIR_8};
