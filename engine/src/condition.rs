//! Time-limited status effects that can override an actor's actions.

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use strum::EnumDiscriminants;

use crate::{ecs::*, prelude::*};

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize,
)]
pub enum Lifetime {
    /// Expires after this many of the bearer's actions.
    Turns(i32),
    /// Lasts until explicitly cancelled.
    Indefinite,
}

/// Condition payloads.
///
/// The derived discriminant type is the uniqueness key, attaching a
/// condition replaces any existing one with the same key.
#[derive(
    Clone, Debug, Eq, PartialEq, Serialize, Deserialize, EnumDiscriminants,
)]
#[strum_discriminants(name(ConditionKey))]
#[strum_discriminants(derive(Ord, PartialOrd, Hash, Serialize, Deserialize))]
pub enum ConditionKind {
    /// Webbed in place, moves become waits.
    Stuck,
    /// Acting twice as fast.
    Haste,
    /// Counting down to an explosion.
    TimeBomb { timer: i32 },
    /// Recovering HP until disturbed.
    Resting,
    /// Dashing in a fixed direction until blocked.
    Running { dir: IVec2 },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub duration: Lifetime,
}

impl Condition {
    pub fn new(kind: ConditionKind, duration: Lifetime) -> Self {
        Condition { kind, duration }
    }

    pub fn key(&self) -> ConditionKey {
        ConditionKey::from(&self.kind)
    }
}

impl Entity {
    /// Attach a condition, replacing any same-keyed one.
    ///
    /// Replacement runs the old condition's cancel hook before the new
    /// one's attach hook so speed changes never compound.
    pub fn attach(&self, r: &mut Runtime, condition: Condition) {
        let key = condition.key();
        if self.has_condition(r, key) {
            self.detach(r, key);
        }

        self.run_attach_hook(r, &condition.kind);
        self.with_mut(r, |conds: &mut Conditions| {
            conds.0.insert(key, condition.clone());
        });
    }

    /// Cancel a condition, running the same cleanup a natural expiry
    /// would.
    pub fn detach(&self, r: &mut Runtime, key: ConditionKey) {
        let Some(condition) =
            self.with(r, |conds: &Conditions| conds.0.get(&key).cloned())
        else {
            return;
        };
        self.run_cancel_hook(r, &condition.kind);
        self.with_mut(r, |conds: &mut Conditions| {
            conds.0.remove(&key);
        });
    }

    pub fn has_condition(&self, r: &impl AsRef<Runtime>, key: ConditionKey) -> bool {
        self.with(r, |conds: &Conditions| conds.0.contains_key(&key))
    }

    /// Tick down every condition at the end of the bearer's action,
    /// expiring the exhausted ones.
    pub(crate) fn advance_conditions(&self, r: &mut Runtime) {
        let mut expired = Vec::new();
        self.with_mut(r, |conds: &mut Conditions| {
            for (key, condition) in conds.0.iter_mut() {
                if let Lifetime::Turns(ref mut t) = condition.duration {
                    *t -= 1;
                    if *t < 0 {
                        expired.push(*key);
                    }
                }
            }
        });
        for key in expired {
            self.detach(r, key);
        }
    }

    /// An action the actor's conditions force it to take instead of
    /// deciding for itself. With several offers one is chosen uniformly.
    pub(crate) fn forced_action(&self, r: &mut Runtime) -> Option<Action> {
        let conds = self.get::<Conditions>(r);
        let mut offers = Vec::new();
        for condition in conds.0.values() {
            match condition.kind {
                ConditionKind::TimeBomb { timer } => {
                    if timer <= 0 {
                        offers.push(Action::Detonate);
                    } else {
                        offers.push(Action::BombTick);
                    }
                }
                ConditionKind::Resting => {
                    let hp = self.hp(r);
                    if hp.current >= hp.max || self.sees_trouble(r) {
                        self.detach(r, ConditionKey::Resting);
                    } else {
                        offers.push(Action::Heal(*self, 1));
                    }
                }
                ConditionKind::Running { dir } => {
                    let blocked = match self.loc(r) {
                        Some(loc) => !self.can_enter(r, loc + dir),
                        None => true,
                    };
                    if blocked || self.sees_trouble(r) {
                        self.detach(r, ConditionKey::Running);
                    } else {
                        offers.push(Action::Move(dir));
                    }
                }
                _ => {}
            }
        }
        offers.choose(&mut r.rng).cloned()
    }

    /// Pass a chosen action through the conditions' rewrite hooks.
    pub(crate) fn filter_action(
        &self,
        r: &impl AsRef<Runtime>,
        action: Action,
    ) -> Action {
        if self.has_condition(r, ConditionKey::Stuck) {
            if let Action::Move(_) | Action::Pounce(_) = action {
                return Action::Wait;
            }
        }
        action
    }

    /// Glyph override from conditions, webbed actors show as a web.
    pub(crate) fn condition_icon(
        &self,
        r: &impl AsRef<Runtime>,
    ) -> Option<char> {
        if self.has_condition(r, ConditionKey::Stuck) {
            return Some('8');
        }
        None
    }

    /// Whether an enemy of this actor is in the viewer-relevant FOV.
    ///
    /// Used by conditions that break on contact. Only meaningful for the
    /// player, resting and running are player verbs.
    fn sees_trouble(&self, r: &Runtime) -> bool {
        if !self.is_player(r) {
            return false;
        }
        !r.player_fov.actors.is_empty()
    }

    fn run_attach_hook(&self, r: &mut Runtime, kind: &ConditionKind) {
        match kind {
            ConditionKind::Haste => {
                let speed = self.speed(r);
                self.set(r, Speed((speed / 2).max(1)));
                if let Some(pos) = self.loc(r) {
                    r.say_at(
                        pos,
                        format!(
                            "{} speed{} up.",
                            self.subject(r),
                            self.verb_s(r)
                        ),
                    );
                }
            }
            ConditionKind::Stuck => {
                if let Some(pos) = self.loc(r) {
                    let verb = if self.is_player(r) { "are" } else { "is" };
                    r.say_at(
                        pos,
                        format!(
                            "{} {verb} stuck in a web.",
                            self.subject(r)
                        ),
                    );
                }
            }
            _ => {}
        }
    }

    fn run_cancel_hook(&self, r: &mut Runtime, kind: &ConditionKind) {
        if let ConditionKind::Haste = kind {
            let speed = self.speed(r);
            self.set(r, Speed(speed * 2));
        }
    }
}
