//! Monster decision logic, a per-actor finite state machine.

use serde::{Deserialize, Serialize};
use util::{RngExt, VecExt};

use crate::prelude::*;

/// Behavior state of an AI-controlled actor.
///
/// Transient decision data lives inside the variants so states that would
/// need it can't exist without it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Idle until the target shows up.
    #[default]
    Resting,
    /// Moving roughly along a stored direction with no destination.
    Wandering { dir: IVec2 },
    /// Following a path toward a fixed destination.
    Traveling {
        path: Vec<IVec2>,
        dest: IVec2,
        /// Wander direction to continue in after arriving.
        onward: IVec2,
    },
    /// Engaging a target that is visible or was seen a moment ago.
    Fighting { last_known: IVec2 },
}

/// What a state handler decided.
enum Verdict {
    Act(Action),
    Switch(Behavior),
}

impl Entity {
    pub fn behavior(&self, r: &impl AsRef<Runtime>) -> Behavior {
        self.get::<Behavior>(r)
    }

    /// Choose an action from the current behavior state and the
    /// just-computed field of view.
    ///
    /// At most one state transition happens per decision: the new state's
    /// handler runs exactly once, and if it wants to switch again the
    /// extra transition is saved for the next turn and the actor waits.
    /// Every path out of here yields a nonzero-cost action.
    pub(crate) fn decide(&self, r: &mut Runtime, view: &FovResult) -> Action {
        let mut state = self.behavior(r);
        for _ in 0..2 {
            match self.run_state(r, view, &mut state) {
                Verdict::Act(action) => {
                    self.set(r, state);
                    return action;
                }
                Verdict::Switch(next) => state = next,
            }
        }
        self.set(r, state);
        Action::Wait
    }

    fn run_state(
        &self,
        r: &mut Runtime,
        view: &FovResult,
        state: &mut Behavior,
    ) -> Verdict {
        let Some(loc) = self.loc(r) else {
            return Verdict::Act(Action::Wait);
        };
        let target = self.visible_target(r, view);

        match state {
            Behavior::Resting => {
                if let Some(target) = target {
                    if let Some(pos) = target.loc(r) {
                        return Verdict::Switch(Behavior::Fighting {
                            last_known: pos,
                        });
                    }
                }
                Verdict::Act(Action::Wait)
            }

            Behavior::Fighting { last_known } => {
                if let Some(target) = target {
                    let Some(target_loc) = target.loc(r) else {
                        return Verdict::Act(Action::Wait);
                    };
                    *last_known = target_loc;
                    Verdict::Act(self.engage(r, loc, target, target_loc))
                } else {
                    self.chase_or_give_up(r, loc, *last_known, view)
                }
            }

            Behavior::Traveling { path, dest, onward } => {
                if let Some(pos) = target.and_then(|t| t.loc(r)) {
                    return Verdict::Switch(Behavior::Fighting {
                        last_known: pos,
                    });
                }

                let stale = path.first() != Some(&loc)
                    || path.get(1).map_or(false, |&next| {
                        !self.can_enter(r, next)
                            || !r.move_legal(loc, next - loc)
                    });
                if stale {
                    // Recompute toward the same destination; an empty
                    // result makes us wait and retry next turn.
                    *path = r.shortest_path(loc, *dest, false);
                }

                if path.len() > 1 {
                    let step = path[1] - loc;
                    path.remove(0);
                    Verdict::Act(Action::Move(step))
                } else if path.len() == 1 && path[0] == *dest {
                    // Arrived, keep going in the stored direction.
                    Verdict::Switch(Behavior::Wandering { dir: *onward })
                } else {
                    Verdict::Act(Action::Wait)
                }
            }

            Behavior::Wandering { dir } => {
                if let Some(pos) = target.and_then(|t| t.loc(r)) {
                    return Verdict::Switch(Behavior::Fighting {
                        last_known: pos,
                    });
                }

                // Prefer the step closest to continuing straight on.
                let preferred = loc + *dir;
                let step = DIR_8
                    .iter()
                    .filter(|&&d| {
                        self.can_enter(r, loc + d) && r.move_legal(loc, d)
                    })
                    .min_by_key(|&&d| {
                        (loc + d - preferred).length_squared()
                    })
                    .copied();

                match step {
                    Some(d) => {
                        *dir = d;
                        Verdict::Act(Action::Move(d))
                    }
                    None => Verdict::Switch(Behavior::Resting),
                }
            }
        }
    }

    /// Attack a visible target: ranged specials at range, melee specials
    /// or plain hits when adjacent, otherwise close in.
    fn engage(
        &self,
        r: &mut Runtime,
        loc: IVec2,
        target: Entity,
        target_loc: IVec2,
    ) -> Action {
        let adjacent = (target_loc - loc).is_adjacent();
        let special = self.special(r);

        if let Some(ref sp) = special {
            if !sp.ability.is_melee()
                && (!adjacent || !sp.prefers_melee)
                && r.rng.percent_chance(sp.frequency)
            {
                if let Some(action) =
                    self.ranged_action(r, sp.ability, loc, target_loc)
                {
                    return action;
                }
            }
        }

        if adjacent {
            if let Some(ref sp) = special {
                if sp.ability.is_melee()
                    && r.rng.percent_chance(sp.frequency)
                {
                    return Action::SpecialMelee(
                        target,
                        sp.ability.to_string(),
                    );
                }
            }
            return Action::Attack(target);
        }

        let path = r.shortest_path(loc, target_loc, false);
        if path.len() > 1 {
            Action::Move(path[1] - loc)
        } else {
            // Boxed in by other actors, stand and wait for an opening.
            Action::Wait
        }
    }

    /// Validate a ranged ability against the target before committing, a
    /// failed ranged action would cost no turn and re-run the same
    /// decision.
    fn ranged_action(
        &self,
        r: &Runtime,
        ability: Ability,
        loc: IVec2,
        target_loc: IVec2,
    ) -> Option<Action> {
        let delta = target_loc - loc;
        match ability {
            Ability::Arrow | Ability::Pounce => {
                // Only usable along a straight scan line.
                if delta.x != 0 && delta.y != 0 && delta.x.abs() != delta.y.abs()
                {
                    return None;
                }
                let dir = loc.dir_towards(&target_loc);
                let found = r.scan_target(loc, dir, FOV_RADIUS)?;
                if found.loc(r) != Some(target_loc) {
                    return None;
                }
                if ability == Ability::Pounce {
                    let landing = target_loc - dir;
                    if landing != loc && !self.can_enter(r, landing) {
                        return None;
                    }
                    Some(Action::Pounce(dir))
                } else {
                    Some(Action::FireArrow(dir))
                }
            }
            Ability::Grenade => {
                ability.action(r, *self, Some(loc.dir_towards(&target_loc)))
            }
            Ability::HasteAll | Ability::Haste => {
                ability.action(r, *self, None)
            }
            _ => None,
        }
    }

    /// The target vanished from sight: if its last known position has an
    /// unseen escape corridor next to it, head there; otherwise give up.
    fn chase_or_give_up(
        &self,
        r: &Runtime,
        loc: IVec2,
        last_known: IVec2,
        view: &FovResult,
    ) -> Verdict {
        for &d in DIR_8.iter() {
            let cell = last_known + d;
            if r.terrain.get(cell).is_passable() && !view.contains(cell) {
                let path = r.shortest_path(loc, last_known, false);
                if path.is_empty() {
                    break;
                }
                return Verdict::Switch(Behavior::Traveling {
                    path,
                    dest: last_known,
                    onward: d,
                });
            }
        }
        Verdict::Switch(Behavior::Resting)
    }

    /// The enemy this actor would fight, the player for every monster.
    fn visible_target(
        &self,
        r: &impl AsRef<Runtime>,
        view: &FovResult,
    ) -> Option<Entity> {
        view.actors.iter().find(|e| e.is_player(r)).copied()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        data::{MonsterFactory, MonsterSpec},
        prelude::*,
    };

    /// Bestiary with an extra 'd' template carrying the given special.
    fn factory(code: &str, frequency: f64, prefers_melee: bool) -> MonsterFactory {
        let mut ret = MonsterFactory::bestiary();
        ret.register(MonsterSpec {
            name: "dummy".into(),
            icon: 'd',
            level: 2,
            attack: 30,
            defense: 50,
            special_code: code.into(),
            special_frequency: frequency,
            prefers_melee,
            ..Default::default()
        });
        ret
    }

    fn mob(r: &Runtime, icon: char) -> Entity {
        r.live_entities()
            .find(|e| !e.is_player(r) && e.icon(r) == icon)
            .unwrap()
    }

    fn decision(r: &mut Runtime, e: Entity) -> Action {
        let loc = e.loc(r).unwrap();
        let view = r.fov_from(loc, FOV_RADIUS);
        e.decide(r, &view)
    }

    #[test]
    fn resting_monster_stays_put() {
        let mut r = Runtime::new(
            1,
            "\
xxxxxxx
x@x.l.x
xxxxxxx",
        )
        .unwrap();
        let m = mob(&r, 'l');

        for _ in 0..5 {
            assert_eq!(decision(&mut r, m), Action::Wait);
            assert_eq!(m.behavior(&r), Behavior::Resting);
        }
    }

    #[test]
    fn sighting_switches_to_fighting() {
        let mut r = Runtime::new(
            1,
            "\
xxxxxx
x@..lx
xxxxxx",
        )
        .unwrap();
        let m = mob(&r, 'l');

        // Closes in along the corridor toward the player.
        assert_eq!(decision(&mut r, m), Action::Move(ivec2(-1, 0)));
        assert_eq!(
            m.behavior(&r),
            Behavior::Fighting {
                last_known: ivec2(1, 1)
            }
        );
    }

    #[test]
    fn zero_frequency_special_never_fires() {
        let f = factory("CRITICAL", 0.0, true);
        let mut r = Runtime::with_factory(
            1,
            "\
xxxx
x@dx
xxxx",
            &f,
        )
        .unwrap();
        let m = mob(&r, 'd');
        let player = r.player().unwrap();

        for _ in 0..20 {
            assert_eq!(decision(&mut r, m), Action::Attack(player));
        }
    }

    #[test]
    fn certain_melee_special_always_fires() {
        let f = factory("CRITICAL", 100.0, true);
        let mut r = Runtime::with_factory(
            1,
            "\
xxxx
x@dx
xxxx",
            &f,
        )
        .unwrap();
        let m = mob(&r, 'd');
        let player = r.player().unwrap();

        assert_eq!(
            decision(&mut r, m),
            Action::SpecialMelee(player, "CRITICAL".into())
        );
    }

    #[test]
    fn archer_shoots_along_open_line() {
        let f = factory("ARROW", 100.0, true);
        let mut r = Runtime::with_factory(
            1,
            "\
xxxxxx
x@..dx
xxxxxx",
            &f,
        )
        .unwrap();
        let m = mob(&r, 'd');

        assert_eq!(decision(&mut r, m), Action::FireArrow(ivec2(-1, 0)));
    }

    #[test]
    fn traveler_reroutes_around_blockers() {
        // Player sealed in its own cell so nobody switches to fighting.
        let mut r = Runtime::new(
            1,
            "\
xxxxxxx
xlb...x
x.....x
xxxxxxx
x@xxxxx
xxxxxxx",
        )
        .unwrap();
        let m = mob(&r, 'l');
        m.set(
            &mut r,
            Behavior::Traveling {
                path: vec![
                    ivec2(1, 1),
                    ivec2(2, 1),
                    ivec2(3, 1),
                    ivec2(4, 1),
                    ivec2(5, 1),
                ],
                dest: ivec2(5, 1),
                onward: ivec2(1, 0),
            },
        );

        // The boxer sits on the next path cell, so the path is stale and
        // gets recomputed through the open row below.
        assert_eq!(decision(&mut r, m), Action::Move(ivec2(1, 1)));
        match m.behavior(&r) {
            Behavior::Traveling { path, dest, .. } => {
                assert_eq!(path.first(), Some(&ivec2(2, 2)));
                assert_eq!(dest, ivec2(5, 1));
            }
            other => panic!("unexpected behavior {other:?}"),
        }
    }
}
