//! Actor intents and their execution.

use std::str::FromStr;

use util::VecExt;

use crate::{
    ecs::*,
    mob::attack_damage,
    prelude::*,
    Lifetime::{Indefinite, Turns},
};

/// An intended effect and its targets.
///
/// Building an action mutates nothing. Execution validates the action
/// against current state, applies the effects and yields the tick cost. A
/// cost of zero means the action failed and no turn was consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Wait,
    /// Step in a direction.
    Move(IVec2),
    /// Plain melee attack.
    Attack(Entity),
    /// Melee attack modified by an ability code from content data.
    SpecialMelee(Entity, String),
    /// Lob an explosive charge onto a cell.
    ThrowGrenade(IVec2),
    /// Hit the first actor along a direction.
    FireArrow(IVec2),
    /// Leap next to a distant target along a direction and maul it.
    Pounce(IVec2),
    Haste(Entity),
    HasteAll,
    Heal(Entity, i32),
    /// A primed charge burning down its fuse.
    BombTick,
    Detonate,
    /// Climb the upstairs under the actor.
    Ascend,
}

impl Entity {
    /// Execute an action, returning the tick cost. Zero means the action
    /// was rejected and the actor should decide again.
    pub(crate) fn execute(&self, r: &mut Runtime, action: Action) -> i64 {
        match action {
            Action::Wait => self.speed(r),
            Action::Move(dir) => self.execute_move(r, dir),
            Action::Attack(target) => self.execute_attack(r, target, 1, None),
            Action::SpecialMelee(target, code) => {
                self.execute_special_melee(r, target, &code)
            }
            Action::ThrowGrenade(cell) => self.execute_throw(r, cell),
            Action::FireArrow(dir) => self.execute_arrow(r, dir),
            Action::Pounce(dir) => self.execute_pounce(r, dir),
            Action::Haste(target) => {
                target.attach(
                    r,
                    Condition::new(ConditionKind::Haste, Turns(10)),
                );
                self.speed(r)
            }
            Action::HasteAll => self.execute_haste_all(r),
            Action::Heal(target, amount) => {
                target.heal(r, amount);
                self.speed(r)
            }
            Action::BombTick => {
                self.with_mut(r, |conds: &mut Conditions| {
                    if let Some(Condition {
                        kind: ConditionKind::TimeBomb { timer },
                        ..
                    }) = conds.0.get_mut(&ConditionKey::TimeBomb)
                    {
                        *timer -= 1;
                    }
                });
                self.speed(r)
            }
            Action::Detonate => self.execute_detonate(r),
            Action::Ascend => self.execute_ascend(r),
        }
    }

    fn execute_move(&self, r: &mut Runtime, dir: IVec2) -> i64 {
        let Some(loc) = self.loc(r) else { return 0 };
        if !dir.is_adjacent() {
            return 0;
        }
        let dest = loc + dir;

        if !self.can_enter(r, dest) || !r.move_legal(loc, dir) {
            if self.is_player(r) {
                r.say("There's no room that way.");
            }
            return 0;
        }

        self.place(r, dest);
        self.speed(r)
    }

    fn execute_attack(
        &self,
        r: &mut Runtime,
        target: Entity,
        damage_mult: i32,
        rider: Option<Ability>,
    ) -> i64 {
        let (Some(loc), Some(target_loc)) = (self.loc(r), target.loc(r))
        else {
            return 0;
        };
        if !(target_loc - loc).is_adjacent() {
            return 0;
        }

        let damage =
            attack_damage(&self.stats(r), &target.stats(r)) * damage_mult;
        r.say_at(
            target_loc,
            format!(
                "{} hit{} {} for {}.",
                self.subject(r),
                self.verb_s(r),
                target.object(r),
                damage
            ),
        );

        match rider {
            Some(Ability::Knock) => {
                // Shove the target one cell away if there's room.
                let back = target_loc + loc.dir_towards(&target_loc);
                if target.can_enter(r, back) {
                    target.place(r, back);
                }
            }
            Some(Ability::Stick) => {
                target.attach(
                    r,
                    Condition::new(ConditionKind::Stuck, Turns(3)),
                );
            }
            _ => {}
        }

        target.take_damage(r, damage, Some(*self));
        self.speed(r)
    }

    fn execute_special_melee(
        &self,
        r: &mut Runtime,
        target: Entity,
        code: &str,
    ) -> i64 {
        match Ability::from_str(code) {
            Ok(Ability::Critical) => {
                self.execute_attack(r, target, 2, None)
            }
            Ok(ability) if ability.is_melee() => {
                self.execute_attack(r, target, 1, Some(ability))
            }
            Ok(_) | Err(_) => {
                // Malformed content, complain and degrade to a plain hit.
                log::error!("unknown special melee code {code:?}");
                self.execute_attack(r, target, 1, None)
            }
        }
    }

    fn execute_throw(&self, r: &mut Runtime, cell: IVec2) -> i64 {
        let Some(loc) = self.loc(r) else { return 0 };
        if !r.terrain.get(cell).is_passable()
            || r.placement.entity_at(cell).is_some()
            || (cell - loc).cheb_len() > FOV_RADIUS
        {
            return 0;
        }

        let stats = self.stats(r);
        let grenade = Entity(r.ecs.spawn((
            Name("grenade".into()),
            Icon('*'),
            Speed(NORMAL_SPEED),
            Fuse {
                attack: stats.attack,
                level: stats.level,
            },
        )));
        grenade.place(r, cell);
        grenade.attach(
            r,
            Condition::new(ConditionKind::TimeBomb { timer: 3 }, Indefinite),
        );
        let due = r.now() + NORMAL_SPEED;
        r.queue.put(Schedulable::Fuse(grenade), due);

        r.say_at(
            cell,
            format!("{} lob{} a grenade.", self.subject(r), self.verb_s(r)),
        );
        self.speed(r)
    }

    fn execute_arrow(&self, r: &mut Runtime, dir: IVec2) -> i64 {
        let Some(loc) = self.loc(r) else { return 0 };
        if !dir.is_adjacent() {
            return 0;
        }

        let Some(target) = r.scan_target(loc, dir, FOV_RADIUS) else {
            if self.is_player(r) {
                r.say("The arrow hits nothing.");
            }
            return 0;
        };
        let target_loc = target.loc(r);
        let damage = attack_damage(&self.stats(r), &target.stats(r));
        if let Some(pos) = target_loc {
            r.say_at(
                pos,
                format!("An arrow hits {} for {}.", target.object(r), damage),
            );
        }
        target.take_damage(r, damage, Some(*self));
        self.speed(r)
    }

    fn execute_pounce(&self, r: &mut Runtime, dir: IVec2) -> i64 {
        let Some(loc) = self.loc(r) else { return 0 };
        let Some(target) = r.scan_target(loc, dir, FOV_RADIUS) else {
            return 0;
        };
        let Some(target_loc) = target.loc(r) else { return 0 };

        // Land on the free cell just short of the target.
        let landing = target_loc - dir;
        if landing != loc {
            if !self.can_enter(r, landing) {
                return 0;
            }
            self.place(r, landing);
        }
        self.execute_attack(r, target, 1, None)
    }

    fn execute_haste_all(&self, r: &mut Runtime) -> i64 {
        let Some(loc) = self.loc(r) else { return 0 };
        let view = r.fov_from(loc, FOV_RADIUS);
        for e in view.actors {
            e.attach(r, Condition::new(ConditionKind::Haste, Turns(10)));
        }
        self.speed(r)
    }

    fn execute_detonate(&self, r: &mut Runtime) -> i64 {
        let Some(loc) = self.loc(r) else { return 0 };
        let fuse = self.get::<Fuse>(r);
        let stats = Stats {
            level: fuse.level,
            attack: fuse.attack,
            defense: 100,
        };

        r.say_at(loc, "The grenade explodes!".to_string());
        let victims: Vec<Entity> = DIR_8
            .iter()
            .filter_map(|&d| r.placement.entity_at(loc + d))
            .collect();
        for victim in victims {
            let damage = attack_damage(&stats, &victim.stats(r)) * 2;
            victim.take_damage(r, damage, None);
        }

        let cost = self.speed(r);
        self.die(r);
        cost
    }

    fn execute_ascend(&self, r: &mut Runtime) -> i64 {
        let Some(loc) = self.loc(r) else { return 0 };
        if r.terrain.element_at(loc) != Some(Element::Upstairs) {
            if self.is_player(r) {
                r.say("There are no stairs here.");
            }
            return 0;
        }
        self.speed(r)
    }
}

impl Runtime {
    /// First live actor along a direction within range, walls block the
    /// scan.
    pub(crate) fn scan_target(
        &self,
        from: IVec2,
        dir: IVec2,
        range: i32,
    ) -> Option<Entity> {
        for i in 1..=range {
            let cell = from + dir * i;
            if let Some(e) = self.placement.entity_at(cell) {
                return Some(e);
            }
            if self.terrain.get(cell).blocks_sight() {
                return None;
            }
        }
        None
    }

    /// Extra legality rule for diagonal steps: a diagonal move is
    /// disallowed only when both of its orthogonal corner cells are
    /// impassable.
    pub(crate) fn move_legal(&self, from: IVec2, dir: IVec2) -> bool {
        if !dir.is_diagonal() {
            return true;
        }
        let corner_a = from + ivec2(dir.x, 0);
        let corner_b = from + ivec2(0, dir.y);
        self.terrain.get(corner_a).is_passable()
            || self.terrain.get(corner_b).is_passable()
    }
}
