//! Combat and other mob-specific logic.

use rand::Rng;
use util::RngExt;

use crate::{ecs::*, prelude::*};

/// Hit points a healthy actor of the given level is expected to have.
pub fn expected_hp(level: i32) -> i32 {
    6 * (level + 2)
}

/// Damage of a landed attack.
///
/// Scaled off the attacker's expected HP so that combat between
/// equal-level actors lasts a predictable number of hits, with an
/// exponential bonus for outleveling the defender. Attack and defense are
/// percentage multipliers.
pub(crate) fn attack_damage(attacker: &Stats, defender: &Stats) -> i32 {
    let base = expected_hp(attacker.level) as f64;
    let multipliers =
        (attacker.attack as f64 / 100.0) * (defender.defense as f64 / 100.0);
    let level_scale =
        2f64.powf((attacker.level - defender.level) as f64 / 11.0);
    (base * multipliers * level_scale).round().max(1.0) as i32
}

impl Entity {
    /// Apply damage, killing the actor if HP runs out.
    pub(crate) fn take_damage(
        &self,
        r: &mut Runtime,
        amount: i32,
        killer: Option<Entity>,
    ) {
        let mut hp = self.hp(r);
        hp.current -= amount;
        self.set(r, hp);

        if hp.current <= 0 {
            if let Some(killer) = killer {
                killer.claim_kill(r, *self);
            }
            self.die(r);
        }
    }

    pub(crate) fn heal(&self, r: &mut Runtime, amount: i32) {
        let mut hp = self.hp(r);
        hp.current = (hp.current + amount).min(hp.max);
        self.set(r, hp);
    }

    /// Remove a dead actor from the world.
    ///
    /// Detaches from the spatial index and the turn queue synchronously so
    /// the actor can never act or block a cell again, even if it died in
    /// the middle of another actor's resolution.
    pub(crate) fn die(&self, r: &mut Runtime) {
        if let Some(pos) = self.loc(r) {
            r.say_at(
                pos,
                format!("{} die{}.", self.subject(r), self.verb_s(r)),
            );
        }
        r.placement.remove(self);
        r.queue.remove(&Schedulable::Actor(*self));
        r.queue.remove(&Schedulable::Fuse(*self));
        if !self.is_player(r) {
            // The player entity is kept in the ECS so the caller can still
            // inspect the final state after a game over.
            let _ = r.ecs.despawn(**self);
        }
    }

    /// Credit a kill: slain specialists yield their ability into the
    /// player's deck, and a strong enough victim grants a level.
    fn claim_kill(&self, r: &mut Runtime, victim: Entity) {
        if !self.is_player(r) {
            return;
        }

        if let Some(special) = victim.special(r) {
            let mut deck = self.get::<Deck>(r);
            r.rng.random_insert(&mut deck.0, special.ability);
            self.set(r, deck);
            r.say(format!("You learn {}.", special.ability.name()));
        }

        if victim.stats(r).level >= self.stats(r).level {
            self.gain_level(r);
        }
    }

    /// Advance a level, raising max HP by 3d3.
    pub(crate) fn gain_level(&self, r: &mut Runtime) {
        let mut stats = self.stats(r);
        stats.level += 1;
        self.set(r, stats);

        let gain: i32 = (0..3).map(|_| r.rng.gen_range(1..=3)).sum();
        let mut hp = self.hp(r);
        hp.max += gain;
        hp.current += gain;
        self.set(r, hp);

        if self.is_player(r) {
            r.say(format!("Welcome to level {}.", stats.level));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_scaling() {
        let a = Stats {
            level: 1,
            attack: 30,
            defense: 50,
        };
        let b = a;
        // 18 * 0.3 * 0.5 = 2.7, rounds to 3.
        assert_eq!(attack_damage(&a, &b), 3);

        // Outleveling the defender always helps.
        let strong = Stats { level: 12, ..a };
        assert!(attack_damage(&strong, &b) > attack_damage(&a, &b));
        // And never drops below 1 even against a tank.
        let tank = Stats {
            level: 30,
            attack: 30,
            defense: 1,
        };
        assert!(attack_damage(&a, &tank) >= 1);
    }
}
