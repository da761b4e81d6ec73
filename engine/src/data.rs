//! Actor templates and save-state snapshots.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use util::GameRng;

use crate::{ecs::*, prelude::*};

/// Data template an actor is stamped out from.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterSpec {
    pub name: String,
    pub icon: char,
    /// Ticks per action, 0 means the standard monster speed.
    pub speed: i64,
    pub level: i32,
    /// 0 means the expected HP for the level.
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    /// Special ability code, empty for none.
    pub special_code: String,
    /// Percent chance per decision to use the special ability.
    pub special_frequency: f64,
    /// Fall back to plain melee when adjacent to the target.
    pub prefers_melee: bool,
}

impl MonsterSpec {
    /// Spawn an actor from this template onto a free cell.
    pub fn spawn(&self, r: &mut Runtime, pos: IVec2) -> Result<Entity> {
        if !r.terrain.get(pos).is_passable() {
            return err(format!("spawn {}: cell {pos} is a wall", self.name));
        }
        if r.placement.entity_at(pos).is_some() {
            return err(format!("spawn {}: cell {pos} is occupied", self.name));
        }

        let speed = if self.speed > 0 {
            self.speed
        } else {
            NORMAL_SPEED
        };
        let max_hp = if self.max_hp > 0 {
            self.max_hp
        } else {
            crate::expected_hp(self.level)
        };

        let e = Entity(r.ecs.spawn((
            Name(self.name.clone()),
            Template(self.name.clone()),
            Icon(self.icon),
            Speed(speed),
            Hp {
                current: max_hp,
                max: max_hp,
            },
            Stats {
                level: self.level,
                attack: self.attack,
                defense: self.defense,
            },
            IsMob(true),
        )));

        if !self.special_code.is_empty() {
            let ability =
                Ability::from_str(&self.special_code).map_err(|_| {
                    anyhow::anyhow!(
                        "spawn {}: unknown special code {:?}",
                        self.name,
                        self.special_code
                    )
                })?;
            e.set(
                r,
                SpecialAttack {
                    ability,
                    frequency: self.special_frequency,
                    prefers_melee: self.prefers_melee,
                },
            );
        }

        e.place(r, pos);
        let due = r.now() + speed;
        r.queue.put(Schedulable::Actor(e), due);
        Ok(e)
    }
}

/// Lookup of monster templates by name and map glyph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MonsterFactory {
    specs: Vec<MonsterSpec>,
}

impl MonsterFactory {
    pub fn register(&mut self, spec: MonsterSpec) {
        self.specs.push(spec);
    }

    pub fn get(&self, name: &str) -> Option<&MonsterSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn by_glyph(&self, icon: char) -> Option<&MonsterSpec> {
        self.specs.iter().find(|s| s.icon == icon)
    }

    /// The built-in bestiary.
    pub fn bestiary() -> Self {
        fn spec(
            name: &str,
            icon: char,
            level: i32,
            special_code: &str,
            special_frequency: f64,
            prefers_melee: bool,
        ) -> MonsterSpec {
            MonsterSpec {
                name: name.into(),
                icon,
                level,
                attack: 30,
                defense: 50,
                special_code: special_code.into(),
                special_frequency,
                prefers_melee,
                ..Default::default()
            }
        }

        let mut ret = MonsterFactory::default();
        ret.register(spec("lancer", 'l', 2, "CRITICAL", 30.0, true));
        ret.register(spec("boxer", 'b', 2, "KNOCK", 40.0, true));
        ret.register(spec("grenadier", 'g', 3, "GRENTHROW", 30.0, true));
        ret.register(spec("archer", 'a', 2, "ARROW", 40.0, true));
        ret.register(spec("spider", 's', 1, "STICK", 50.0, true));
        ret.register(spec("tiger", 't', 4, "POUNCE", 40.0, true));
        let mut statue = spec("quickening statue", 'Q', 3, "HASTEALL", 20.0, false);
        statue.speed = 2 * NORMAL_SPEED;
        ret.register(statue);
        ret
    }
}

/// Complete engine state in plain data, the file format is the caller's
/// business.
#[derive(Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub now: Instant,
    pub rng: GameRng,
    pub level_tick_due: Instant,
    /// The upkeep tick's place in the scheduler order at save time.
    pub level_tick_rank: usize,
    pub terrain: Terrain,
    pub messages: MessageLog,
    pub actors: Vec<ActorSnapshot>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub template: String,
    pub name: String,
    pub icon: char,
    pub is_player: bool,
    pub pos: IVec2,
    pub due: Instant,
    /// The actor's place in the scheduler order at save time, breaks
    /// same-tick ties on restore.
    pub queue_rank: usize,
    pub speed: i64,
    pub hp: Hp,
    pub stats: Stats,
    pub conditions: Vec<Condition>,
    pub behavior: Behavior,
    pub special: Option<SpecialAttack>,
    pub fuse: Option<Fuse>,
    pub memory: Vec<IVec2>,
    pub hand: Vec<Ability>,
    pub deck: Vec<Ability>,
}

impl Runtime {
    /// Capture the live state for persistence.
    pub fn snapshot(&self) -> Snapshot {
        let ranks: HashMap<Schedulable, usize> = self
            .queue
            .iter()
            .enumerate()
            .map(|(i, (_, item))| (*item, i))
            .collect();

        let mut actors = Vec::new();
        for e in self.placement.all_entities() {
            let fuse = self.ecs.get::<&Fuse>(*e).ok().map(|f| *f);
            let item = if fuse.is_some() {
                Schedulable::Fuse(e)
            } else {
                Schedulable::Actor(e)
            };

            let mut memory: Vec<IVec2> =
                e.get::<Memory>(self).0.into_iter().collect();
            memory.sort_by_key(|v| (v.y, v.x));

            actors.push(ActorSnapshot {
                template: e.get::<Template>(self).0,
                name: e.get::<Name>(self).0,
                icon: e.get::<Icon>(self).0,
                is_player: e.is_player(self),
                pos: e.loc(self).unwrap_or_default(),
                due: self.queue.due(&item).unwrap_or(self.now()),
                queue_rank: ranks.get(&item).copied().unwrap_or(0),
                speed: e.speed(self),
                hp: e.hp(self),
                stats: e.stats(self),
                conditions: e
                    .get::<Conditions>(self)
                    .0
                    .into_values()
                    .collect(),
                behavior: e.behavior(self),
                special: e.special(self),
                fuse,
                memory,
                hand: e.get::<Hand>(self).0,
                deck: e.get::<Deck>(self).0,
            });
        }

        Snapshot {
            now: self.now(),
            rng: self.rng.clone(),
            level_tick_due: self
                .queue
                .due(&Schedulable::LevelTick)
                .unwrap_or(self.now() + TURN_TICKS),
            level_tick_rank: ranks
                .get(&Schedulable::LevelTick)
                .copied()
                .unwrap_or(0),
            terrain: self.terrain.clone(),
            messages: self.msg.clone(),
            actors,
        }
    }

    /// Rebuild a runtime from a snapshot.
    ///
    /// Conditions are installed directly without re-running their attach
    /// hooks, the snapshotted speeds already reflect them.
    pub fn restore(snapshot: &Snapshot) -> Result<Runtime> {
        let mut r = Runtime::bare(snapshot.rng.clone(), snapshot.terrain.clone());
        r.now = snapshot.now;
        r.queue.anchor(r.now);
        r.msg = snapshot.messages.clone();
        let mut pending = vec![(
            snapshot.level_tick_due,
            snapshot.level_tick_rank,
            Schedulable::LevelTick,
        )];

        for a in &snapshot.actors {
            let e = Entity(r.ecs.spawn((
                Name(a.name.clone()),
                Template(a.template.clone()),
                Icon(a.icon),
                Speed(a.speed),
                a.hp,
                a.stats,
            )));
            if a.fuse.is_none() {
                e.set(&mut r, IsMob(true));
            }
            if let Some(fuse) = a.fuse {
                e.set(&mut r, fuse);
            }
            if let Some(special) = a.special.clone() {
                e.set(&mut r, special);
            }
            e.set(&mut r, a.behavior.clone());
            if !a.conditions.is_empty() {
                e.set(
                    &mut r,
                    Conditions(
                        a.conditions
                            .iter()
                            .map(|c| (c.key(), c.clone()))
                            .collect(),
                    ),
                );
            }
            if !a.memory.is_empty() {
                e.set(&mut r, Memory(a.memory.iter().copied().collect()));
            }
            if !a.hand.is_empty() {
                e.set(&mut r, Hand(a.hand.clone()));
            }
            if !a.deck.is_empty() {
                e.set(&mut r, Deck(a.deck.clone()));
            }

            e.place(&mut r, a.pos);
            let item = if a.fuse.is_some() {
                Schedulable::Fuse(e)
            } else {
                Schedulable::Actor(e)
            };
            pending.push((a.due, a.queue_rank, item));

            if a.is_player {
                r.player = Some(e);
            }
        }

        // Re-put in the saved pop order so same-tick ties play out
        // exactly as they would have in the original game.
        pending.sort_by_key(|&(due, rank, _)| (due, rank));
        for (due, _, item) in pending {
            r.queue.put(item, due);
        }

        if r.player.is_none() {
            return err("snapshot has no player");
        }
        r.update_player_fov();
        Ok(r)
    }
}
