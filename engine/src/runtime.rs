use rand::SeedableRng;
use util::GameRng;

use crate::{ecs::*, prelude::*, MonsterFactory};

/// Main data container for game engine runtime.
///
/// Positions, HP and the queue are only ever mutated by the currently
/// resolving actor through the `Entity` mutation points, the simulation
/// is strictly sequential.
pub struct Runtime {
    pub(crate) now: Instant,
    pub(crate) player: Option<Entity>,
    pub(crate) terrain: Terrain,
    pub(crate) ecs: Ecs,
    pub(crate) placement: crate::Placement,
    pub(crate) queue: TurnQueue,
    pub(crate) rng: GameRng,
    pub(crate) msg: MessageLog,
    pub(crate) player_fov: FovResult,
}

impl AsRef<Runtime> for Runtime {
    fn as_ref(&self) -> &Runtime {
        self
    }
}

impl AsMut<Runtime> for Runtime {
    fn as_mut(&mut self) -> &mut Runtime {
        self
    }
}

/// One player command from the input collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Step in a direction, or attack whoever stands there.
    Bump(IVec2),
    Wait,
    /// Use the hand ability at the index, aimed in an optional direction.
    UseAbility(usize, Option<IVec2>),
    /// Keep resting until HP is full or an enemy shows up.
    Rest,
    /// Keep running in a direction until blocked or an enemy shows up.
    Run(IVec2),
    /// Climb the upstairs under the player.
    Ascend,
    SaveAndQuit,
    Quit,
}

/// Input collaborator, the player's stand-in for the AI driver.
pub trait PlayerInput {
    /// Blocking call that yields the player's next command.
    fn next_command(&mut self, r: &Runtime) -> Command;
}

/// How a resolved step left the simulation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TurnOutcome {
    Continue,
    /// The player climbed the stairs out of the level.
    ChangeLevel,
    SaveAndExit,
    /// Unsaved exit.
    Quit,
    PlayerDied,
}

impl Runtime {
    pub(crate) fn bare(rng: GameRng, terrain: Terrain) -> Runtime {
        Runtime {
            now: Instant::default(),
            player: None,
            terrain,
            ecs: Default::default(),
            placement: Default::default(),
            queue: Default::default(),
            rng,
            msg: Default::default(),
            player_fov: Default::default(),
        }
    }

    /// Build a runtime from a text map using the built-in bestiary.
    pub fn new(seed: u64, map: &str) -> Result<Runtime> {
        Self::with_factory(seed, map, &MonsterFactory::bestiary())
    }

    pub fn with_factory(
        seed: u64,
        map: &str,
        factory: &MonsterFactory,
    ) -> Result<Runtime> {
        let (terrain, spawns) = Terrain::from_text(map);
        let mut r = Runtime::bare(GameRng::seed_from_u64(seed), terrain);
        // Start time from an above-zero value so that zero time values
        // can work as "unspecified time".
        r.now = Instant(3600);
        r.queue.anchor(r.now);
        let due = r.now + TURN_TICKS;
        r.queue.put(Schedulable::LevelTick, due);

        for (pos, glyph) in spawns {
            if glyph == '@' {
                r.spawn_player(pos)?;
            } else if let Some(spec) = factory.by_glyph(glyph) {
                spec.spawn(&mut r, pos)?;
            } else {
                return err(format!("no template for map glyph {glyph:?}"));
            }
        }

        if r.player.is_none() {
            return err("map does not specify player entry point");
        }
        r.update_player_fov();
        log::debug!("spawned level with {} actors", r.placement.len());
        Ok(r)
    }

    pub fn spawn_player(&mut self, pos: IVec2) -> Result<Entity> {
        if self.player.is_some() {
            return err("player entry point given twice");
        }

        let hp = crate::expected_hp(1);
        let e = Entity(self.ecs.spawn((
            Name("player".into()),
            Template("player".into()),
            Icon('@'),
            Speed(PLAYER_SPEED),
            Hp {
                current: hp,
                max: hp,
            },
            Stats {
                level: 1,
                attack: 30,
                defense: 50,
            },
            IsMob(true),
        )));
        e.place(self, pos);
        self.player = Some(e);
        let due = self.now + PLAYER_SPEED;
        self.queue.put(Schedulable::Actor(e), due);
        Ok(e)
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    pub fn live_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.placement.all_entities()
    }

    /// Composite display glyph of a cell: actor over map furniture over
    /// terrain.
    pub fn glyph_at(&self, pos: IVec2) -> char {
        if let Some(e) = self.placement.entity_at(pos) {
            return e.icon(self);
        }
        if let Some(element) = self.terrain.element_at(pos) {
            return element.glyph();
        }
        self.terrain.get(pos).glyph()
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Cells the player has seen at some point, for dimmed map display.
    pub fn player_memory(&self) -> HashSet<IVec2> {
        match self.player {
            Some(p) => p.get::<Memory>(self).0,
            None => Default::default(),
        }
    }

    /// Resolve the next scheduled actor's turn.
    ///
    /// Advances the clock to the actor's due tick, lets it act until it
    /// produces a turn-consuming action and re-enqueues it. An actor that
    /// keeps producing free actions is a broken invariant, not a hang:
    /// the step errors out after `MAX_FREE_ACTIONS` retries.
    pub fn next_turn(
        &mut self,
        input: &mut dyn PlayerInput,
    ) -> Result<TurnOutcome> {
        let item = loop {
            let Some(interval) = self.queue.peek_interval() else {
                return err("turn queue is empty");
            };
            self.now += interval;
            let Some(item) = self.queue.pop() else {
                return err("turn queue is empty");
            };
            if item.exists(self) {
                break item;
            }
            // Stale entry for something that died, skip it.
        };

        let (mut cost, mut outcome) = self.resolve(item, input)?;
        let mut retries = 0;
        while outcome == TurnOutcome::Continue
            && cost == 0
            && item.exists(self)
        {
            retries += 1;
            if retries > MAX_FREE_ACTIONS {
                return err(format!(
                    "{item:?} livelocked on free actions"
                ));
            }
            (cost, outcome) = self.resolve(item, input)?;
        }

        if outcome == TurnOutcome::Continue {
            if item.exists(self) {
                debug_assert!(cost > 0);
                self.queue.put(item, self.now + cost);
            }
            if self.player.map_or(true, |p| !p.is_alive(self)) {
                outcome = TurnOutcome::PlayerDied;
            }
        }
        Ok(outcome)
    }

    fn resolve(
        &mut self,
        item: Schedulable,
        input: &mut dyn PlayerInput,
    ) -> Result<(i64, TurnOutcome)> {
        match item {
            Schedulable::Actor(e) if Some(e) == self.player => {
                self.player_turn(e, input)
            }
            Schedulable::Actor(e) => {
                Ok((self.monster_turn(e), TurnOutcome::Continue))
            }
            Schedulable::LevelTick => {
                Ok((self.level_tick(), TurnOutcome::Continue))
            }
            Schedulable::Fuse(e) => {
                Ok((self.fuse_turn(e), TurnOutcome::Continue))
            }
        }
    }

    fn player_turn(
        &mut self,
        e: Entity,
        input: &mut dyn PlayerInput,
    ) -> Result<(i64, TurnOutcome)> {
        // The one consistent rule: an actor's FOV is recomputed right
        // before it decides, never cached from earlier turns.
        self.update_player_fov();

        if let Some(forced) = e.forced_action(self) {
            let cost = e.execute(self, forced);
            if cost > 0 {
                e.advance_conditions(self);
            }
            return Ok((cost, TurnOutcome::Continue));
        }

        let Some(loc) = e.loc(self) else {
            return Ok((0, TurnOutcome::PlayerDied));
        };

        let action = match input.next_command(self) {
            Command::Bump(dir) => {
                match self.placement.entity_at(loc + dir) {
                    Some(target) => Action::Attack(target),
                    None => Action::Move(dir),
                }
            }
            Command::Wait => Action::Wait,
            Command::UseAbility(index, dir) => {
                return Ok((
                    self.player_use_ability(e, index, dir),
                    TurnOutcome::Continue,
                ));
            }
            Command::Rest => {
                let hp = e.hp(self);
                if hp.current >= hp.max {
                    self.say("You are already rested.");
                } else {
                    e.attach(
                        self,
                        Condition::new(
                            ConditionKind::Resting,
                            Lifetime::Indefinite,
                        ),
                    );
                }
                return Ok((0, TurnOutcome::Continue));
            }
            Command::Run(dir) => {
                if e.can_enter(self, loc + dir) {
                    e.attach(
                        self,
                        Condition::new(
                            ConditionKind::Running { dir },
                            Lifetime::Indefinite,
                        ),
                    );
                } else {
                    self.say("You can't run that way.");
                }
                return Ok((0, TurnOutcome::Continue));
            }
            Command::Ascend => Action::Ascend,
            Command::SaveAndQuit => {
                if self.terrain.element_at(loc) == Some(Element::Upstairs) {
                    return Ok((0, TurnOutcome::SaveAndExit));
                }
                self.say("You can only save on the stairs.");
                return Ok((0, TurnOutcome::Continue));
            }
            Command::Quit => return Ok((0, TurnOutcome::Quit)),
        };

        let was_ascend = action == Action::Ascend;
        let action = e.filter_action(self, action);
        let cost = e.execute(self, action);
        if cost > 0 {
            e.advance_conditions(self);
            if was_ascend {
                return Ok((cost, TurnOutcome::ChangeLevel));
            }
        }
        Ok((cost, TurnOutcome::Continue))
    }

    /// Resolve a use-ability command. The ability is only consumed from
    /// the hand when the action actually takes a turn; botched aiming
    /// keeps the card and costs nothing.
    fn player_use_ability(
        &mut self,
        e: Entity,
        index: usize,
        dir: Option<IVec2>,
    ) -> i64 {
        let mut hand = e.get::<Hand>(self);
        let Some(&ability) = hand.0.get(index) else {
            self.say("You don't have that ability.");
            return 0;
        };
        if ability.is_directional() && dir.is_none() {
            self.say("That needs a direction.");
            return 0;
        }
        let Some(action) = ability.action(self, e, dir) else {
            self.say("You can't use that there.");
            return 0;
        };
        let action = e.filter_action(self, action);
        let cost = e.execute(self, action);
        if cost > 0 {
            hand.0.remove(index);
            e.set(self, hand);
            e.advance_conditions(self);
        }
        cost
    }

    fn monster_turn(&mut self, e: Entity) -> i64 {
        let Some(loc) = e.loc(self) else { return 0 };
        let view = self.fov_from(loc, FOV_RADIUS);

        let action = match e.forced_action(self) {
            Some(action) => action,
            None => e.decide(self, &view),
        };
        let action = e.filter_action(self, action);
        let cost = e.execute(self, action.clone());
        if cost > 0 {
            e.advance_conditions(self);
        } else {
            // The AI driver is supposed to only pick valid actions.
            log::warn!("monster action {action:?} was rejected");
        }
        cost
    }

    /// Once-per-turn level upkeep: the player draws a new ability.
    fn level_tick(&mut self) -> i64 {
        if let Some(player) = self.player {
            if player.is_alive(self) {
                let mut hand = player.get::<Hand>(self);
                let mut deck = player.get::<Deck>(self);
                if hand.0.len() < HAND_SIZE {
                    if let Some(ability) = deck.0.pop() {
                        hand.0.push(ability);
                        player.set(self, hand);
                        player.set(self, deck);
                        self.say("You draw a new ability.");
                    }
                }
            }
        }
        TURN_TICKS
    }

    fn fuse_turn(&mut self, e: Entity) -> i64 {
        match e.forced_action(self) {
            Some(action) => e.execute(self, action),
            // An inert charge with no timer left over, burn it off.
            None => {
                e.die(self);
                NORMAL_SPEED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Canned input that falls back to waiting when the script runs out.
    #[derive(Default)]
    struct Script {
        commands: VecDeque<Command>,
        polls: usize,
    }

    impl Script {
        fn new(commands: impl IntoIterator<Item = Command>) -> Self {
            Script {
                commands: commands.into_iter().collect(),
                polls: 0,
            }
        }
    }

    impl PlayerInput for Script {
        fn next_command(&mut self, _r: &Runtime) -> Command {
            self.polls += 1;
            self.commands.pop_front().unwrap_or(Command::Wait)
        }
    }

    #[test]
    fn fast_actors_act_more_often() {
        // The spider is sealed away from the player so it just idles.
        let mut r =
            Runtime::new(1, "xxxxxxxx\nx@x...sx\nxxxxxxxx").unwrap();
        let start = r.now();
        let mut input = Script::default();

        // Five spider turns and the level upkeep tick resolve before the
        // slow player is even asked for input.
        for _ in 0..6 {
            assert_eq!(
                r.next_turn(&mut input).unwrap(),
                TurnOutcome::Continue
            );
        }
        assert_eq!(input.polls, 0);

        assert_eq!(r.next_turn(&mut input).unwrap(), TurnOutcome::Continue);
        assert_eq!(input.polls, 1);
        assert_eq!(r.now() - start, TURN_TICKS);
    }

    #[test]
    fn upkeep_draws_into_hand() {
        let mut r = Runtime::new(1, "xxx\nx@x\nxxx").unwrap();
        let player = r.player().unwrap();
        player.set(&mut r, Deck(vec![Ability::Haste]));

        // The upkeep tick sits at the head of the queue.
        let mut input = Script::default();
        r.next_turn(&mut input).unwrap();

        assert_eq!(player.get::<Hand>(&r).0, vec![Ability::Haste]);
        assert!(player.get::<Deck>(&r).0.is_empty());
        assert!(r.messages().history().any(|m| m.contains("draw")));
    }

    #[test]
    fn kills_teach_and_level_up() {
        let mut r = Runtime::new(1, "xxxx\nx@sx\nxxxx").unwrap();
        let player = r.player().unwrap();
        let spider = r
            .live_entities()
            .find(|e| !e.is_player(&r))
            .unwrap();
        // Enough HP to shrug off the spider while grinding it down.
        player.set(
            &mut r,
            Hp {
                current: 500,
                max: 500,
            },
        );

        let mut input = Script::new(vec![Command::Bump(ivec2(1, 0)); 12]);
        for _ in 0..100 {
            if !spider.is_alive(&r) {
                break;
            }
            r.next_turn(&mut input).unwrap();
        }

        assert!(!spider.is_alive(&r));
        assert!(r.queue.due(&Schedulable::Actor(spider)).is_none());
        // A peer-level kill grants a level and teaches the victim's
        // special ability.
        assert_eq!(player.stats(&r).level, 2);
        assert!(player.get::<Deck>(&r).0.contains(&Ability::Stick));
    }

    #[test]
    fn grenade_burns_down_in_queue_time() {
        let mut r = Runtime::new(1, "xxxxxxx\nx@....x\nxxxxxxx").unwrap();
        let player = r.player().unwrap();
        player.set(&mut r, Hand(vec![Ability::Grenade]));

        let mut input =
            Script::new([Command::UseAbility(0, Some(ivec2(1, 0)))]);
        // Upkeep tick, then the throw.
        r.next_turn(&mut input).unwrap();
        r.next_turn(&mut input).unwrap();

        let cell = ivec2(5, 1);
        let grenade = r.placement.entity_at(cell).unwrap();
        assert_eq!(r.glyph_at(cell), '*');
        assert!(player.hand(&r).is_empty());

        // The fuse runs at monster speed: three ticks, then the blast.
        for _ in 0..4 {
            assert!(grenade.is_alive(&r));
            r.next_turn(&mut input).unwrap();
        }
        assert!(!grenade.is_alive(&r));
        assert_eq!(r.glyph_at(cell), '.');
        assert!(r.messages().history().any(|m| m.contains("explodes")));
    }

    #[test]
    fn ability_misuse_is_free() {
        let mut r = Runtime::new(1, "xxxx\nx@.x\nxxxx").unwrap();
        let player = r.player().unwrap();
        player.set(&mut r, Hand(vec![Ability::Arrow]));

        let mut input = Script::new([
            // No direction given.
            Command::UseAbility(0, None),
            // No such hand slot.
            Command::UseAbility(3, Some(ivec2(1, 0))),
            Command::Wait,
        ]);
        r.next_turn(&mut input).unwrap(); // upkeep
        r.next_turn(&mut input).unwrap();

        // Both misuses were free and re-polled, the wait ended the turn.
        assert_eq!(input.polls, 3);
        assert_eq!(player.hand(&r), vec![Ability::Arrow]);
    }

    #[test]
    fn stairs_and_exits() {
        let mut r = Runtime::new(1, "xxxxx\nx@.<x\nxxxxx").unwrap();

        // Saving away from the stairs is refused without costing a turn.
        let mut input = Script::new([
            Command::SaveAndQuit,
            Command::Bump(ivec2(1, 0)),
            Command::Bump(ivec2(1, 0)),
            Command::SaveAndQuit,
        ]);
        let outcome = loop {
            match r.next_turn(&mut input).unwrap() {
                TurnOutcome::Continue => continue,
                other => break other,
            }
        };
        assert_eq!(outcome, TurnOutcome::SaveAndExit);
        assert!(r
            .messages()
            .history()
            .any(|m| m.contains("only save on the stairs")));

        // Same spot, climbing out instead.
        let mut r = Runtime::new(1, "xxxxx\nx@.<x\nxxxxx").unwrap();
        let mut input = Script::new([
            Command::Bump(ivec2(1, 0)),
            Command::Bump(ivec2(1, 0)),
            Command::Ascend,
        ]);
        let outcome = loop {
            match r.next_turn(&mut input).unwrap() {
                TurnOutcome::Continue => continue,
                other => break other,
            }
        };
        assert_eq!(outcome, TurnOutcome::ChangeLevel);

        let mut r = Runtime::new(1, "xxx\nx@x\nxxx").unwrap();
        let mut input = Script::new([Command::Quit]);
        let outcome = loop {
            match r.next_turn(&mut input).unwrap() {
                TurnOutcome::Continue => continue,
                other => break other,
            }
        };
        assert_eq!(outcome, TurnOutcome::Quit);
    }

    #[test]
    fn player_death_ends_the_game() {
        let mut r = Runtime::new(1, "xxxx\nx@sx\nxxxx").unwrap();
        let mut input = Script::default();

        let mut died = false;
        for _ in 0..200 {
            if r.next_turn(&mut input).unwrap() == TurnOutcome::PlayerDied {
                died = true;
                break;
            }
        }
        assert!(died);
        let player = r.player().unwrap();
        assert!(!player.is_alive(&r));
        // The dead player stays inspectable after the game over.
        assert_eq!(player.stats(&r).level, 1);
    }

    #[test]
    fn rest_and_run_are_interruptible_repeats() {
        let mut r = Runtime::new(1, "xxxxxxx\nx@....x\nxxxxxxx").unwrap();
        let player = r.player().unwrap();
        player.set(
            &mut r,
            Hp {
                current: 10,
                max: 18,
            },
        );

        let mut input = Script::new([Command::Rest]);
        // One command keeps the player healing turn after turn; the rest
        // only ends, and input is polled again, once HP is full.
        for _ in 0..40 {
            r.next_turn(&mut input).unwrap();
            if input.polls == 2 {
                break;
            }
        }
        assert_eq!(player.hp(&r).current, 18);
        assert_eq!(input.polls, 2);
        assert!(!player.has_condition(&r, ConditionKey::Resting));

        // Running dashes to the far wall on a single command; the second
        // poll only comes once the dash has ended at the wall.
        let mut input = Script::new([Command::Run(ivec2(1, 0))]);
        for _ in 0..30 {
            r.next_turn(&mut input).unwrap();
            if input.polls == 2 {
                break;
            }
        }
        assert_eq!(player.loc(&r), Some(ivec2(5, 1)));
        assert_eq!(input.polls, 2);
        assert!(!player.has_condition(&r, ConditionKey::Running));
    }

    #[test]
    fn snapshot_restores_an_identical_game() {
        let mut r = Runtime::new(
            3,
            "\
xxxxxxxxx
x@......x
x...l..<x
x......sx
xxxxxxxxx",
        )
        .unwrap();
        // Bulk up the player so the monsters can't end the test early.
        let hardy = r.player().unwrap();
        hardy.set(
            &mut r,
            Hp {
                current: 500,
                max: 500,
            },
        );
        let mut input = Script::default();
        for _ in 0..20 {
            r.next_turn(&mut input).unwrap();
        }

        let snapshot = r.snapshot();
        let mut restored = Runtime::restore(&snapshot).unwrap();

        assert_eq!(restored.now() - r.now(), 0);
        for y in 0..r.terrain().height() {
            for x in 0..r.terrain().width() {
                let pos = ivec2(x, y);
                assert_eq!(r.glyph_at(pos), restored.glyph_at(pos));
            }
        }
        let (p1, p2) =
            (r.player().unwrap(), restored.player().unwrap());
        assert_eq!(p1.hp(&r), p2.hp(&restored));

        // The clone carries the RNG and the queue, so both games keep
        // playing out the same way.
        let mut input2 = Script::default();
        for _ in 0..30 {
            r.next_turn(&mut input).unwrap();
            restored.next_turn(&mut input2).unwrap();
        }
        for y in 0..r.terrain().height() {
            for x in 0..r.terrain().width() {
                let pos = ivec2(x, y);
                assert_eq!(r.glyph_at(pos), restored.glyph_at(pos));
            }
        }
        assert_eq!(p1.hp(&r), p2.hp(&restored));
    }

    #[test]
    fn restore_preserves_queue_tie_order() {
        // Mixed speeds: after one lancer turn the lancer and the
        // half-speed statue are both due on the same tick, with the
        // statue ahead in line.
        let mut r =
            Runtime::new(1, "xxxxxxxx\nx@x.l.Qx\nxxxxxxxx").unwrap();
        let mut input = Script::default();
        r.next_turn(&mut input).unwrap();

        let mut restored = Runtime::restore(&r.snapshot()).unwrap();

        fn pop_order(r: &mut Runtime) -> Vec<String> {
            let mut order = Vec::new();
            while let Some(item) = r.queue.pop() {
                if let Schedulable::Actor(e) = item {
                    order.push(e.name(r));
                }
            }
            order
        }
        assert_eq!(pop_order(&mut r), pop_order(&mut restored));
    }
}
