//! End-to-end runs through the public surface only.

use engine::prelude::*;

/// Canned input that falls back to waiting when the script runs out.
struct Script(Vec<Command>);

impl PlayerInput for Script {
    fn next_command(&mut self, _r: &Runtime) -> Command {
        if self.0.is_empty() {
            Command::Wait
        } else {
            self.0.remove(0)
        }
    }
}

#[test]
fn walk_to_the_stairs_and_leave() {
    let mut r = Runtime::new(7, "xxxxxx\nx@..<x\nxxxxxx").unwrap();
    let mut input = Script(vec![
        Command::Bump(ivec2(1, 0)),
        Command::Bump(ivec2(1, 0)),
        Command::Bump(ivec2(1, 0)),
        Command::Ascend,
    ]);

    let mut outcome = TurnOutcome::Continue;
    for _ in 0..100 {
        outcome = r.next_turn(&mut input).unwrap();
        if outcome != TurnOutcome::Continue {
            break;
        }
    }

    assert_eq!(outcome, TurnOutcome::ChangeLevel);
    let player = r.player().unwrap();
    assert_eq!(player.loc(&r), Some(ivec2(4, 1)));
}

#[test]
fn an_idle_player_loses_to_a_spider() {
    let mut r = Runtime::new(7, "xxxx\nx@sx\nxxxx").unwrap();
    let mut input = Script(Vec::new());

    let mut outcome = TurnOutcome::Continue;
    for _ in 0..2000 {
        outcome = r.next_turn(&mut input).unwrap();
        if outcome != TurnOutcome::Continue {
            break;
        }
    }

    assert_eq!(outcome, TurnOutcome::PlayerDied);
    assert!(!r.player().unwrap().is_alive(&r));
    assert!(r.messages().history().any(|m| m.contains("die")));
}
