//! Determinism: same seed + same move streams = bitwise-identical output.
//!
//! These tests run complete games twice from scratch and compare BLAKE3
//! digests of every map snapshot and of the assembled replay document.

use parsec_engine::fixture::fixture_map;
use parsec_engine::moves::{MoveProvider, MoveQueue, MoveResponse};
use parsec_engine::turn::TurnLoop;
use parsec_replay::snapshot::{document_hash, state_hash};
use parsec_replay::transcript::Transcript;
use parsec_world::config::GameConstants;
use parsec_world::entity::{DockingStatus, PlayerId};
use parsec_world::map::GameMap;
use parsec_world::moves::Move;

/// A deterministic bot with some churn: dock when possible, otherwise thrust
/// on a heading derived from the ship index and turn count.
struct ChurnBot {
    turn: u64,
}

impl ChurnBot {
    fn new() -> Self {
        Self { turn: 0 }
    }
}

impl MoveProvider for ChurnBot {
    fn moves_for_turn(&mut self, player: PlayerId, map: &GameMap) -> MoveResponse {
        self.turn += 1;
        let constants = GameConstants::default();
        let mut queue = MoveQueue::new(1);
        for (owner, index, s) in map.each_ship() {
            if owner != player {
                continue;
            }
            match s.docking_status {
                DockingStatus::Undocked => {
                    let near = map.each_planet().find(|(_, p)| {
                        s.location.distance_to(p.location)
                            <= s.radius + p.radius + constants.dock_radius
                            && (p.owner.is_none() || p.owner == Some(player))
                    });
                    if let (Some((planet_index, _)), true) = (near, s.velocity.is_zero()) {
                        queue.insert(0, Move::Dock { ship: index, planet: planet_index });
                    } else {
                        let angle = ((index as u64 * 67 + self.turn * 31) % 360) as i32;
                        let thrust = ((index as u64 + self.turn) % 8) as i32;
                        queue.insert(0, Move::Thrust { ship: index, thrust, angle });
                    }
                }
                DockingStatus::Docked if self.turn % 17 == 0 => {
                    queue.insert(0, Move::Undock { ship: index });
                }
                _ => {}
            }
        }
        MoveResponse {
            elapsed_ms: Some(3),
            queue,
        }
    }
}

fn play(seed: u64, turns: u64) -> Transcript {
    let constants = GameConstants::default();
    let map = fixture_map(seed, 240.0, 160.0, 2, &constants);
    let mut game = TurnLoop::new(
        map,
        constants,
        vec!["alpha".to_owned(), "beta".to_owned()],
        vec![Box::new(ChurnBot::new()), Box::new(ChurnBot::new())],
        seed,
    )
    .unwrap();
    game.initialize();
    for _ in 0..turns {
        let living = game.process_turn();
        if living.iter().filter(|&&alive| alive).count() <= 1 {
            break;
        }
    }
    game.into_transcript()
}

#[test]
fn two_runs_produce_identical_snapshots() {
    let a = play(2024, 30);
    let b = play(2024, 30);

    assert_eq!(a.frames().len(), b.frames().len());
    for (turn, (fa, fb)) in a.frames().iter().zip(b.frames().iter()).enumerate() {
        assert_eq!(
            state_hash(fa).unwrap(),
            state_hash(fb).unwrap(),
            "snapshot diverged at frame {turn}"
        );
    }
}

#[test]
fn two_runs_produce_identical_replay_documents() {
    let a = play(7, 25);
    let b = play(7, 25);
    assert_eq!(document_hash(&a).unwrap(), document_hash(&b).unwrap());
}

#[test]
fn different_seeds_diverge() {
    let a = play(1, 10);
    let b = play(2, 10);
    assert_ne!(document_hash(&a).unwrap(), document_hash(&b).unwrap());
}

#[test]
fn event_times_land_on_the_quantization_lattice() {
    let transcript = play(99, 40);
    let precision = transcript.header().constants.event_time_precision as f64;
    for turn in 0..transcript.num_turns() {
        for event in transcript.events(turn) {
            let time = match event {
                parsec_replay::event::GameEvent::Destroyed { time, .. } => *time,
                parsec_replay::event::GameEvent::Attack { time, .. } => *time,
                parsec_replay::event::GameEvent::Spawn { .. } => continue,
            };
            let scaled = time * precision;
            assert!(
                (scaled - scaled.round()).abs() < 1e-6,
                "event time {time} is off-lattice"
            );
        }
    }
}
