//! Full turn-pipeline benchmark.
//!
//! Measures the cost of one complete turn (retrieve → docking → micro-step →
//! production → drag → cooldowns → snapshot → termination) at several fleet
//! sizes, with in-process bots so provider latency is out of the picture.
//!
//! Run with: `cargo bench --bench turn_benchmarks`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use parsec_engine::fixture::fixture_map;
use parsec_engine::moves::{MoveProvider, MoveQueue, MoveResponse};
use parsec_engine::turn::TurnLoop;
use parsec_world::config::GameConstants;
use parsec_world::entity::{DockingStatus, PlayerId};
use parsec_world::geom::Location;
use parsec_world::map::GameMap;
use parsec_world::moves::Move;

/// Thrust on a heading derived from the ship index; enough churn to keep the
/// detector busy without scripting.
struct SpinBot;

impl MoveProvider for SpinBot {
    fn moves_for_turn(&mut self, player: PlayerId, map: &GameMap) -> MoveResponse {
        let mut queue = MoveQueue::new(1);
        for (owner, index, s) in map.each_ship() {
            if owner == player && s.docking_status == DockingStatus::Undocked {
                let angle = ((index * 53) % 360) as i32;
                queue.insert(0, Move::Thrust { ship: index, thrust: 5, angle });
            }
        }
        MoveResponse {
            elapsed_ms: Some(0),
            queue,
        }
    }
}

fn game_with_fleet(ships_per_player: usize) -> TurnLoop {
    let constants = GameConstants::default();
    let mut map = fixture_map(77, 384.0, 256.0, 2, &constants);
    // Pad the starting trio up to the requested fleet size.
    for player in 0..2 {
        for i in 0..ships_per_player.saturating_sub(3) {
            let x = 20.0 + (i as f64 * 13.0) % 344.0;
            let y = 20.0 + (player as f64 * 120.0) + (i as f64 * 7.0) % 96.0;
            map.spawn_ship(Location::new(x, y), player, &constants);
        }
    }
    TurnLoop::new(
        map,
        constants,
        vec!["a".to_owned(), "b".to_owned()],
        vec![Box::new(SpinBot), Box::new(SpinBot)],
        77,
    )
    .unwrap()
}

fn bench_process_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_turn");
    for &fleet in &[8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(fleet), &fleet, |b, &fleet| {
            let mut game = game_with_fleet(fleet);
            b.iter(|| game.process_turn());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_process_turn);
criterion_main!(benches);
