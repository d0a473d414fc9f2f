//! Headless two-bot skirmish.
//!
//! Builds a seeded fixture map, runs two greedy expansion bots to
//! completion, prints the outcome, and writes the replay document next to
//! the working directory.
//!
//! ```sh
//! cargo run --example skirmish_headless -- [seed]
//! RUST_LOG=parsec_engine=debug cargo run --example skirmish_headless
//! ```

use std::path::Path;

use anyhow::Context;
use tracing::info;

use parsec_engine::fixture::fixture_map;
use parsec_engine::moves::{MoveProvider, MoveQueue, MoveResponse};
use parsec_engine::turn::TurnLoop;
use parsec_world::config::GameConstants;
use parsec_world::entity::{DockingStatus, PlayerId};
use parsec_world::map::GameMap;
use parsec_world::moves::Move;

/// Dock anything parked next to a friendly or free planet; otherwise burn
/// toward the nearest one.
struct ExpandBot;

impl MoveProvider for ExpandBot {
    fn moves_for_turn(&mut self, player: PlayerId, map: &GameMap) -> MoveResponse {
        let constants = GameConstants::default();
        let mut queue = MoveQueue::new(1);
        for (owner, index, s) in map.each_ship() {
            if owner != player || s.docking_status != DockingStatus::Undocked {
                continue;
            }
            let target = map
                .each_planet()
                .filter(|(_, p)| p.owner.is_none() || p.owner == Some(player))
                .min_by(|(_, a), (_, b)| {
                    s.location
                        .distance_to(a.location)
                        .total_cmp(&s.location.distance_to(b.location))
                });
            let Some((planet_index, planet)) = target else {
                continue;
            };
            let distance = s.location.distance_to(planet.location);
            if distance <= s.radius + planet.radius + constants.dock_radius && s.velocity.is_zero()
            {
                queue.insert(0, Move::Dock { ship: index, planet: planet_index });
            } else {
                let dx = planet.location.x - s.location.x;
                let dy = planet.location.y - s.location.y;
                let angle = dy.atan2(dx).to_degrees().round() as i32;
                let thrust = if distance > 20.0 { 7 } else { 3 };
                queue.insert(0, Move::Thrust { ship: index, thrust, angle });
            }
        }
        MoveResponse {
            elapsed_ms: Some(1),
            queue,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let seed: u64 = std::env::args()
        .nth(1)
        .map(|raw| raw.parse())
        .transpose()
        .context("seed must be an unsigned integer")?
        .unwrap_or(2001);

    let constants = GameConstants::default();
    let map = fixture_map(seed, 240.0, 160.0, 2, &constants);
    info!(
        seed,
        planets = map.each_planet().count(),
        "starting skirmish"
    );

    let mut game = TurnLoop::new(
        map,
        constants,
        vec!["expander-a".to_owned(), "expander-b".to_owned()],
        vec![Box::new(ExpandBot), Box::new(ExpandBot)],
        seed,
    )?;

    let outcome = game.run();
    match outcome.winner {
        Some(winner) => info!(winner, turns = outcome.turns, "game over"),
        None => info!(turns = outcome.turns, "game over with no sole survivor"),
    }

    let stats = game
        .transcript()
        .stats()
        .context("finished game must carry stats")?;
    for (player, ps) in stats.players.iter().enumerate() {
        info!(
            player,
            rank = ps.rank,
            last_frame_alive = ps.last_frame_alive,
            ships = ps.total_ship_count,
            damage = ps.damage_dealt,
            "final standing"
        );
    }

    let path = Path::new("skirmish_replay.json");
    game.transcript()
        .write_to_file(path)
        .context("writing replay")?;
    info!(path = %path.display(), "replay written");
    Ok(())
}
