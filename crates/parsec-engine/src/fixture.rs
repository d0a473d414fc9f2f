//! Seeded fixture maps for demos, benches, and integration tests.
//!
//! This is *not* the production map generator (that lives outside the
//! engine); it produces just enough of a legal starting position -- a few
//! planets with clearance between them, a starting trio of ships per player
//! -- to run a full game. Placement is driven entirely by a seeded [`Pcg64`],
//! so a seed pins the map bit-for-bit, and the seed lands in the replay
//! header.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use parsec_world::config::GameConstants;
use parsec_world::entity::Planet;
use parsec_world::geom::Location;
use parsec_world::map::GameMap;

// ---------------------------------------------------------------------------
// fixture_map
// ---------------------------------------------------------------------------

/// Build a playable starting map: 4-6 planets clustered around the center
/// with mutual clearance, and three ships per player arranged on a ring
/// outside the planet field.
pub fn fixture_map(
    seed: u64,
    width: f64,
    height: f64,
    num_players: usize,
    constants: &GameConstants,
) -> GameMap {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut map = GameMap::new(width, height, num_players);

    // Planets live in a central box so the ship ring stays clear of them.
    let center_x = width / 2.0;
    let center_y = height / 2.0;
    let box_x = width / 5.0;
    let box_y = height / 5.0;

    let planet_count = rng.gen_range(4..=6);
    let mut placed: Vec<(Location, f64)> = Vec::new();
    let mut attempts = 0;
    while placed.len() < planet_count && attempts < 1000 {
        attempts += 1;
        let radius = rng.gen_range(4.0..8.0);
        let location = Location::new(
            rng.gen_range(center_x - box_x..center_x + box_x),
            rng.gen_range(center_y - box_y..center_y + box_y),
        );
        let clear = placed
            .iter()
            .all(|&(other, other_radius)| {
                location.distance_to(other) >= radius + other_radius + 12.0
            });
        if !clear {
            continue;
        }
        placed.push((location, radius));
        let docking_spots = rng.gen_range(2..=4);
        let health = (radius * constants.max_ship_health as f64) as u64;
        let remaining_production = (radius * 100.0) as u64;
        map.add_planet(Planet::new(
            location,
            radius,
            docking_spots,
            health,
            remaining_production,
        ));
    }

    // Ships on a ring outside the planet box, one arc segment per player.
    let ring = 0.4 * width.min(height);
    for player in 0..num_players {
        let angle = std::f64::consts::TAU * player as f64 / num_players as f64;
        let base = Location::new(center_x + ring * angle.cos(), center_y + ring * angle.sin());
        for slot in 0..3i32 {
            let offset = (slot - 1) as f64 * 2.0;
            let location = Location::new(base.x - offset * angle.sin(), base.y + offset * angle.cos());
            map.spawn_ship(location, player, constants);
        }
    }

    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parsec_replay::snapshot::state_hash;

    #[test]
    fn same_seed_same_map() {
        let constants = GameConstants::default();
        let a = fixture_map(11, 240.0, 160.0, 2, &constants);
        let b = fixture_map(11, 240.0, 160.0, 2, &constants);
        assert_eq!(state_hash(&a).unwrap(), state_hash(&b).unwrap());
    }

    #[test]
    fn different_seeds_differ() {
        let constants = GameConstants::default();
        let a = fixture_map(11, 240.0, 160.0, 2, &constants);
        let b = fixture_map(12, 240.0, 160.0, 2, &constants);
        assert_ne!(state_hash(&a).unwrap(), state_hash(&b).unwrap());
    }

    #[test]
    fn everything_starts_inside_the_map() {
        let constants = GameConstants::default();
        let map = fixture_map(99, 240.0, 160.0, 4, &constants);
        for (_, _, ship) in map.each_ship() {
            assert!(map.within_bounds(ship.location));
        }
        for (_, planet) in map.each_planet() {
            assert!(map.within_bounds(planet.location));
        }
    }

    #[test]
    fn each_player_starts_with_three_separated_ships() {
        let constants = GameConstants::default();
        let map = fixture_map(5, 240.0, 160.0, 2, &constants);
        for player in 0..2 {
            assert_eq!(map.player_ships(player).len(), 3);
        }
        let ships: Vec<Location> = map.each_ship().map(|(_, _, s)| s.location).collect();
        for (i, a) in ships.iter().enumerate() {
            for b in &ships[i + 1..] {
                assert!(a.distance_to(*b) >= 2.0 * constants.ship_radius);
            }
        }
    }

    #[test]
    fn ships_spawn_clear_of_planets() {
        let constants = GameConstants::default();
        let map = fixture_map(21, 240.0, 160.0, 3, &constants);
        for (_, _, ship) in map.each_ship() {
            for (_, planet) in map.each_planet() {
                assert!(
                    ship.location.distance_to(planet.location)
                        >= planet.radius + ship.radius,
                    "starting ship inside a planet"
                );
            }
        }
    }
}
