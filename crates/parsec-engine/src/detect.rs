//! Event detection: one micro-step's worth of interactions.
//!
//! For every live ship the detector queries the broadphase grid for nearby
//! ships, runs cheap distance prechecks, and only then pays for the exact
//! [`collision_time`] solve. Planets are scanned linearly (few of them,
//! radii can exceed a grid cell). Detection never mutates the world.
//!
//! The broadphase is rebuilt from scratch at the top of every pass; event
//! resolution downstream never touches it.
//!
//! Two deliberate reference behaviors live here and must stay exactly as
//! they are:
//!
//! - A pair in weapon range whose solve lands outside the frame window still
//!   yields an attack at `t = 0` when the hulls are *already* inside attack
//!   reach (an overlapping pair that is separating solves to its exit root,
//!   which can exceed the window).
//! - Desertion only considers axes with *positive* velocity, so a ship
//!   drifting off the left or bottom edge produces no desertion event this
//!   frame. Observable in replays; do not "fix".

use parsec_world::collision::{collision_time, collision_time_fixed};
use parsec_world::config::GameConstants;
use parsec_world::entity::EntityId;
use parsec_world::grid::CollisionMap;
use parsec_world::map::GameMap;

use crate::event::{EventAccumulator, SimEvent, SimEventKind};

// ---------------------------------------------------------------------------
// find_events
// ---------------------------------------------------------------------------

/// Detect every attack, collision, and desertion within the coming unit time
/// frame, in canonical order.
pub fn find_events(map: &GameMap, constants: &GameConstants) -> Vec<SimEvent> {
    let mut grid = CollisionMap::new(map.width(), map.height(), constants.cell_size);
    grid.rebuild(map);

    let mut acc = EventAccumulator::new(constants.event_time_precision);
    let mut candidates: Vec<EntityId> = Vec::new();

    for (player1, index1, ship1) in map.each_ship() {
        let id1 = EntityId::Ship { player: player1, ship: index1 };
        let speed1 = ship1.velocity.magnitude();

        // -- ship vs ship, via broadphase --------------------------------
        candidates.clear();
        let query_radius = ship1.radius + speed1 + constants.weapon_radius;
        grid.test(ship1.location, query_radius, &mut candidates);

        for &id2 in &candidates {
            let EntityId::Ship { player: player2, .. } = id2 else {
                continue;
            };
            let Some(ship2) = map.ship(id2) else {
                continue;
            };
            let distance = ship1.location.distance_to(ship2.location);
            let speed2 = ship2.velocity.magnitude();

            let attack_reach = ship1.radius + ship2.radius + constants.weapon_radius;
            if player1 != player2 && distance <= speed1 + speed2 + attack_reach {
                match collision_time(
                    attack_reach,
                    ship1.location,
                    ship2.location,
                    ship1.velocity,
                    ship2.velocity,
                ) {
                    Some(t) if (0.0..=1.0).contains(&t) => {
                        acc.push(SimEventKind::Attack, id1, id2, t);
                    }
                    _ => {
                        if distance < attack_reach {
                            acc.push(SimEventKind::Attack, id1, id2, 0.0);
                        }
                    }
                }
            }

            if id1 != id2 && distance <= speed1 + speed2 + ship1.radius + ship2.radius {
                let contact = ship1.radius + ship2.radius;
                match collision_time(
                    contact,
                    ship1.location,
                    ship2.location,
                    ship1.velocity,
                    ship2.velocity,
                ) {
                    Some(t) => {
                        if (0.0..=1.0).contains(&t) {
                            acc.push(SimEventKind::Collision, id1, id2, t);
                        }
                    }
                    None => {
                        // A no-contact report for hulls already inside each
                        // other means the world state is corrupt.
                        assert!(
                            distance >= contact,
                            "collision solver reported no contact for overlapping \
                             ships {id1} and {id2} (distance {distance}, contact {contact})"
                        );
                    }
                }
            }
        }

        // -- ship vs planet, linear scan ---------------------------------
        for (planet_index, planet) in map.each_planet() {
            let distance = ship1.location.distance_to(planet.location);
            if distance <= speed1 + ship1.radius + planet.radius {
                if let Some(t) = collision_time_fixed(
                    ship1.radius + planet.radius,
                    ship1.location,
                    planet.location,
                    ship1.velocity,
                ) {
                    if (0.0..=1.0).contains(&t) {
                        acc.push(
                            SimEventKind::Collision,
                            id1,
                            EntityId::Planet(planet_index),
                            t,
                        );
                    }
                }
            }
        }

        // -- desertion ---------------------------------------------------
        let projected = ship1.location.moved_by(ship1.velocity, 1.0);
        if !map.within_bounds(projected) {
            let mut crossing: Option<f64> = None;
            if ship1.velocity.vx > 0.0 {
                let t = (map.width() - ship1.location.x) / ship1.velocity.vx;
                crossing = Some(crossing.map_or(t, |c: f64| c.min(t)));
            }
            if ship1.velocity.vy > 0.0 {
                let t = (map.height() - ship1.location.y) / ship1.velocity.vy;
                crossing = Some(crossing.map_or(t, |c: f64| c.min(t)));
            }
            if let Some(t) = crossing {
                if t <= 1.0 {
                    assert!(
                        t >= 0.0,
                        "desertion time {t} for {id1} is before the frame start"
                    );
                    acc.push(SimEventKind::Desertion, id1, id1, t);
                }
            }
        }
    }

    acc.into_events()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
