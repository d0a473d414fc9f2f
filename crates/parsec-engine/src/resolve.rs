//! Event resolution: turning detected events into damage, deaths, and
//! transcript records.
//!
//! Events arrive sorted by quantized time. The resolver pops one *batch* (all
//! events sharing the smallest time) at a time, drops events whose endpoints
//! died in an earlier batch, and applies the batch atomically:
//!
//! 1. **Pass 1** walks the batch in canonical order. Attack events accumulate
//!    a per-attacker target list (an attacker must be alive, off cooldown,
//!    and undocked *at that moment*); collisions and desertions apply their
//!    damage inline, so a ship rammed at `t` can still have been recorded as
//!    an attacker by an earlier event of the same batch.
//! 2. **Pass 2** splits each attacker's `weapon_damage` evenly across its
//!    targets into a damage map (floating-point; truncated only on
//!    application), sets each attacker's cooldown exactly once, and records
//!    one attack event per attacker.
//! 3. The damage map is applied at the batch time, deferred deaths are
//!    committed, and the loop moves to the next batch.
//!
//! Deaths record the corpse at `location + velocity * t` with `t` the
//! *quantized* batch time, not the sub-tick instant of contact -- replay
//! viewers depend on that. A planet death detaches its ships, then deals
//! falloff damage to every entity inside `radius + explosion_radius`,
//! iterating over a candidate snapshot captured before any damage lands;
//! chained planet deaths recurse the same way.

use std::collections::BTreeMap;

use tracing::debug;

use parsec_replay::event::GameEvent;
use parsec_world::config::GameConstants;
use parsec_world::entity::{DockingStatus, EntityId};
use parsec_world::geom::Location;
use parsec_world::map::GameMap;

use crate::event::{SimEvent, SimEventKind};

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Borrows everything a batch needs to mutate: the map, the current turn's
/// transcript bucket, and the per-player damage tallies.
pub struct Resolver<'a> {
    map: &'a mut GameMap,
    constants: &'a GameConstants,
    record: &'a mut Vec<GameEvent>,
    damage_dealt: &'a mut [u64],
}

/// Per-attacker accumulation for the two-pass attack accounting.
struct AttackRecord {
    location: Location,
    targets: Vec<(EntityId, Location)>,
}

impl<'a> Resolver<'a> {
    /// Wire a resolver over the turn's mutable state.
    pub fn new(
        map: &'a mut GameMap,
        constants: &'a GameConstants,
        record: &'a mut Vec<GameEvent>,
        damage_dealt: &'a mut [u64],
    ) -> Self {
        Self {
            map,
            constants,
            record,
            damage_dealt,
        }
    }

    /// Resolve a detection pass's events (already in canonical order).
    pub fn resolve(&mut self, events: Vec<SimEvent>) {
        let mut index = 0;
        while index < events.len() {
            let batch_time = events[index].time;
            let mut end = index;
            while end < events.len() && events[end].time.to_bits() == batch_time.to_bits() {
                end += 1;
            }
            // Drop events that lost an endpoint in an earlier batch.
            let batch: Vec<SimEvent> = events[index..end]
                .iter()
                .copied()
                .filter(|e| self.map.is_valid(e.id1) && self.map.is_valid(e.id2))
                .collect();
            index = end;
            if batch.is_empty() {
                continue;
            }
            self.resolve_batch(&batch, batch_time);
            self.map.cleanup_entities();
        }
    }

    // -- batch --------------------------------------------------------------

    fn resolve_batch(&mut self, batch: &[SimEvent], time: f64) {
        let mut attacks: BTreeMap<EntityId, AttackRecord> = BTreeMap::new();

        // Pass 1: collect attackers, apply collisions and desertions inline.
        for event in batch {
            match event.kind {
                SimEventKind::Attack => {
                    for (attacker_id, target_id) in
                        [(event.id1, event.id2), (event.id2, event.id1)]
                    {
                        self.collect_attacker(&mut attacks, attacker_id, target_id, time);
                    }
                }
                SimEventKind::Collision => self.apply_collision(event.id1, event.id2, time),
                SimEventKind::Desertion => {
                    if !self.map.is_valid(event.id1) {
                        continue;
                    }
                    let Some(ship) = self.map.ship(event.id1) else {
                        continue;
                    };
                    debug!(ship = %event.id1, time, "ship deserted the map");
                    let health = ship.health;
                    self.damage_entity(event.id1, health, time);
                }
            }
        }

        // Pass 2: split damage, set cooldowns once, record attack events.
        let mut damage: BTreeMap<EntityId, f64> = BTreeMap::new();
        for (attacker_id, record) in &attacks {
            let split = self.constants.weapon_damage as f64 / record.targets.len() as f64;
            for (target_id, _) in &record.targets {
                *damage.entry(*target_id).or_insert(0.0) += split;
            }
            if let Some(attacker) = self.map.ship_mut(*attacker_id) {
                attacker.weapon_cooldown = self.constants.weapon_cooldown;
            }
            self.record.push(GameEvent::Attack {
                attacker: *attacker_id,
                location: record.location,
                time,
                targets: record.targets.iter().map(|(id, _)| *id).collect(),
                target_locations: record.targets.iter().map(|(_, loc)| *loc).collect(),
            });
        }

        // Accumulated fractions truncate only here, on application.
        for (target_id, amount) in damage {
            self.damage_entity(target_id, amount as u64, time);
        }
    }

    /// Pass-1 attack bookkeeping for one (attacker, target) direction of an
    /// attack event.
    fn collect_attacker(
        &mut self,
        attacks: &mut BTreeMap<EntityId, AttackRecord>,
        attacker_id: EntityId,
        target_id: EntityId,
        time: f64,
    ) {
        if !self.map.is_valid(attacker_id) {
            return;
        }
        let Some(attacker) = self.map.ship(attacker_id) else {
            return;
        };
        if attacker.weapon_cooldown != 0 || attacker.docking_status != DockingStatus::Undocked {
            return;
        }
        let attacker_location = attacker.location.moved_by(attacker.velocity, time);
        let Some(target) = self.map.ship(target_id) else {
            return;
        };
        let target_location = target.location.moved_by(target.velocity, time);

        let record = attacks.entry(attacker_id).or_insert_with(|| AttackRecord {
            location: attacker_location,
            targets: Vec::new(),
        });
        record.targets.push((target_id, target_location));
        if let Some(player) = attacker_id.player() {
            self.damage_dealt[player] += self.constants.weapon_damage;
        }
    }

    /// Inline collision damage: each ship takes the other's current hit
    /// points; against a planet the ship takes its own (dies) and the planet
    /// takes that same amount.
    fn apply_collision(&mut self, id1: EntityId, id2: EntityId, time: f64) {
        if !self.map.is_valid(id1) || !self.map.is_valid(id2) {
            return;
        }
        match (id1, id2) {
            (EntityId::Ship { .. }, EntityId::Ship { .. }) => {
                let (Some(ship1), Some(ship2)) = (self.map.ship(id1), self.map.ship(id2)) else {
                    return;
                };
                let health1 = ship1.health;
                let health2 = ship2.health;
                self.damage_entity(id1, health2, time);
                self.damage_entity(id2, health1, time);
            }
            (ship_id @ EntityId::Ship { .. }, planet_id @ EntityId::Planet(_)) => {
                let Some(ship) = self.map.ship(ship_id) else {
                    return;
                };
                let health = ship.health;
                self.damage_entity(ship_id, health, time);
                self.damage_entity(planet_id, health, time);
            }
            // Ids are canonical (ship sorts before planet) and planet-planet
            // contacts are never detected, so nothing else can arrive here.
            _ => {}
        }
    }

    // -- damage and death ----------------------------------------------------

    /// Subtract `damage` from an entity, killing it when the damage meets or
    /// exceeds its remaining health. No-op on entities already dead.
    pub fn damage_entity(&mut self, id: EntityId, damage: u64, time: f64) {
        if !self.map.is_valid(id) {
            return;
        }
        let Some(entity) = self.map.entity(id) else {
            return;
        };
        if damage >= entity.health() {
            self.kill_entity(id, time);
            return;
        }
        match id {
            EntityId::Ship { .. } => {
                if let Some(ship) = self.map.ship_mut(id) {
                    ship.health -= damage;
                }
            }
            EntityId::Planet(index) => {
                if let Some(planet) = self.map.planet_mut(index) {
                    planet.health -= damage;
                }
            }
            EntityId::Invalid => {}
        }
    }

    /// Kill an entity at the given (quantized) event time. Idempotent.
    ///
    /// Ships record their corpse at `location + velocity * time` and detach
    /// from their planet. Planets detach their ships, then explode: every
    /// entity within `radius + explosion_radius` of the center takes falloff
    /// damage, entities inside the planet's own radius die outright, and the
    /// candidate list is snapshotted before any of that damage lands.
    pub fn kill_entity(&mut self, id: EntityId, time: f64) {
        if !self.map.is_valid(id) {
            return;
        }
        match id {
            EntityId::Ship { ship: ship_index, .. } => {
                let Some(ship) = self.map.ship(id) else {
                    return;
                };
                let location = ship.location.moved_by(ship.velocity, time);
                let radius = ship.radius;
                let attached = (ship.docking_status != DockingStatus::Undocked)
                    .then_some(ship.docked_planet)
                    .flatten();

                if let Some(planet_index) = attached {
                    if let Some(planet) = self.map.planet_mut(planet_index) {
                        planet.remove_docked_ship(ship_index);
                    }
                }
                if let Some(ship) = self.map.ship_mut(id) {
                    ship.reset_docking();
                }

                self.record.push(GameEvent::Destroyed {
                    entity: id,
                    location,
                    radius,
                    time,
                });
                self.map.unsafe_kill_entity(id);
            }
            EntityId::Planet(planet_index) => {
                let Some(planet) = self.map.planet(planet_index) else {
                    return;
                };
                let location = planet.location;
                let radius = planet.radius;
                let owner = planet.owner;
                let docked = planet.docked_ships.clone();

                if let Some(owner) = owner {
                    for ship_index in docked {
                        let attached = EntityId::Ship { player: owner, ship: ship_index };
                        if let Some(ship) = self.map.ship_mut(attached) {
                            ship.reset_docking();
                        }
                    }
                }

                debug!(planet = planet_index, "planet destroyed, detonating");
                self.record.push(GameEvent::Destroyed {
                    entity: id,
                    location,
                    radius,
                    time,
                });
                self.map.unsafe_kill_entity(id);

                let candidates = self
                    .map
                    .test(location, radius + self.constants.explosion_radius);
                for target_id in candidates {
                    let Some(target) = self.map.entity(target_id) else {
                        continue;
                    };
                    let d = location.distance_to(target.location()) - target.radius();
                    let damage = if d < radius {
                        u64::MAX
                    } else if d - radius <= self.constants.explosion_radius {
                        let falloff = 1.0 - (d - radius) / (2.0 * self.constants.explosion_radius);
                        (self.constants.max_ship_health as f64 * falloff) as u64
                    } else {
                        continue;
                    };
                    self.damage_entity(target_id, damage, time);
                }
            }
            EntityId::Invalid => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parsec_world::entity::Planet;
    use parsec_world::geom::Velocity;

    fn ship(player: usize, index: usize) -> EntityId {
        EntityId::Ship { player, ship: index }
    }

    fn attack(a: EntityId, b: EntityId, time: f64) -> SimEvent {
        let (id1, id2) = if a <= b { (a, b) } else { (b, a) };
        SimEvent { kind: SimEventKind::Attack, id1, id2, time }
    }

    fn collision(a: EntityId, b: EntityId, time: f64) -> SimEvent {
        let (id1, id2) = if a <= b { (a, b) } else { (b, a) };
        SimEvent { kind: SimEventKind::Collision, id1, id2, time }
    }

    struct Fixture {
        map: GameMap,
        constants: GameConstants,
        record: Vec<GameEvent>,
        damage_dealt: Vec<u64>,
    }

    impl Fixture {
        fn new(num_players: usize) -> Self {
            Self {
                map: GameMap::new(240.0, 160.0, num_players),
                constants: GameConstants::default(),
                record: Vec::new(),
                damage_dealt: vec![0; num_players],
            }
        }

        fn spawn(&mut self, player: usize, x: f64, y: f64) -> EntityId {
            let index = self
                .map
                .spawn_ship(Location::new(x, y), player, &self.constants);
            ship(player, index)
        }

        fn resolve(&mut self, events: Vec<SimEvent>) {
            let mut resolver = Resolver::new(
                &mut self.map,
                &self.constants,
                &mut self.record,
                &mut self.damage_dealt,
            );
            resolver.resolve(events);
        }

        fn health(&self, id: EntityId) -> Option<u64> {
            self.map.entity(id).map(|e| e.health())
        }
    }

    // -- 1. Attacks -----------------------------------------------------------

    #[test]
    fn mutual_attack_exchanges_full_damage() {
        let mut fx = Fixture::new(2);
        let a = fx.spawn(0, 100.0, 80.0);
        let b = fx.spawn(1, 105.5, 80.0);

        fx.resolve(vec![attack(a, b, 0.0)]);

        assert_eq!(fx.health(a), Some(255 - 64));
        assert_eq!(fx.health(b), Some(255 - 64));
        assert_eq!(fx.map.ship(a).unwrap().weapon_cooldown, 1);
        assert_eq!(fx.map.ship(b).unwrap().weapon_cooldown, 1);
        assert_eq!(fx.damage_dealt, vec![64, 64]);
        // One attack event per attacker.
        let attack_events = fx
            .record
            .iter()
            .filter(|e| matches!(e, GameEvent::Attack { .. }))
            .count();
        assert_eq!(attack_events, 2);
    }

    #[test]
    fn focus_fire_splits_each_attacker_but_stacks_on_target() {
        // Three allies engage one enemy simultaneously: each ally has one
        // target (full damage each), the enemy has three targets (damage
        // split three ways against each ally).
        let mut fx = Fixture::new(2);
        let allies = [
            fx.spawn(0, 100.0, 80.0),
            fx.spawn(0, 101.0, 80.0),
            fx.spawn(0, 102.0, 80.0),
        ];
        let enemy = fx.spawn(1, 103.0, 80.0);

        fx.resolve(vec![
            attack(allies[0], enemy, 0.0),
            attack(allies[1], enemy, 0.0),
            attack(allies[2], enemy, 0.0),
        ]);

        assert_eq!(fx.health(enemy), Some(255 - 3 * 64));
        // 64 / 3 = 21.33 per ally, truncated on application.
        for ally in allies {
            assert_eq!(fx.health(ally), Some(255 - 21));
        }
        assert_eq!(fx.damage_dealt[0], 3 * 64);
        assert_eq!(fx.damage_dealt[1], 3 * 64, "full budget per target engaged");
    }

    #[test]
    fn cooldown_blocks_attacking_but_not_being_hit() {
        let mut fx = Fixture::new(2);
        let a = fx.spawn(0, 100.0, 80.0);
        let b = fx.spawn(1, 105.0, 80.0);
        fx.map.ship_mut(a).unwrap().weapon_cooldown = 1;

        fx.resolve(vec![attack(a, b, 0.0)]);

        assert_eq!(fx.health(a), Some(255 - 64), "b still fires at a");
        assert_eq!(fx.health(b), Some(255), "a's weapon is cold");
        assert_eq!(fx.map.ship(a).unwrap().weapon_cooldown, 1, "not re-armed");
    }

    #[test]
    fn docked_ships_do_not_fire() {
        let mut fx = Fixture::new(2);
        let a = fx.spawn(0, 100.0, 80.0);
        let b = fx.spawn(1, 105.0, 80.0);
        fx.map.ship_mut(a).unwrap().docking_status = DockingStatus::Docking;

        fx.resolve(vec![attack(a, b, 0.0)]);

        assert_eq!(fx.health(b), Some(255));
        assert_eq!(fx.health(a), Some(255 - 64));
    }

    #[test]
    fn lethal_split_damage_kills_and_records_destruction() {
        let mut fx = Fixture::new(2);
        let a = fx.spawn(0, 100.0, 80.0);
        let b = fx.spawn(1, 105.0, 80.0);
        fx.map.ship_mut(b).unwrap().health = 60;

        fx.resolve(vec![attack(a, b, 0.0)]);

        assert!(!fx.map.is_valid(b));
        assert!(fx
            .record
            .iter()
            .any(|e| matches!(e, GameEvent::Destroyed { entity, .. } if *entity == b)));
    }

    // -- 2. Collisions --------------------------------------------------------

    #[test]
    fn equal_health_ships_destroy_each_other() {
        let mut fx = Fixture::new(2);
        let a = fx.spawn(0, 100.0, 80.0);
        let b = fx.spawn(1, 101.0, 80.0);

        fx.resolve(vec![collision(a, b, 0.5)]);

        assert!(!fx.map.is_valid(a));
        assert!(!fx.map.is_valid(b));
    }

    #[test]
    fn unequal_collision_conserves_the_weaker_ships_health() {
        let mut fx = Fixture::new(2);
        let strong = fx.spawn(0, 100.0, 80.0);
        let weak = fx.spawn(1, 101.0, 80.0);
        fx.map.ship_mut(strong).unwrap().health = 100;
        fx.map.ship_mut(weak).unwrap().health = 40;

        fx.resolve(vec![collision(strong, weak, 0.0)]);

        // Each side loses min(100, 40): the strong ship survives on 60.
        assert_eq!(fx.health(strong), Some(60));
        assert!(!fx.map.is_valid(weak));
    }

    #[test]
    fn death_location_uses_velocity_times_event_time() {
        let mut fx = Fixture::new(2);
        let a = fx.spawn(0, 100.0, 80.0);
        let b = fx.spawn(1, 107.0, 80.0);
        fx.map.ship_mut(a).unwrap().velocity = Velocity::new(4.0, 0.0);
        fx.map.ship_mut(b).unwrap().velocity = Velocity::new(-4.0, 0.0);

        fx.resolve(vec![collision(a, b, 0.75)]);

        let mut destroyed: Vec<(EntityId, Location)> = fx
            .record
            .iter()
            .filter_map(|e| match e {
                GameEvent::Destroyed { entity, location, .. } => Some((*entity, *location)),
                _ => None,
            })
            .collect();
        destroyed.sort_by_key(|(id, _)| *id);
        assert_eq!(destroyed[0].1, Location::new(103.0, 80.0));
        assert_eq!(destroyed[1].1, Location::new(104.0, 80.0));
    }

    #[test]
    fn ship_planet_collision_kills_ship_and_dents_planet() {
        let mut fx = Fixture::new(1);
        let planet_id = EntityId::Planet(fx.map.add_planet(Planet::new(
            Location::new(120.0, 80.0),
            8.0,
            3,
            2000,
            900,
        )));
        let s = fx.spawn(0, 111.0, 80.0);
        fx.map.ship_mut(s).unwrap().health = 200;

        fx.resolve(vec![collision(s, planet_id, 0.1)]);

        assert!(!fx.map.is_valid(s));
        assert_eq!(fx.health(planet_id), Some(1800));
    }

    // -- 3. Planet explosions -------------------------------------------------

    #[test]
    fn planet_death_applies_falloff_damage_to_nearby_ships() {
        // Scenario: planet radius 8, ships at distance 10 -> hull distance
        // d = 9.5, falloff 1 - 1.5/20, damage floor(255 * 0.925) = 235.
        let mut fx = Fixture::new(2);
        let planet_index = fx.map.add_planet(Planet::new(
            Location::new(120.0, 80.0),
            8.0,
            3,
            100,
            900,
        ));
        let planet_id = EntityId::Planet(planet_index);
        let ring = [
            fx.spawn(1, 130.0, 80.0),
            fx.spawn(1, 110.0, 80.0),
            fx.spawn(1, 120.0, 90.0),
            fx.spawn(1, 120.0, 70.0),
        ];

        let mut resolver = Resolver::new(
            &mut fx.map,
            &fx.constants,
            &mut fx.record,
            &mut fx.damage_dealt,
        );
        resolver.kill_entity(planet_id, 0.0);

        for id in ring {
            assert_eq!(fx.map.entity(id).map(|e| e.health()), Some(255 - 235));
        }
        assert!(!fx.map.is_valid(planet_id));
    }

    #[test]
    fn ship_inside_planet_radius_dies_outright() {
        let mut fx = Fixture::new(1);
        let planet_index =
            fx.map
                .add_planet(Planet::new(Location::new(120.0, 80.0), 8.0, 3, 100, 900));
        let close = fx.spawn(0, 124.0, 80.0); // d = 3.5 < 8

        let mut resolver = Resolver::new(
            &mut fx.map,
            &fx.constants,
            &mut fx.record,
            &mut fx.damage_dealt,
        );
        resolver.kill_entity(EntityId::Planet(planet_index), 0.0);

        assert!(!fx.map.is_valid(close));
    }

    #[test]
    fn exploding_planet_detaches_its_docked_ships_first() {
        let mut fx = Fixture::new(1);
        let planet_index =
            fx.map
                .add_planet(Planet::new(Location::new(120.0, 80.0), 8.0, 3, 100, 900));
        // Docked far enough out to survive the blast: hull distance 17.5
        // gives falloff damage floor(255 * (1 - 9.5/20)) = 133.
        let docked = fx.spawn(0, 138.0, 80.0);
        fx.map.ship_mut(docked).unwrap().docking_status = DockingStatus::Docked;
        fx.map.ship_mut(docked).unwrap().docked_planet = Some(planet_index);
        {
            let planet = fx.map.planet_mut(planet_index).unwrap();
            planet.owner = Some(0);
            planet.docked_ships.push(0);
        }

        let mut resolver = Resolver::new(
            &mut fx.map,
            &fx.constants,
            &mut fx.record,
            &mut fx.damage_dealt,
        );
        resolver.kill_entity(EntityId::Planet(planet_index), 0.0);

        let survivor = fx.map.ship(docked).unwrap();
        assert_eq!(survivor.docking_status, DockingStatus::Undocked);
        assert_eq!(survivor.docked_planet, None);
        assert_eq!(survivor.health, 255 - 133);
    }

    #[test]
    fn planet_chain_reaction_propagates() {
        let mut fx = Fixture::new(1);
        // Second planet's hull sits 1 unit outside the first's surface, well
        // inside the blast; the falloff damage exceeds its health.
        let first =
            fx.map
                .add_planet(Planet::new(Location::new(100.0, 80.0), 8.0, 3, 100, 900));
        let second =
            fx.map
                .add_planet(Planet::new(Location::new(115.0, 80.0), 6.0, 3, 100, 900));
        // A ship near the second planet, outside the first blast's reach.
        let bystander = fx.spawn(0, 130.0, 80.0);

        let mut resolver = Resolver::new(
            &mut fx.map,
            &fx.constants,
            &mut fx.record,
            &mut fx.damage_dealt,
        );
        resolver.kill_entity(EntityId::Planet(first), 0.0);

        assert!(!fx.map.is_valid(EntityId::Planet(first)));
        assert!(!fx.map.is_valid(EntityId::Planet(second)));
        // The chained blast from the second planet reaches the bystander:
        // hull distance 14.5 from its center, falloff floor(255*(1-8.5/20)).
        assert_eq!(fx.health(bystander), Some(255 - 146));
    }

    // -- 4. Batching ----------------------------------------------------------

    #[test]
    fn later_batch_drops_events_of_entities_killed_earlier() {
        let mut fx = Fixture::new(2);
        let a = fx.spawn(0, 100.0, 80.0);
        let b = fx.spawn(1, 101.0, 80.0);
        let c = fx.spawn(1, 102.0, 80.0);

        // Batch at t=0.25 kills a and b; the t=0.5 attack between a and c
        // must be dropped, leaving c untouched.
        fx.resolve(vec![collision(a, b, 0.25), attack(a, c, 0.5)]);

        assert!(!fx.map.is_valid(a));
        assert!(!fx.map.is_valid(b));
        assert_eq!(fx.health(c), Some(255));
        assert_eq!(fx.damage_dealt, vec![0, 0]);
    }

    #[test]
    fn collision_in_batch_still_lets_same_batch_attack_land() {
        // Attack and collision share one batch: pass 1 records the attack
        // before the collision kills the attacker, so the split damage still
        // lands in pass 2.
        let mut fx = Fixture::new(2);
        let attacker = fx.spawn(0, 100.0, 80.0);
        let rammer = fx.spawn(1, 101.0, 80.0);

        fx.resolve(vec![
            attack(attacker, rammer, 0.0),
            collision(attacker, rammer, 0.0),
        ]);

        // Both die in the collision; the attack events were still recorded.
        assert!(!fx.map.is_valid(attacker));
        assert!(!fx.map.is_valid(rammer));
        assert_eq!(fx.damage_dealt, vec![64, 64]);
        let attack_events = fx
            .record
            .iter()
            .filter(|e| matches!(e, GameEvent::Attack { .. }))
            .count();
        assert_eq!(attack_events, 2);
    }

    // -- 5. damage_entity / kill_entity ---------------------------------------

    #[test]
    fn damage_below_health_subtracts() {
        let mut fx = Fixture::new(1);
        let a = fx.spawn(0, 100.0, 80.0);
        let mut resolver = Resolver::new(
            &mut fx.map,
            &fx.constants,
            &mut fx.record,
            &mut fx.damage_dealt,
        );
        resolver.damage_entity(a, 54, 0.0);
        assert_eq!(fx.health(a), Some(201));
    }

    #[test]
    fn kill_entity_is_idempotent() {
        let mut fx = Fixture::new(1);
        let a = fx.spawn(0, 100.0, 80.0);
        let mut resolver = Resolver::new(
            &mut fx.map,
            &fx.constants,
            &mut fx.record,
            &mut fx.damage_dealt,
        );
        resolver.kill_entity(a, 0.0);
        resolver.kill_entity(a, 0.0);
        let destroyed = fx
            .record
            .iter()
            .filter(|e| matches!(e, GameEvent::Destroyed { .. }))
            .count();
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn dying_docked_ship_leaves_the_planet_roster() {
        let mut fx = Fixture::new(1);
        let planet_index =
            fx.map
                .add_planet(Planet::new(Location::new(120.0, 80.0), 8.0, 3, 2000, 900));
        let s = fx.spawn(0, 112.0, 80.0);
        fx.map.ship_mut(s).unwrap().docking_status = DockingStatus::Docked;
        fx.map.ship_mut(s).unwrap().docked_planet = Some(planet_index);
        {
            let planet = fx.map.planet_mut(planet_index).unwrap();
            planet.owner = Some(0);
            planet.docked_ships.push(0);
        }

        let mut resolver = Resolver::new(
            &mut fx.map,
            &fx.constants,
            &mut fx.record,
            &mut fx.damage_dealt,
        );
        resolver.kill_entity(s, 0.0);

        let planet = fx.map.planet(planet_index).unwrap();
        assert!(planet.docked_ships.is_empty());
        assert_eq!(planet.owner, None, "last docked ship gone, planet unowned");
    }
}
