//! The map arena: single owner of all ships and planets.
//!
//! [`GameMap`] stores planets in an index-stable arena (`Vec<Option<Planet>>`,
//! slots emptied on cleanup) and ships per player in a
//! `BTreeMap<ShipIndex, Ship>` so that every iteration is in ascending index
//! order. Ship indices count up monotonically and are never reused, which
//! keeps [`EntityId`]s stable for a whole game.
//!
//! Kills are two-phase: [`GameMap::unsafe_kill_entity`] zeroes health and
//! defers the removal (the entity stops being *valid* immediately but its
//! state stays readable), and [`GameMap::cleanup_entities`] commits the
//! deferred removals. Event resolution relies on this: it drops events whose
//! endpoints died mid-batch while still being able to read the corpse's
//! location for transcript records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GameConstants;
use crate::entity::{EntityId, EntityRef, Planet, PlanetIndex, PlayerId, Ship, ShipIndex};
use crate::geom::Location;

// ---------------------------------------------------------------------------
// GameMap
// ---------------------------------------------------------------------------

/// The rectangular world `[0, W) × [0, H)` and every entity in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMap {
    width: f64,
    height: f64,
    planets: Vec<Option<Planet>>,
    /// Per-player ship storage, ascending-index iteration order.
    ships: Vec<BTreeMap<ShipIndex, Ship>>,
    /// Next ship index per player. Indices are never reused.
    next_ship_index: Vec<ShipIndex>,
    /// Entities killed since the last `cleanup_entities` call.
    graveyard: Vec<EntityId>,
}

impl GameMap {
    /// An empty map for `num_players` players.
    pub fn new(width: f64, height: f64, num_players: usize) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "map dimensions must be positive, got {width}x{height}"
        );
        assert!(num_players >= 1, "a game needs at least one player");
        Self {
            width,
            height,
            planets: Vec::new(),
            ships: vec![BTreeMap::new(); num_players],
            next_ship_index: vec![0; num_players],
            graveyard: Vec::new(),
        }
    }

    /// Map width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Map height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of players this map was created for.
    pub fn num_players(&self) -> usize {
        self.ships.len()
    }

    // -- setup --------------------------------------------------------------

    /// Place a planet and return its index. Setup-time only; planets are
    /// never created once the game is running.
    pub fn add_planet(&mut self, planet: Planet) -> PlanetIndex {
        self.planets.push(Some(planet));
        self.planets.len() - 1
    }

    // -- geometry -----------------------------------------------------------

    /// Whether a location lies inside `[0, W) × [0, H)`.
    pub fn within_bounds(&self, location: Location) -> bool {
        location.x >= 0.0 && location.x < self.width && location.y >= 0.0 && location.y < self.height
    }

    /// Offset `base` by `(dx, dy)`, returning the new location only if it
    /// stays inside the map.
    pub fn location_with_delta(&self, base: Location, dx: f64, dy: f64) -> Option<Location> {
        let moved = Location::new(base.x + dx, base.y + dy);
        self.within_bounds(moved).then_some(moved)
    }

    // -- lookup -------------------------------------------------------------

    /// The ship addressed by `id`, if its storage entry still exists.
    ///
    /// Returns corpses awaiting cleanup too; use [`is_valid`](Self::is_valid)
    /// for the aliveness predicate.
    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        match id {
            EntityId::Ship { player, ship } => self.ships.get(player)?.get(&ship),
            _ => None,
        }
    }

    /// Mutable variant of [`ship`](Self::ship).
    pub fn ship_mut(&mut self, id: EntityId) -> Option<&mut Ship> {
        match id {
            EntityId::Ship { player, ship } => self.ships.get_mut(player)?.get_mut(&ship),
            _ => None,
        }
    }

    /// The planet in slot `index`, if the slot is still occupied.
    pub fn planet(&self, index: PlanetIndex) -> Option<&Planet> {
        self.planets.get(index)?.as_ref()
    }

    /// Mutable variant of [`planet`](Self::planet).
    pub fn planet_mut(&mut self, index: PlanetIndex) -> Option<&mut Planet> {
        self.planets.get_mut(index)?.as_mut()
    }

    /// A kind-agnostic view of whatever `id` addresses.
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        match id {
            EntityId::Ship { .. } => self.ship(id).map(EntityRef::Ship),
            EntityId::Planet(index) => self.planet(index).map(EntityRef::Planet),
            EntityId::Invalid => None,
        }
    }

    /// Whether `id` addresses a live entity (present and health above zero).
    pub fn is_valid(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(|e| e.health() > 0)
    }

    // -- iteration ----------------------------------------------------------

    /// Every live ship, ascending by `(player, ship index)`.
    pub fn each_ship(&self) -> impl Iterator<Item = (PlayerId, ShipIndex, &Ship)> {
        self.ships.iter().enumerate().flat_map(|(player, ships)| {
            ships
                .iter()
                .filter(|(_, s)| s.health > 0)
                .map(move |(&index, ship)| (player, index, ship))
        })
    }

    /// Ids of every live ship, ascending. Handy when the caller needs to
    /// mutate ships while walking them.
    pub fn ship_ids(&self) -> Vec<EntityId> {
        self.each_ship()
            .map(|(player, ship, _)| EntityId::Ship { player, ship })
            .collect()
    }

    /// A player's ship storage.
    pub fn player_ships(&self, player: PlayerId) -> &BTreeMap<ShipIndex, Ship> {
        &self.ships[player]
    }

    /// Whether a player has any live ship.
    pub fn has_ships(&self, player: PlayerId) -> bool {
        self.ships[player].values().any(|s| s.health > 0)
    }

    /// Every live planet, ascending by index.
    pub fn each_planet(&self) -> impl Iterator<Item = (PlanetIndex, &Planet)> {
        self.planets
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|p| (index, p)))
            .filter(|(_, p)| p.health > 0)
    }

    /// Mutable variant of [`each_planet`](Self::each_planet).
    pub fn each_planet_mut(&mut self) -> impl Iterator<Item = (PlanetIndex, &mut Planet)> {
        self.planets
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|p| (index, p)))
            .filter(|(_, p)| p.health > 0)
    }

    /// Indices of every live planet, ascending.
    pub fn planet_ids(&self) -> Vec<PlanetIndex> {
        self.each_planet().map(|(index, _)| index).collect()
    }

    // -- lifecycle ----------------------------------------------------------

    /// Spawn a fresh ship for `player` and return its index.
    pub fn spawn_ship(
        &mut self,
        location: Location,
        player: PlayerId,
        constants: &GameConstants,
    ) -> ShipIndex {
        let index = self.next_ship_index[player];
        self.next_ship_index[player] += 1;
        let ship = Ship::new(location, constants.max_ship_health, constants.ship_radius);
        self.ships[player].insert(index, ship);
        debug!(player, ship = index, x = location.x, y = location.y, "ship spawned");
        index
    }

    /// Drop an entity with no side effects: health goes to zero and the
    /// removal is deferred until [`cleanup_entities`](Self::cleanup_entities).
    /// No explosions, no docking bookkeeping, no transcript records -- those
    /// are the resolver's job.
    pub fn unsafe_kill_entity(&mut self, id: EntityId) {
        if !self.is_valid(id) {
            return;
        }
        match id {
            EntityId::Ship { .. } => {
                if let Some(ship) = self.ship_mut(id) {
                    ship.health = 0;
                }
            }
            EntityId::Planet(index) => {
                if let Some(planet) = self.planet_mut(index) {
                    planet.health = 0;
                }
            }
            EntityId::Invalid => return,
        }
        self.graveyard.push(id);
    }

    /// Commit every removal deferred by `unsafe_kill_entity`.
    pub fn cleanup_entities(&mut self) {
        for id in std::mem::take(&mut self.graveyard) {
            match id {
                EntityId::Ship { player, ship } => {
                    self.ships[player].remove(&ship);
                }
                EntityId::Planet(index) => {
                    self.planets[index] = None;
                }
                EntityId::Invalid => {}
            }
        }
    }

    // -- probing ------------------------------------------------------------

    /// Every live entity whose hull overlaps the disk `(location, radius)`.
    ///
    /// Exact linear scan -- used off the hot path (spawn-site search, planet
    /// explosions). The broadphase grid handles the per-ship hot loop.
    pub fn test(&self, location: Location, radius: f64) -> Vec<EntityId> {
        let mut out = Vec::new();
        for (player, ship, s) in self.each_ship() {
            if location.distance_to(s.location) <= radius + s.radius {
                out.push(EntityId::Ship { player, ship });
            }
        }
        for (index, p) in self.each_planet() {
            if location.distance_to(p.location) <= radius + p.radius {
                out.push(EntityId::Planet(index));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
