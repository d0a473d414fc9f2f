//! Entities and their identifiers.
//!
//! An [`EntityId`] is a tagged index into the [`GameMap`](crate::map::GameMap)
//! arena. Ship identifiers additionally carry the owning player, and indices
//! are stable for the lifetime of the entity and never reused within a game.
//! Everything downstream of the map refers to entities by id only, so the
//! docking cycle (ship → planet → docked ships) never needs owning handles.
//!
//! `EntityId` derives `Ord`: every iteration the simulation performs over ids
//! is in this total order, which is what makes tie-breaking reproducible
//! across runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geom::{Location, Velocity};

/// A player's position in the lobby, `0..N-1`.
pub type PlayerId = usize;
/// Per-player ship index. Allocated ascending, never reused.
pub type ShipIndex = usize;
/// Planet index into the map's planet arena.
pub type PlanetIndex = usize;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Tagged handle for any entity in the map arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EntityId {
    /// A handle that refers to nothing.
    Invalid,
    /// A ship, addressed by owning player and per-player index.
    Ship {
        /// Owning player.
        player: PlayerId,
        /// Per-player ship index.
        ship: ShipIndex,
    },
    /// A planet, addressed by arena index.
    Planet(PlanetIndex),
}

impl EntityId {
    /// The owning player, for ship handles.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            EntityId::Ship { player, .. } => Some(*player),
            _ => None,
        }
    }

    /// Whether this handle addresses a ship.
    pub fn is_ship(&self) -> bool {
        matches!(self, EntityId::Ship { .. })
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Invalid => write!(f, "invalid"),
            EntityId::Ship { player, ship } => write!(f, "ship {ship} (player {player})"),
            EntityId::Planet(index) => write!(f, "planet {index}"),
        }
    }
}

// ---------------------------------------------------------------------------
// DockingStatus
// ---------------------------------------------------------------------------

/// Where a ship is in the docking state machine.
///
/// `Undocked → Docking → Docked → Undocking → Undocked`; the two transitional
/// states each last `dock_turns` turns. Any state other than `Undocked`
/// implies zero velocity and a live target planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DockingStatus {
    /// Free-flying; the only state that may thrust or fire.
    Undocked,
    /// Transitioning toward `Docked`.
    Docking,
    /// Attached; produces for the planet's owner and may regenerate.
    Docked,
    /// Transitioning toward `Undocked`.
    Undocking,
}

// ---------------------------------------------------------------------------
// Ship
// ---------------------------------------------------------------------------

/// A ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Current position.
    pub location: Location,
    /// Current velocity.
    pub velocity: Velocity,
    /// Hit points, `0..=max_ship_health`. Zero means dead (pending cleanup).
    pub health: u64,
    /// Collision radius.
    pub radius: f64,
    /// Turns until the weapon may fire again.
    pub weapon_cooldown: u32,
    /// Docking state machine position.
    pub docking_status: DockingStatus,
    /// Turns remaining in the current `Docking`/`Undocking` transition.
    pub docking_progress: u32,
    /// The planet this ship is attached to, when not `Undocked`.
    pub docked_planet: Option<PlanetIndex>,
}

impl Ship {
    /// A freshly spawned ship: full health, at rest, undocked.
    pub fn new(location: Location, health: u64, radius: f64) -> Self {
        Self {
            location,
            velocity: Velocity::ZERO,
            health,
            radius,
            weapon_cooldown: 0,
            docking_status: DockingStatus::Undocked,
            docking_progress: 0,
            docked_planet: None,
        }
    }

    /// Drop any docking attachment and return to `Undocked`.
    pub fn reset_docking(&mut self) {
        self.docking_status = DockingStatus::Undocked;
        self.docking_progress = 0;
        self.docked_planet = None;
    }

    /// Regain `amount` hit points, saturating at `max`.
    pub fn heal(&mut self, amount: u64, max: u64) {
        self.health = (self.health + amount).min(max);
    }
}

// ---------------------------------------------------------------------------
// Planet
// ---------------------------------------------------------------------------

/// A planet.
///
/// Planets are placed by map setup and never created afterwards; destruction
/// is terminal and triggers an area explosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Fixed position.
    pub location: Location,
    /// Fixed collision radius.
    pub radius: f64,
    /// Number of docking slots.
    pub docking_spots: usize,
    /// Hit points. Zero means destroyed (pending cleanup).
    pub health: u64,
    /// Owning player, if claimed.
    pub owner: Option<PlayerId>,
    /// Ships attached to this planet, in docking order. No duplicates,
    /// length at most `docking_spots`. Entries are ships of `owner`.
    pub docked_ships: Vec<ShipIndex>,
    /// Production accumulated toward the next spawned ship.
    pub current_production: u64,
    /// Production this planet can still generate over its lifetime.
    pub remaining_production: u64,
    /// Set when a same-turn docking contention voids the planet's ownership;
    /// blocks docking until the end of the next docking tick.
    pub frozen: bool,
}

impl Planet {
    /// A fresh, unowned planet.
    pub fn new(
        location: Location,
        radius: f64,
        docking_spots: usize,
        health: u64,
        remaining_production: u64,
    ) -> Self {
        Self {
            location,
            radius,
            docking_spots,
            health,
            owner: None,
            docked_ships: Vec::new(),
            current_production: 0,
            remaining_production,
            frozen: false,
        }
    }

    /// Whether a docking slot remains.
    pub fn has_free_spot(&self) -> bool {
        self.docked_ships.len() < self.docking_spots
    }

    /// Detach `ship` from the docked list. A planet whose last docked ship
    /// leaves reverts to unowned unless it is frozen.
    pub fn remove_docked_ship(&mut self, ship: ShipIndex) {
        self.docked_ships.retain(|&s| s != ship);
        if self.docked_ships.is_empty() && !self.frozen {
            self.owner = None;
        }
    }
}

// ---------------------------------------------------------------------------
// EntityRef
// ---------------------------------------------------------------------------

/// A borrowed view of either entity kind, for code that only needs the
/// shared geometric attributes.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    /// A ship view.
    Ship(&'a Ship),
    /// A planet view.
    Planet(&'a Planet),
}

impl EntityRef<'_> {
    /// Current position.
    pub fn location(&self) -> Location {
        match self {
            EntityRef::Ship(s) => s.location,
            EntityRef::Planet(p) => p.location,
        }
    }

    /// Collision radius.
    pub fn radius(&self) -> f64 {
        match self {
            EntityRef::Ship(s) => s.radius,
            EntityRef::Planet(p) => p.radius,
        }
    }

    /// Current hit points.
    pub fn health(&self) -> u64 {
        match self {
            EntityRef::Ship(s) => s.health,
            EntityRef::Planet(p) => p.health,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
