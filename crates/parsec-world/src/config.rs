//! Game tuning constants.
//!
//! [`GameConstants`] is an immutable configuration record constructed once at
//! startup and threaded by reference through every component constructor.
//! There is deliberately no global singleton: tests and hosts build whatever
//! variant they need and the engine never reaches for ambient state.
//!
//! Defaults match the shipped game's tuning. The record serializes into the
//! replay header so a transcript is self-describing.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConstants
// ---------------------------------------------------------------------------

/// Immutable tuning knobs for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConstants {
    /// Initial and maximum ship hit points.
    pub max_ship_health: u64,
    /// Ship collision radius.
    pub ship_radius: f64,
    /// Extra reach added on top of hull radii for attack detection.
    pub weapon_radius: f64,
    /// Total damage budget per attacker per simultaneous-event batch,
    /// split evenly across that attacker's targets.
    pub weapon_damage: u64,
    /// Turns a weapon stays cold after firing.
    pub weapon_cooldown: u32,
    /// Per-turn deceleration magnitude applied after movement.
    pub drag: f64,
    /// Turns a docking (or undocking) transition takes.
    pub dock_turns: u32,
    /// Docking reach beyond the two hull radii.
    pub dock_radius: f64,
    /// Hit points regained per turn while docked.
    pub docked_ship_regeneration: u64,
    /// Production contributed by the first docked ship each turn.
    pub base_productivity: u64,
    /// Production contributed by each docked ship beyond the first.
    pub additional_productivity: u64,
    /// Accumulated production needed to spawn one ship.
    pub production_per_ship: u64,
    /// Half-extent of the integer offset scan for spawn sites.
    pub spawn_radius: i32,
    /// Extent of the area explosion past a destroyed planet's surface.
    pub explosion_radius: f64,
    /// Micro-steps per turn.
    pub max_queued_moves: usize,
    /// Event times are rounded to multiples of `1 / event_time_precision`
    /// so simultaneity is decidable.
    pub event_time_precision: u32,
    /// Broadphase grid cell width. Must be at least twice the largest
    /// broadphase query radius (`ship_radius + max speed + weapon_radius`)
    /// so a query disk never overlaps more than two cells per axis.
    pub cell_size: f64,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            max_ship_health: 255,
            ship_radius: 0.5,
            weapon_radius: 5.0,
            weapon_damage: 64,
            weapon_cooldown: 1,
            drag: 10.0,
            dock_turns: 5,
            dock_radius: 4.0,
            docked_ship_regeneration: 0,
            base_productivity: 6,
            additional_productivity: 6,
            production_per_ship: 72,
            spawn_radius: 2,
            explosion_radius: 10.0,
            max_queued_moves: 1,
            event_time_precision: 10_000,
            cell_size: 32.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
