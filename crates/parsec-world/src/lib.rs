//! World model for the parsec turn engine.
//!
//! This crate owns everything the simulation mutates: geometry primitives
//! ([`geom`]), entities and their identifiers ([`entity`]), the map arena
//! ([`map`]), the broadphase grid ([`grid`]), the continuous collision solver
//! ([`collision`]), and the immutable game constants ([`config`]).
//!
//! The [`GameMap`](map::GameMap) is the single owner of all entity state.
//! Everything else refers to entities by [`EntityId`](entity::EntityId)
//! (arena-by-index), so the ship ↔ planet docking cycle is representable
//! without aliasing hazards and event resolution never holds owning handles.

#![deny(unsafe_code)]

pub mod collision;
pub mod config;
pub mod entity;
pub mod geom;
pub mod grid;
pub mod map;
pub mod moves;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::collision::collision_time;
    pub use crate::config::GameConstants;
    pub use crate::entity::{
        DockingStatus, EntityId, EntityRef, Planet, PlanetIndex, PlayerId, Ship, ShipIndex,
    };
    pub use crate::geom::{Location, Velocity};
    pub use crate::grid::CollisionMap;
    pub use crate::map::GameMap;
    pub use crate::moves::Move;
}
