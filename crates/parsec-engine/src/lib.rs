//! The parsec turn engine: deterministic simulation driver for a 2D,
//! continuous-space, multi-agent competitive game.
//!
//! Given a fixed initial [`GameMap`](parsec_world::map::GameMap) and one
//! [`MoveProvider`](moves::MoveProvider) per player, the
//! [`TurnLoop`](turn::TurnLoop) advances the world turn by turn -- resolving
//! motion, combat, and docking under continuous-time collision semantics --
//! and records a byte-reproducible transcript through `parsec-replay`.
//!
//! Per turn the pipeline is fixed: retrieve moves (the only concurrent and
//! the only blocking step) → docking tick → per micro-step {apply moves →
//! detect events → resolve events → advance positions} → production → drag →
//! cooldowns → snapshot → termination check.
//!
//! # Determinism
//!
//! Same initial map + same move streams = bitwise-identical transcripts.
//! This rests on: total iteration orders everywhere (ascending player id,
//! ascending ship index, ascending planet index), event-time quantization so
//! simultaneity is decidable, a canonical event ordering within each batch,
//! and the exact branch structure of the collision solver.

#![deny(unsafe_code)]

pub mod detect;
pub mod event;
pub mod fixture;
pub mod moves;
pub mod resolve;
pub mod turn;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the world model for convenience.
pub use parsec_world;

/// Re-export the transcript crate for convenience.
pub use parsec_replay;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced when assembling a game.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The number of move providers does not match the map's player count.
    #[error("map expects {map_players} players but {providers} move providers were supplied")]
    ProviderCountMismatch {
        /// Players the map was created for.
        map_players: usize,
        /// Providers handed to the driver.
        providers: usize,
    },

    /// The number of player names does not match the map's player count.
    #[error("map expects {map_players} players but {names} player names were supplied")]
    NameCountMismatch {
        /// Players the map was created for.
        map_players: usize,
        /// Names handed to the driver.
        names: usize,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use parsec_replay::prelude::*;
    pub use parsec_world::prelude::*;

    pub use crate::moves::{MoveProvider, MoveQueue, MoveResponse, ScriptedProvider};
    pub use crate::turn::{GameOutcome, TurnLoop};
    pub use crate::EngineError;
}
