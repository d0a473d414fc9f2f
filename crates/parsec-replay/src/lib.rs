//! Transcript recording for the parsec turn engine.
//!
//! The turn driver feeds this crate a per-turn stream of map snapshots, game
//! events, and applied moves; the [`Transcript`](transcript::Transcript)
//! captures them verbatim and can assemble the full replay document as JSON.
//! Compression and any further packaging belong to the external serializer;
//! the JSON layout is owned here.
//!
//! [`snapshot::state_hash`] gives a BLAKE3 digest of a map snapshot, which is
//! how the test suites assert bitwise determinism between runs.

#![deny(unsafe_code)]

pub mod event;
pub mod snapshot;
pub mod stats;
pub mod transcript;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by transcript serialization.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The replay document could not be serialized.
    #[error("failed to serialize replay document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The replay file could not be written.
    #[error("failed to write replay file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::event::GameEvent;
    pub use crate::snapshot::state_hash;
    pub use crate::stats::{GameStatistics, PlayerStatistics};
    pub use crate::transcript::{ReplayHeader, Transcript};
    pub use crate::ReplayError;
}
