//! BLAKE3 hashing of simulation state.
//!
//! [`state_hash`] digests a serialized map snapshot. Ship storage is ordered
//! (`BTreeMap`) and struct fields serialize in declaration order, so equal
//! states produce equal bytes and equal hashes -- which is exactly what the
//! determinism suites compare between runs.

use parsec_world::map::GameMap;

use crate::transcript::Transcript;
use crate::ReplayError;

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest of a map snapshot.
pub fn state_hash(map: &GameMap) -> Result<String, ReplayError> {
    let bytes = serde_json::to_vec(map)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// BLAKE3 hex digest of a transcript's full replay document.
pub fn document_hash(transcript: &Transcript) -> Result<String, ReplayError> {
    let document = transcript.to_json()?;
    let bytes = serde_json::to_vec(&document)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
