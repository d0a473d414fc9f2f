//! The game transcript: everything the external replay serializer consumes.
//!
//! The driver appends, per turn, one map snapshot, one bucket of
//! [`GameEvent`]s, and one applied-moves record per player per micro-step.
//! Buckets for a turn are opened with [`Transcript::begin_turn`] *before* the
//! turn runs, and the snapshot lands with [`Transcript::record_frame`] after
//! movement settles, so a recorded game of `T` turns holds `T + 1` snapshots
//! (index 0 is the initial state) and `T` event/move buckets.
//!
//! The transcript does not interpret anything it records. It can assemble the
//! complete replay document as JSON ([`Transcript::to_json`]) and write it to
//! disk; compression is the external serializer's concern.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use parsec_world::config::GameConstants;
use parsec_world::entity::{Planet, PlayerId};
use parsec_world::map::GameMap;
use parsec_world::moves::Move;

use crate::event::GameEvent;
use crate::stats::GameStatistics;
use crate::ReplayError;

// ---------------------------------------------------------------------------
// ReplayHeader
// ---------------------------------------------------------------------------

/// Game-constant metadata at the head of the replay document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayHeader {
    /// Replay document format version.
    pub version: u32,
    /// Seed the map was generated from.
    pub seed: u64,
    /// Name of the generator that produced the initial placement.
    pub map_generator: String,
    /// Map width.
    pub width: f64,
    /// Map height.
    pub height: f64,
    /// Display names, indexed by [`PlayerId`].
    pub player_names: Vec<String>,
    /// The tuning constants the game ran with.
    pub constants: GameConstants,
    /// The planets as initially placed, in index order.
    pub planets_initial: Vec<Planet>,
    /// Points of interest for the viewer. Opaque to the engine.
    pub poi: Value,
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Byte-reproducible record of one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    header: ReplayHeader,
    /// Map snapshots. Index 0 is the initial state; index `t` is the state
    /// after turn `t`.
    frames: Vec<GameMap>,
    /// Event buckets, one per turn.
    frame_events: Vec<Vec<GameEvent>>,
    /// Applied moves, `[turn][player][micro_step] -> moves`.
    moves: Vec<Vec<Vec<Vec<Move>>>>,
    stats: Option<GameStatistics>,
}

impl Transcript {
    /// Start a transcript with the initial map state as frame 0.
    pub fn new(header: ReplayHeader, initial_map: GameMap) -> Self {
        Self {
            header,
            frames: vec![initial_map],
            frame_events: Vec::new(),
            moves: Vec::new(),
            stats: None,
        }
    }

    // -- recording ----------------------------------------------------------

    /// Open the event and moves buckets for the next turn.
    pub fn begin_turn(&mut self, num_players: usize, max_queued_moves: usize) {
        self.frame_events.push(Vec::new());
        self.moves
            .push(vec![vec![Vec::new(); max_queued_moves]; num_players]);
    }

    /// Append an event to the current turn's bucket.
    pub fn record_event(&mut self, event: GameEvent) {
        self.current_events_mut().push(event);
    }

    /// The current turn's event bucket. The resolver borrows this directly
    /// so it can record deaths while it owns the map mutably.
    ///
    /// # Panics
    ///
    /// Panics if no turn is open (`begin_turn` was never called).
    pub fn current_events_mut(&mut self) -> &mut Vec<GameEvent> {
        self.frame_events
            .last_mut()
            .unwrap_or_else(|| panic!("no open turn: call begin_turn before recording"))
    }

    /// Record the moves applied for `player` during `micro_step` of the
    /// current turn.
    ///
    /// # Panics
    ///
    /// Panics if no turn is open or `micro_step` exceeds the bucket opened by
    /// [`begin_turn`](Self::begin_turn).
    pub fn record_moves(&mut self, player: PlayerId, micro_step: usize, moves: Vec<Move>) {
        let turn = self
            .moves
            .last_mut()
            .unwrap_or_else(|| panic!("no open turn: call begin_turn before recording"));
        turn[player][micro_step] = moves;
    }

    /// Append the end-of-turn map snapshot.
    pub fn record_frame(&mut self, map: GameMap) {
        self.frames.push(map);
    }

    /// Attach the end-of-game stats block.
    pub fn set_stats(&mut self, stats: GameStatistics) {
        self.stats = Some(stats);
    }

    // -- access -------------------------------------------------------------

    /// The header block.
    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    /// All map snapshots, initial state first.
    pub fn frames(&self) -> &[GameMap] {
        &self.frames
    }

    /// Number of recorded turns.
    pub fn num_turns(&self) -> usize {
        self.frame_events.len()
    }

    /// Event bucket for a turn (0-based).
    pub fn events(&self, turn: usize) -> &[GameEvent] {
        &self.frame_events[turn]
    }

    /// Applied-moves record for a turn (0-based): `[player][micro_step]`.
    pub fn moves(&self, turn: usize) -> &[Vec<Vec<Move>>] {
        &self.moves[turn]
    }

    /// The stats block, once the game has ended.
    pub fn stats(&self) -> Option<&GameStatistics> {
        self.stats.as_ref()
    }

    // -- emission -----------------------------------------------------------

    /// Assemble the complete replay document.
    pub fn to_json(&self) -> Result<Value, ReplayError> {
        let events: Vec<Value> = self
            .frame_events
            .iter()
            .map(|bucket| Value::Array(bucket.iter().map(GameEvent::to_json).collect()))
            .collect();
        Ok(json!({
            "version": self.header.version,
            "seed": self.header.seed,
            "map_generator": self.header.map_generator,
            "width": self.header.width,
            "height": self.header.height,
            "num_players": self.header.player_names.len(),
            "player_names": self.header.player_names,
            "constants": serde_json::to_value(&self.header.constants)?,
            "planets": serde_json::to_value(&self.header.planets_initial)?,
            "poi": self.header.poi,
            "num_frames": self.frames.len(),
            "frames": serde_json::to_value(&self.frames)?,
            "events": events,
            "moves": serde_json::to_value(&self.moves)?,
            "stats": serde_json::to_value(&self.stats)?,
        }))
    }

    /// Write the replay document to `path` as JSON.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ReplayError> {
        let document = self.to_json()?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &document)?;
        writer.flush()?;
        debug!(path = %path.display(), turns = self.num_turns(), "replay written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
