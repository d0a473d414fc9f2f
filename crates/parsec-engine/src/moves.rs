//! Move queues, the provider contract, and the parallel retrieval step.
//!
//! [`MoveProvider`] is the entire interface to the networking collaborator:
//! one provider per player, each answering an initialization request and then
//! one move-retrieval request per turn with either an elapsed-time reading or
//! a timeout. The engine never parses protocol text; providers deliver
//! already-structured [`Move`]s.
//!
//! Retrieval is the simulation's single concurrency point. One worker thread
//! per living player fans out, the driver joins on *all* of them before any
//! world state is touched, and the joined results are then consumed in
//! ascending player order -- so scheduling jitter can never leak into the
//! simulation. Workers only see a shared snapshot of the map.

use std::collections::{BTreeMap, VecDeque};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::warn;

use parsec_world::entity::{PlayerId, ShipIndex};
use parsec_world::map::GameMap;
use parsec_world::moves::Move;

// ---------------------------------------------------------------------------
// MoveQueue
// ---------------------------------------------------------------------------

/// One player's queued moves for one turn: `max_queued_moves` micro-step
/// entries, each mapping ship index to that ship's command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveQueue {
    steps: Vec<BTreeMap<ShipIndex, Move>>,
}

impl MoveQueue {
    /// An empty queue with `max_queued_moves` micro-step slots.
    pub fn new(max_queued_moves: usize) -> Self {
        Self {
            steps: vec![BTreeMap::new(); max_queued_moves],
        }
    }

    /// Queue `mv` for micro-step `step`. Ship-less moves (`Noop`, `Error`)
    /// are dropped here; steps without an entry for a ship mean "no command".
    ///
    /// # Panics
    ///
    /// Panics if `step` is out of range for this queue.
    pub fn insert(&mut self, step: usize, mv: Move) {
        if let Some(ship) = mv.ship() {
            self.steps[step].insert(ship, mv);
        }
    }

    /// The moves queued for micro-step `step`, if the slot exists.
    pub fn step(&self, step: usize) -> Option<&BTreeMap<ShipIndex, Move>> {
        self.steps.get(step)
    }

    /// Number of micro-step slots.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the queue has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MoveResponse
// ---------------------------------------------------------------------------

/// What a provider returns for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveResponse {
    /// Wall-clock milliseconds the player took, or `None` on timeout.
    /// A timeout kills the player.
    pub elapsed_ms: Option<u64>,
    /// The player's queued moves. Ignored on timeout.
    pub queue: MoveQueue,
}

impl MoveResponse {
    /// The timeout sentinel.
    pub fn timeout() -> Self {
        Self {
            elapsed_ms: None,
            queue: MoveQueue::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// MoveProvider
// ---------------------------------------------------------------------------

/// The contract with the networking collaborator: deliver one player's move
/// queue for a turn and report how long the player took, or time out.
///
/// Providers are driven from worker threads (one per living player, all
/// joined before the world mutates), so implementations must be `Send`. A
/// provider that panics is treated exactly like a timeout.
pub trait MoveProvider: Send {
    /// Answer the pre-game initialization request. The default is an
    /// instantaneous success, which suits in-process bots.
    fn initialize(&mut self, player: PlayerId, map: &GameMap) -> Option<u64> {
        let _ = (player, map);
        Some(0)
    }

    /// Produce this player's move queue for the current turn.
    fn moves_for_turn(&mut self, player: PlayerId, map: &GameMap) -> MoveResponse;
}

// ---------------------------------------------------------------------------
// Parallel fan-out
// ---------------------------------------------------------------------------

/// Run `f` against every included provider on its own worker thread and join
/// all of them. `out[p]` is `None` for players not included or whose worker
/// panicked; results are collected in player order after the join, so callers
/// observe a deterministic sequence regardless of thread scheduling.
fn fan_out<R, F>(
    providers: &mut [Box<dyn MoveProvider>],
    include: &[bool],
    f: F,
) -> Vec<Option<R>>
where
    R: Send,
    F: Fn(PlayerId, &mut dyn MoveProvider) -> R + Sync,
{
    let mut out: Vec<Option<R>> = Vec::new();
    out.resize_with(providers.len(), || None);

    thread::scope(|scope| {
        let f = &f;
        let mut handles = Vec::new();
        for (player, provider) in providers.iter_mut().enumerate() {
            if !include.get(player).copied().unwrap_or(false) {
                continue;
            }
            handles.push((player, scope.spawn(move || f(player, provider.as_mut()))));
        }
        for (player, handle) in handles {
            match handle.join() {
                Ok(result) => out[player] = Some(result),
                Err(_) => warn!(player, "move provider panicked; treating as timeout"),
            }
        }
    });

    out
}

/// Dispatch the per-turn move request to every living player in parallel and
/// block until all have answered. `None` entries are players that were not
/// asked (already dead) or whose provider panicked.
pub fn retrieve_all_moves(
    providers: &mut [Box<dyn MoveProvider>],
    living: &[bool],
    map: &GameMap,
) -> Vec<Option<MoveResponse>> {
    fan_out(providers, living, |player, provider| {
        provider.moves_for_turn(player, map)
    })
}

/// Dispatch the pre-game initialization request to every player in parallel.
/// Inner `None` means the player timed out during initialization.
pub fn initialize_all(
    providers: &mut [Box<dyn MoveProvider>],
    living: &[bool],
    map: &GameMap,
) -> Vec<Option<Option<u64>>> {
    fan_out(providers, living, |player, provider| {
        provider.initialize(player, map)
    })
}

// ---------------------------------------------------------------------------
// ScriptedProvider
// ---------------------------------------------------------------------------

/// A provider that plays back a pre-recorded queue per turn. Turns beyond the
/// script answer with an empty queue. Used by tests and scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    turns: VecDeque<MoveQueue>,
    elapsed_ms: u64,
}

impl ScriptedProvider {
    /// A script answering each turn with the next queue in `turns`.
    pub fn new(turns: Vec<MoveQueue>) -> Self {
        Self {
            turns: turns.into(),
            elapsed_ms: 1,
        }
    }

    /// Override the reported response time.
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }
}

impl MoveProvider for ScriptedProvider {
    fn moves_for_turn(&mut self, _player: PlayerId, _map: &GameMap) -> MoveResponse {
        MoveResponse {
            elapsed_ms: Some(self.elapsed_ms),
            queue: self.turns.pop_front().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
