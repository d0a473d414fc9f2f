//! Simulation events and time quantization.
//!
//! A [`SimEvent`] is a detected interaction inside one micro-step's unit time
//! frame: an attack opportunity, a hull contact, or a map-edge desertion.
//! Event times are quantized to multiples of `1 / event_time_precision` at
//! detection, and two events are *simultaneous* exactly when their quantized
//! times are bitwise equal -- that is what makes batching decidable.
//!
//! The [`EventAccumulator`] deduplicates symmetric detections (ship A vs B
//! and B vs A are the same event) by keying on kind, the unordered id pair,
//! and the quantized time, and hands back events in a canonical total order.

use std::collections::HashSet;

use parsec_world::entity::EntityId;

// ---------------------------------------------------------------------------
// SimEventKind
// ---------------------------------------------------------------------------

/// What kind of interaction was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SimEventKind {
    /// Two enemy ships in weapon reach at the event time.
    Attack,
    /// Hull contact: ship-ship or ship-planet.
    Collision,
    /// A ship's projected path leaves the map this micro-step.
    Desertion,
}

// ---------------------------------------------------------------------------
// SimEvent
// ---------------------------------------------------------------------------

/// One detected interaction. `id1 <= id2` always (canonicalized on insert);
/// desertions carry the ship in both slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimEvent {
    /// Interaction kind.
    pub kind: SimEventKind,
    /// First endpoint (the smaller id).
    pub id1: EntityId,
    /// Second endpoint (the larger id).
    pub id2: EntityId,
    /// Quantized time within the micro-step, in `[0, 1]`.
    pub time: f64,
}

/// Round `t` to the quantization lattice `k / precision`.
pub fn round_event_time(t: f64, precision: u32) -> f64 {
    (t * precision as f64).round() / precision as f64
}

// ---------------------------------------------------------------------------
// EventAccumulator
// ---------------------------------------------------------------------------

/// Collects detections for one micro-step, deduplicating symmetric pairs.
#[derive(Debug)]
pub struct EventAccumulator {
    precision: u32,
    seen: HashSet<(SimEventKind, EntityId, EntityId, u64)>,
    events: Vec<SimEvent>,
}

impl EventAccumulator {
    /// An empty accumulator quantizing to `1 / precision`.
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            seen: HashSet::new(),
            events: Vec::new(),
        }
    }

    /// Record a detection at raw time `t`. Quantizes, canonicalizes the id
    /// pair, and drops the event if an identical one is already present.
    pub fn push(&mut self, kind: SimEventKind, id1: EntityId, id2: EntityId, t: f64) {
        let time = round_event_time(t, self.precision);
        let (a, b) = if id1 <= id2 { (id1, id2) } else { (id2, id1) };
        if self.seen.insert((kind, a, b, time.to_bits())) {
            self.events.push(SimEvent { kind, id1: a, id2: b, time });
        }
    }

    /// Number of distinct events collected so far.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The collected events in canonical order: ascending quantized time,
    /// then kind, then the id pair. The resolver batches runs of equal time
    /// off this ordering.
    pub fn into_events(self) -> Vec<SimEvent> {
        let mut events = self.events;
        events.sort_by(|a, b| {
            a.time
                .total_cmp(&b.time)
                .then(a.kind.cmp(&b.kind))
                .then(a.id1.cmp(&b.id1))
                .then(a.id2.cmp(&b.id2))
        });
        events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
