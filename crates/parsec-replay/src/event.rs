//! Game events recorded into the transcript.
//!
//! [`GameEvent`] is a tagged variant with a single [`to_json`] dispatch --
//! there is no event trait object anywhere. Variants carry exactly the fields
//! the replay document needs; the recorder never interprets them.
//!
//! [`to_json`]: GameEvent::to_json

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use parsec_world::entity::EntityId;
use parsec_world::geom::Location;

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// One recorded occurrence within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An entity died. `location` is where it died (for ships: position
    /// advanced by `velocity * time`, the event's quantized time).
    Destroyed {
        /// The dead entity.
        entity: EntityId,
        /// Position at death.
        location: Location,
        /// The entity's collision radius.
        radius: f64,
        /// Quantized micro-step time of death.
        time: f64,
    },
    /// A ship fired on one or more targets in the same event batch.
    Attack {
        /// The firing ship.
        attacker: EntityId,
        /// Attacker position at the event time.
        location: Location,
        /// Quantized micro-step time of the attack.
        time: f64,
        /// Targets hit, parallel to `target_locations`.
        targets: Vec<EntityId>,
        /// Target positions at the event time, parallel to `targets`.
        target_locations: Vec<Location>,
    },
    /// A planet's accumulated production spawned a ship.
    Spawn {
        /// The new ship.
        ship: EntityId,
        /// Where it appeared.
        location: Location,
        /// Center of the producing planet.
        planet_location: Location,
    },
}

impl GameEvent {
    /// Serialize into the replay document's event object.
    pub fn to_json(&self) -> Value {
        match self {
            GameEvent::Destroyed { entity, location, radius, time } => json!({
                "event": "destroyed",
                "entity": entity_json(*entity),
                "x": location.x,
                "y": location.y,
                "radius": radius,
                "time": time,
            }),
            GameEvent::Attack { attacker, location, time, targets, target_locations } => json!({
                "event": "attack",
                "entity": entity_json(*attacker),
                "x": location.x,
                "y": location.y,
                "time": time,
                "targets": targets.iter().map(|t| entity_json(*t)).collect::<Vec<_>>(),
                "target_locations": target_locations
                    .iter()
                    .map(|l| json!([l.x, l.y]))
                    .collect::<Vec<_>>(),
            }),
            GameEvent::Spawn { ship, location, planet_location } => json!({
                "event": "spawned",
                "entity": entity_json(*ship),
                "x": location.x,
                "y": location.y,
                "planet_x": planet_location.x,
                "planet_y": planet_location.y,
            }),
        }
    }
}

/// The replay document's entity-reference object.
fn entity_json(id: EntityId) -> Value {
    match id {
        EntityId::Invalid => json!({ "type": "invalid" }),
        EntityId::Ship { player, ship } => json!({
            "type": "ship",
            "owner": player,
            "id": ship,
        }),
        EntityId::Planet(index) => json!({
            "type": "planet",
            "id": index,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
