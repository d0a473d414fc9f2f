//! Player move records.
//!
//! A [`Move`] is the smallest unit of player intent. The engine does not
//! parse anything: the networking collaborator delivers already-structured
//! moves, and anything malformed arrives as [`Move::Error`] (ignored, like
//! [`Move::Noop`]). Thrust magnitude and angle are integers in game units --
//! whole units of acceleration and whole degrees.

use serde::{Deserialize, Serialize};

use crate::entity::{PlanetIndex, ShipIndex};

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// One command for one ship (or no command at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    /// No command.
    Noop,
    /// Accelerate by `thrust` along `angle` (integer degrees).
    Thrust {
        /// The commanded ship.
        ship: ShipIndex,
        /// Acceleration magnitude, whole game units.
        thrust: i32,
        /// Heading in whole degrees.
        angle: i32,
    },
    /// Begin docking to a planet.
    Dock {
        /// The commanded ship.
        ship: ShipIndex,
        /// Docking target.
        planet: PlanetIndex,
    },
    /// Begin undocking from the current planet.
    Undock {
        /// The commanded ship.
        ship: ShipIndex,
    },
    /// A malformed command, delivered as-is by the networking layer and
    /// ignored by the engine.
    Error,
}

impl Move {
    /// The ship this move addresses, if any.
    pub fn ship(&self) -> Option<ShipIndex> {
        match self {
            Move::Thrust { ship, .. } | Move::Dock { ship, .. } | Move::Undock { ship } => {
                Some(*ship)
            }
            Move::Noop | Move::Error => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ship_accessor_covers_all_variants() {
        assert_eq!(Move::Noop.ship(), None);
        assert_eq!(Move::Error.ship(), None);
        assert_eq!(Move::Thrust { ship: 3, thrust: 7, angle: 90 }.ship(), Some(3));
        assert_eq!(Move::Dock { ship: 1, planet: 0 }.ship(), Some(1));
        assert_eq!(Move::Undock { ship: 2 }.ship(), Some(2));
    }

    #[test]
    fn moves_serialize_round_trip() {
        let moves = vec![
            Move::Noop,
            Move::Thrust { ship: 0, thrust: 7, angle: 180 },
            Move::Dock { ship: 1, planet: 2 },
            Move::Undock { ship: 1 },
            Move::Error,
        ];
        let json = serde_json::to_string(&moves).unwrap();
        let back: Vec<Move> = serde_json::from_str(&json).unwrap();
        assert_eq!(moves, back);
    }
}
