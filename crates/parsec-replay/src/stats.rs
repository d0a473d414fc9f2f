//! End-of-game statistics.
//!
//! Filled in by the turn driver when the game ends and embedded in the replay
//! document's stats block.

use serde::{Deserialize, Serialize};

use parsec_world::entity::PlayerId;

// ---------------------------------------------------------------------------
// PlayerStatistics
// ---------------------------------------------------------------------------

/// Per-player outcome summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatistics {
    /// Final placement, 1 = best.
    pub rank: u32,
    /// The last turn on which this player still had a ship.
    pub last_frame_alive: u64,
    /// Milliseconds the player took to answer the initialization request,
    /// or `None` if they timed out there.
    pub init_response_time: Option<u64>,
    /// Mean per-turn move-retrieval time in milliseconds, over the turns the
    /// player answered.
    pub avg_frame_response_time: f64,
    /// Ships this player fielded over the whole game (initial plus spawned).
    pub total_ship_count: u64,
    /// Total attack damage budget this player committed (full
    /// `weapon_damage` per target engaged).
    pub damage_dealt: u64,
}

// ---------------------------------------------------------------------------
// GameStatistics
// ---------------------------------------------------------------------------

/// The replay document's stats block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Per-player summaries, indexed by [`PlayerId`].
    pub players: Vec<PlayerStatistics>,
    /// Players removed for timing out, ascending.
    pub timeout_tags: Vec<PlayerId>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize_round_trip() {
        let stats = GameStatistics {
            players: vec![
                PlayerStatistics {
                    rank: 1,
                    last_frame_alive: 120,
                    init_response_time: Some(35),
                    avg_frame_response_time: 12.25,
                    total_ship_count: 40,
                    damage_dealt: 4096,
                },
                PlayerStatistics {
                    rank: 2,
                    last_frame_alive: 98,
                    init_response_time: None,
                    avg_frame_response_time: 0.0,
                    total_ship_count: 3,
                    damage_dealt: 0,
                },
            ],
            timeout_tags: vec![1],
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: GameStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }
}
