//! Session state
//!
//! Everything the rules decide on lives here. One instance per session, owned
//! by [`MonsterGame`](super::game::MonsterGame).

use serde::{Deserialize, Serialize};

use super::score::Scoreboard;
use super::tiers::{Tier, TierSpec};

/// The hanging piece, not yet part of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingDrop {
    pub tier: Tier,
    /// Container-local x, already clamped for this tier's radius
    pub target_x: f32,
}

impl PendingDrop {
    pub fn spec(&self) -> &'static TierSpec {
        self.tier.spec()
    }
}

/// Complete rules state (serializable for snapshots)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Score and best score
    pub scoreboard: Scoreboard,
    /// A drop was committed and its replacement is not ready yet
    pub drop_in_flight: bool,
    /// Holding the pointer keeps dropping
    pub continuous_mode: bool,
    /// Terminal; never goes back to false within a session
    pub game_over: bool,
    /// Pointer is currently pressed
    pub pointer_held: bool,
    /// Music (and sound effects) switched on
    pub music_enabled: bool,
    /// Piece the player is aiming, if any
    pub pending: Option<PendingDrop>,
    /// Piece offered after the pending one
    pub next_tier: Tier,
    /// Pieces dropped this session
    pub drops: u32,
    /// Merges resolved this session
    pub merges: u32,
}

impl GameState {
    /// Fresh session state; no piece is hanging until the first `prepare_next`
    pub fn new(seed: u64, next_tier: Tier, best_score: u64) -> Self {
        Self {
            seed,
            scoreboard: Scoreboard::new(best_score),
            drop_in_flight: false,
            continuous_mode: false,
            game_over: false,
            pointer_held: false,
            music_enabled: true,
            pending: None,
            next_tier,
            drops: 0,
            merges: 0,
        }
    }

    pub fn score(&self) -> u64 {
        self.scoreboard.score()
    }

    pub fn best_score(&self) -> u64 {
        self.scoreboard.best()
    }

    /// A drop would be accepted right now
    pub fn can_drop(&self) -> bool {
        !self.game_over && !self.drop_in_flight && self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = GameState::new(7, Tier::FIRST, 99);
        assert_eq!(state.score(), 0);
        assert_eq!(state.best_score(), 99);
        assert!(state.pending.is_none());
        assert!(!state.can_drop());
    }

    #[test]
    fn test_can_drop() {
        let mut state = GameState::new(7, Tier::FIRST, 0);
        state.pending = Some(PendingDrop {
            tier: Tier::FIRST,
            target_x: 200.0,
        });
        assert!(state.can_drop());
        state.drop_in_flight = true;
        assert!(!state.can_drop());
        state.drop_in_flight = false;
        state.game_over = true;
        assert!(!state.can_drop());
    }

    #[test]
    fn test_snapshot_json() {
        let state = GameState::new(7, Tier::new(3).unwrap(), 10);
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.next_tier.rank(), 3);
        assert_eq!(back.best_score(), 10);
    }
}
