//! Score accumulator
//!
//! `score` resets every session, `best` survives through a [`BestScoreStore`].
//! Neither ever goes down.

use serde::{Deserialize, Serialize};

use crate::persistence::BestScoreStore;

/// Outcome of awarding points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub score: u64,
    pub best: u64,
    /// `best` moved up with this award
    pub new_best: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u64,
    best: u64,
}

impl Scoreboard {
    pub fn new(best: u64) -> Self {
        Self { score: 0, best }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Award points, persisting a new best
    ///
    /// A failing store is logged and otherwise ignored; the in-memory best is
    /// still raised.
    pub fn add<S: BestScoreStore + ?Sized>(&mut self, points: u64, store: &mut S) -> ScoreUpdate {
        self.score = self.score.saturating_add(points);
        let new_best = self.score > self.best;
        if new_best {
            self.best = self.score;
            if let Err(e) = store.save_best_score(self.best) {
                log::warn!("Failed to save best score {}: {}", self.best, e);
            }
        }
        ScoreUpdate {
            score: self.score,
            best: self.best,
            new_best,
        }
    }

    /// Start a new session; the best score is kept unless storage knows a higher one
    pub fn reset(&mut self, stored_best: u64) {
        self.score = 0;
        self.best = self.best.max(stored_best);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    #[test]
    fn test_add_raises_best() {
        let mut store = MemoryStore::new();
        let mut board = Scoreboard::new(5);

        let update = board.add(4, &mut store);
        assert_eq!(update.score, 4);
        assert!(!update.new_best);
        assert_eq!(store.stored(), None);

        let update = board.add(4, &mut store);
        assert_eq!(update.score, 8);
        assert_eq!(update.best, 8);
        assert!(update.new_best);
        assert_eq!(store.stored(), Some(8));
    }

    #[test]
    fn test_equal_score_does_not_save() {
        let mut store = MemoryStore::new();
        let mut board = Scoreboard::new(4);
        board.add(4, &mut store);
        assert_eq!(store.saves, 0);
    }

    #[test]
    fn test_broken_store_still_tracks_best() {
        let mut store = MemoryStore::broken();
        let mut board = Scoreboard::new(0);
        let update = board.add(16, &mut store);
        assert!(update.new_best);
        assert_eq!(board.best(), 16);
    }

    #[test]
    fn test_reset_keeps_best() {
        let mut store = MemoryStore::new();
        let mut board = Scoreboard::new(0);
        board.add(32, &mut store);
        board.reset(10);
        assert_eq!(board.score(), 0);
        assert_eq!(board.best(), 32);
        board.reset(64);
        assert_eq!(board.best(), 64);
    }

    proptest! {
        #[test]
        fn prop_scores_never_decrease(
            awards in proptest::collection::vec(1u64..=1024, 0..64),
            best in 0u64..5000
        ) {
            let mut store = MemoryStore::new();
            let mut board = Scoreboard::new(best);
            let mut last = (board.score(), board.best());
            for points in awards {
                let update = board.add(points, &mut store);
                prop_assert!(update.score > last.0);
                prop_assert!(update.best >= last.1);
                prop_assert!(update.best >= update.score);
                last = (update.score, update.best);
            }
            if let Some(stored) = store.stored() {
                prop_assert_eq!(stored, board.best());
            }
        }
    }
}
