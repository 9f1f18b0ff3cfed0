//! Game-over detection
//!
//! Each dropped piece gets one delayed look: if by then it is resting above
//! the ceiling line, the game is over. This is a heuristic. A piece that keeps
//! bouncing above the line is never caught, and one that happens to be at the
//! top of its arc when the check fires is caught even though it would fall.

use super::timers::{Scheduler, TimerId, TimerTask};
use super::world::{BodyHandle, BodyState};
use crate::tuning::Tuning;

/// Queue the settle check for a freshly spawned piece
pub fn arm(scheduler: &mut Scheduler, handle: BodyHandle, tuning: &Tuning) -> TimerId {
    scheduler.schedule(tuning.settle_delay_ms, TimerTask::SettleCheck(handle))
}

/// Resting in the danger zone: above the ceiling with near-zero vertical speed
pub fn is_resting_above_ceiling(body: &BodyState, tuning: &Tuning) -> bool {
    body.position.y < tuning.ceiling_y && body.velocity.y.abs() < tuning.rest_speed
}

/// Result of a fired settle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleVerdict {
    /// Game already ended; the check is a no-op
    AlreadyOver,
    /// The piece was merged away before the check fired
    Gone,
    /// Piece is fine
    Safe,
    /// End the game
    GameOver,
}

/// Evaluate a settle check against the body's current state
pub fn evaluate(game_over: bool, body: Option<BodyState>, tuning: &Tuning) -> SettleVerdict {
    if game_over {
        return SettleVerdict::AlreadyOver;
    }
    match body {
        None => SettleVerdict::Gone,
        Some(body) if is_resting_above_ceiling(&body, tuning) => SettleVerdict::GameOver,
        Some(_) => SettleVerdict::Safe,
    }
}
