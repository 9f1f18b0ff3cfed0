//! Hooks for whatever draws the game
//!
//! Calls are fire-and-forget: the rules never wait on them or read anything
//! back. `LogPresentation` writes them to the log for headless runs.

use glam::Vec2;

use crate::sim::tiers::{TierSpec, Visual};

pub trait Presentation {
    /// The hanging piece the player is aiming
    fn show_pending_preview(&mut self, tier: &TierSpec);

    /// Hanging piece moved to container-local `x`
    fn move_pending_preview(&mut self, x: f32);

    /// Hanging piece was dropped
    fn clear_pending_preview(&mut self);

    /// The piece after the hanging one
    fn show_next_preview(&mut self, tier: &TierSpec);

    /// Burst at a merge point, coloured after the new tier
    fn show_fusion_effect(&mut self, position: Vec2, visual: &Visual);

    fn update_score_display(&mut self, score: u64, best: u64);

    fn show_game_over(&mut self, score: u64);

    /// Startup failed; the only error the player ever sees
    fn show_fatal_notice(&mut self, message: &str);
}

/// Writes every presentation call to the log
#[derive(Debug, Default)]
pub struct LogPresentation;

impl Presentation for LogPresentation {
    fn show_pending_preview(&mut self, tier: &TierSpec) {
        log::debug!("Hanging {} (r={})", tier.tier, tier.radius);
    }

    fn move_pending_preview(&mut self, x: f32) {
        log::trace!("Hanging piece at x={:.1}", x);
    }

    fn clear_pending_preview(&mut self) {
        log::trace!("Hanging piece released");
    }

    fn show_next_preview(&mut self, tier: &TierSpec) {
        log::debug!("Next up: {}", tier.tier);
    }

    fn show_fusion_effect(&mut self, position: Vec2, visual: &Visual) {
        log::debug!(
            "Fusion at ({:.1}, {:.1}) {}",
            position.x,
            position.y,
            visual.color_hex()
        );
    }

    fn update_score_display(&mut self, score: u64, best: u64) {
        log::info!("Score {} (best {})", score, best);
    }

    fn show_game_over(&mut self, score: u64) {
        log::info!("GAME OVER - final score {}", score);
    }

    fn show_fatal_notice(&mut self, message: &str) {
        log::error!("{}", message);
    }
}
