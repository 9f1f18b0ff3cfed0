//! Monster Drop - A drop-and-merge puzzle game
//!
//! Core modules:
//! - `sim`: Game rules layered on an external physics engine (tiers, drops, merges, game over)
//! - `platform`: Logging backends and input mapping
//! - `persistence`: Best score storage
//! - `presentation`: Fire-and-forget hooks for whatever draws the game
//! - `audio`: Sound effects and background music
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod persistence;
pub mod platform;
pub mod presentation;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fallback container size when the host reports a zero-sized container
    pub const DEFAULT_CONTAINER_WIDTH: f32 = 400.0;
    pub const DEFAULT_CONTAINER_HEIGHT: f32 = 600.0;

    /// Thickness of the invisible ground and side walls
    pub const WALL_THICKNESS: f32 = 60.0;

    /// Height at which dropped pieces enter the world
    pub const DROP_Y: f32 = 0.0;

    /// Delay before the next piece is offered after a drop (ms)
    pub const DROP_DELAY_MS: u64 = 1000;
    /// Same delay while continuous drop is enabled (ms)
    pub const CONTINUOUS_DROP_DELAY_MS: u64 = 500;
    /// Repeat interval of the continuous-drop timer (ms)
    pub const CONTINUOUS_INTERVAL_MS: u64 = 500;

    /// Settle check: delay after a drop before the piece is inspected (ms)
    pub const SETTLE_DELAY_MS: u64 = 2000;
    /// Settle check: pieces resting above this line end the game
    pub const CEILING_Y: f32 = 50.0;
    /// Settle check: vertical speed below which a piece counts as resting
    pub const REST_SPEED: f32 = 0.1;

    /// Initial pieces are drawn from the first N tiers
    pub const INITIAL_TIER_POOL: u8 = 5;

    /// Material of dropped pieces (merged pieces use engine defaults)
    pub const DROP_RESTITUTION: f32 = 0.4;
    pub const DROP_FRICTION: f32 = 0.1;

    /// Storage key of the persisted best score
    pub const BEST_SCORE_KEY: &str = "monster-best-score";
}

/// Clamp a horizontal position so a circle of `radius` stays inside `[0, width]`
#[inline]
pub fn clamp_to_container(x: f32, radius: f32, width: f32) -> f32 {
    let min_x = radius;
    let max_x = width - radius;
    // Pieces wider than the container pin to the left edge instead of panicking in clamp()
    if max_x < min_x {
        return min_x;
    }
    x.clamp(min_x, max_x)
}
