//! Data-driven game balance
//!
//! Defaults reproduce the reference game. Overrides can be loaded from JSON;
//! missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::tiers::TIER_COUNT;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("initial tier pool must be in 1..={max}, got {got}")]
    TierPool { got: u8, max: usize },
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

/// Timing and threshold knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Next piece offered this long after a drop (ms)
    pub drop_delay_ms: u64,
    /// Same, while continuous drop is on (ms)
    pub continuous_drop_delay_ms: u64,
    /// Repeat interval of the hold-to-drop loop (ms)
    pub continuous_interval_ms: u64,
    /// Settle check delay after a drop (ms)
    pub settle_delay_ms: u64,
    /// Resting pieces with `y` below this end the game
    pub ceiling_y: f32,
    /// `|velocity.y|` below this counts as resting
    pub rest_speed: f32,
    /// Spawn height of dropped pieces
    pub drop_y: f32,
    /// Initial pieces come from the first N tiers
    pub initial_tier_pool: u8,
    /// Also run settle checks on pieces produced by merges
    pub arm_merged_pieces: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            drop_delay_ms: DROP_DELAY_MS,
            continuous_drop_delay_ms: CONTINUOUS_DROP_DELAY_MS,
            continuous_interval_ms: CONTINUOUS_INTERVAL_MS,
            settle_delay_ms: SETTLE_DELAY_MS,
            ceiling_y: CEILING_Y,
            rest_speed: REST_SPEED,
            drop_y: DROP_Y,
            initial_tier_pool: INITIAL_TIER_POOL,
            arm_merged_pieces: false,
        }
    }
}

impl Tuning {
    /// Parse and validate overrides
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.initial_tier_pool == 0 || self.initial_tier_pool as usize > TIER_COUNT {
            return Err(TuningError::TierPool {
                got: self.initial_tier_pool,
                max: TIER_COUNT,
            });
        }
        // A zero interval would spin the hold-to-drop loop forever at one instant
        if self.continuous_interval_ms == 0 {
            return Err(TuningError::NotPositive("continuous_interval_ms"));
        }
        // NaN compares false both ways, so test for the valid range
        if !(self.rest_speed.is_finite() && self.rest_speed > 0.0) {
            return Err(TuningError::NotPositive("rest_speed"));
        }
        if !self.ceiling_y.is_finite() {
            return Err(TuningError::NotFinite("ceiling_y"));
        }
        if !self.drop_y.is_finite() {
            return Err(TuningError::NotFinite("drop_y"));
        }
        Ok(())
    }

    /// Delay before the next piece is offered
    pub fn next_drop_delay(&self, continuous: bool) -> u64 {
        if continuous {
            self.continuous_drop_delay_ms
        } else {
            self.drop_delay_ms
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.next_drop_delay(false), 1000);
        assert_eq!(tuning.next_drop_delay(true), 500);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{ "settle_delay_ms": 3000, "arm_merged_pieces": true }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.settle_delay_ms, 3000);
        assert!(tuning.arm_merged_pieces);
        assert_eq!(tuning.drop_delay_ms, DROP_DELAY_MS);
    }

    #[test]
    fn test_rejects_bad_pool() {
        let err = Tuning::from_json(r#"{ "initial_tier_pool": 11 }"#).unwrap_err();
        assert!(matches!(err, TuningError::TierPool { got: 11, .. }));
        assert!(Tuning::from_json(r#"{ "initial_tier_pool": 0 }"#).is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Tuning::from_json(r#"{ "continuous_interval_ms": 0 }"#).unwrap_err();
        assert_eq!(err.to_string(), "continuous_interval_ms must be positive");
    }

    #[test]
    fn test_rejects_non_finite_thresholds() {
        let nan_rest = Tuning {
            rest_speed: f32::NAN,
            ..Tuning::default()
        };
        assert!(matches!(
            nan_rest.validate(),
            Err(TuningError::NotPositive("rest_speed"))
        ));

        let nan_ceiling = Tuning {
            ceiling_y: f32::NAN,
            ..Tuning::default()
        };
        assert!(matches!(
            nan_ceiling.validate(),
            Err(TuningError::NotFinite("ceiling_y"))
        ));

        let far_spawn = Tuning {
            drop_y: f32::INFINITY,
            ..Tuning::default()
        };
        assert!(matches!(
            far_spawn.validate(),
            Err(TuningError::NotFinite("drop_y"))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Json(_))
        ));
    }
}
