//! Data-driven game balance
//!
//! Everything a designer might tweak without touching simulation code: the
//! tier ladder, spawn weights, board geometry and timings. Loaded from JSON,
//! with every field optional and falling back to the shipped defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating tuning data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("tuning is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tier table needs at least 2 tiers, found {0}")]
    TooFewTiers(usize),
    #[error("tier {index} has invalid radius {radius}")]
    InvalidRadius { index: usize, radius: f32 },
    #[error("{table} spawn weights have {actual} entries, expected {expected} (plus an optional terminal entry)")]
    WeightLength {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{table} spawn weight {index} is {weight}; weights must be finite and non-negative")]
    InvalidWeight {
        table: &'static str,
        index: usize,
        weight: f64,
    },
    #[error("board is too small: {width}x{height}")]
    InvalidBoard { width: f32, height: f32 },
}

/// One rung of the evolution ladder as written in tuning data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDef {
    pub name: String,
    pub radius: f32,
    /// Points awarded when two pieces of the previous tier fuse into this one
    pub score: u64,
    /// Display colour, opaque to the simulation
    #[serde(default)]
    pub color: String,
}

impl TierDef {
    fn new(name: &str, radius: f32, score: u64, color: &str) -> Self {
        Self {
            name: name.to_string(),
            radius,
            score,
            color: color.to_string(),
        }
    }
}

/// Board geometry. y grows downward; the ceiling sensor sits near the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardTuning {
    pub width: f32,
    pub height: f32,
    pub ceiling_y: f32,
    pub ceiling_thickness: f32,
    pub spawn_above_ceiling: f32,
    pub wall_margin: f32,
    pub pointer_margin: f32,
    pub wall_thickness: f32,
    pub floor_y: f32,
}

impl Default for BoardTuning {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            ceiling_y: CEILING_Y,
            ceiling_thickness: CEILING_THICKNESS,
            spawn_above_ceiling: SPAWN_ABOVE_CEILING,
            wall_margin: WALL_MARGIN,
            pointer_margin: POINTER_MARGIN,
            wall_thickness: WALL_THICKNESS,
            floor_y: FLOOR_Y,
        }
    }
}

impl BoardTuning {
    /// Height at which new falling pieces appear
    pub fn spawn_y(&self) -> f32 {
        self.ceiling_y - self.spawn_above_ceiling
    }
}

/// Surface properties handed to the physics engine when creating bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub air_friction: f32,
}

impl Material {
    pub const PIECE: Material = Material {
        restitution: 0.35,
        friction: 0.01,
        air_friction: 0.002,
    };

    pub const FLOOR: Material = Material {
        restitution: 0.2,
        friction: 0.4,
        air_friction: 0.0,
    };

    pub const WALL: Material = Material {
        restitution: 0.0,
        friction: 0.1,
        air_friction: 0.0,
    };
}

/// Timing windows, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingTuning {
    pub spawn_grace_ms: u64,
    pub merge_cooldown_ms: u64,
    pub drop_settle_ms: u64,
}

impl Default for TimingTuning {
    fn default() -> Self {
        Self {
            spawn_grace_ms: SPAWN_GRACE_MS,
            merge_cooldown_ms: MERGE_COOLDOWN_MS,
            drop_settle_ms: DROP_SETTLE_MS,
        }
    }
}

impl TimingTuning {
    pub fn spawn_grace(&self) -> Duration {
        Duration::from_millis(self.spawn_grace_ms)
    }

    pub fn merge_cooldown(&self) -> Duration {
        Duration::from_millis(self.merge_cooldown_ms)
    }

    pub fn drop_settle(&self) -> Duration {
        Duration::from_millis(self.drop_settle_ms)
    }
}

/// Complete balance sheet for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub tiers: Vec<TierDef>,
    pub early_weights: Vec<f64>,
    pub late_weights: Vec<f64>,
    /// Late weights apply once the score is strictly above this
    pub late_game_score: u64,
    pub terminal_bonus_multiplier: u64,
    pub board: BoardTuning,
    pub timing: TimingTuning,
    pub piece_material: Material,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierDef::new("Cell", 16.0, 1, "#63e0ff"),
                TierDef::new("Fish", 20.0, 3, "#4fd28f"),
                TierDef::new("Reptile", 24.0, 6, "#b0e643"),
                TierDef::new("Monkey", 30.0, 10, "#ffb347"),
                TierDef::new("Human", 34.0, 15, "#ff7aa2"),
                TierDef::new("Cyborg", 40.0, 25, "#7a7bff"),
                TierDef::new("Superhuman", 46.0, 40, "#ff6df2"),
                TierDef::new("Godlike", 54.0, 100, "#f8f36b"),
            ],
            early_weights: vec![6.0, 3.0, 2.0, 0.5, 0.2, 0.0, 0.0, 0.0],
            late_weights: vec![2.0, 3.0, 3.0, 1.5, 1.0, 0.5, 0.2, 0.0],
            late_game_score: LATE_GAME_SCORE,
            terminal_bonus_multiplier: TERMINAL_BONUS_MULTIPLIER,
            board: BoardTuning::default(),
            timing: TimingTuning::default(),
            piece_material: Material::PIECE,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file on disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!(
            "Loaded tuning from {} ({} tiers)",
            path.display(),
            tuning.tiers.len()
        );
        Ok(tuning)
    }

    /// Reject tables the simulation cannot run with.
    ///
    /// An all-zero weight vector is accepted here: the spawn selector recovers
    /// from it at draw time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.tiers.len();
        if count < 2 {
            return Err(ConfigError::TooFewTiers(count));
        }
        for (index, tier) in self.tiers.iter().enumerate() {
            if !tier.radius.is_finite() || tier.radius <= 0.0 {
                return Err(ConfigError::InvalidRadius {
                    index,
                    radius: tier.radius,
                });
            }
        }
        check_weights("early", &self.early_weights, count)?;
        check_weights("late", &self.late_weights, count)?;

        let board = &self.board;
        if !(board.width > 0.0 && board.height > 0.0 && board.floor_y > board.ceiling_y) {
            return Err(ConfigError::InvalidBoard {
                width: board.width,
                height: board.height,
            });
        }
        Ok(())
    }
}

fn check_weights(table: &'static str, weights: &[f64], tier_count: usize) -> Result<(), ConfigError> {
    let expected = tier_count - 1;
    if weights.len() != expected && weights.len() != tier_count {
        return Err(ConfigError::WeightLength {
            table,
            expected,
            actual: weights.len(),
        });
    }
    for (index, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                table,
                index,
                weight,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.tiers.len(), 8);
        assert_eq!(tuning.tiers[7].name, "Godlike");
        assert_eq!(tuning.board.spawn_y(), 40.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let tuning = Tuning::from_json(r#"{ "late_game_score": 500, "timing": { "drop_settle_ms": 280 } }"#)
            .unwrap();
        assert_eq!(tuning.late_game_score, 500);
        assert_eq!(tuning.timing.drop_settle_ms, 280);
        assert_eq!(tuning.timing.spawn_grace_ms, SPAWN_GRACE_MS);
        assert_eq!(tuning.tiers.len(), 8);
    }

    #[test]
    fn test_single_tier_rejected() {
        let json = r#"{
            "tiers": [{ "name": "Only", "radius": 10.0, "score": 1 }],
            "early_weights": [],
            "late_weights": []
        }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(ConfigError::TooFewTiers(1))
        ));
    }

    #[test]
    fn test_weight_length_mismatch_rejected() {
        let mut tuning = Tuning::default();
        tuning.early_weights = vec![1.0, 2.0];
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::WeightLength { table: "early", expected: 7, actual: 2 })
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut tuning = Tuning::default();
        tuning.late_weights[2] = -1.0;
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::InvalidWeight { table: "late", index: 2, .. })
        ));
    }

    #[test]
    fn test_weights_without_terminal_entry_accepted() {
        let mut tuning = Tuning::default();
        tuning.early_weights.pop();
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_zero_weights_accepted() {
        let mut tuning = Tuning::default();
        tuning.early_weights = vec![0.0; 8];
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(ConfigError::Json(_))));
    }
}
