//! Versioned scoring configuration

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Floor applied to any weight after a downward adjustment
pub const MIN_WEIGHT: f64 = 0.01;

/// Hot/warm score cut points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub hot: f64,
    pub warm: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            hot: 70.0,
            warm: 40.0,
        }
    }
}

impl ScoreThresholds {
    /// Apply a partial update; unset fields keep their current value
    pub fn patched(&self, patch: &ThresholdPatch) -> ScoreThresholds {
        ScoreThresholds {
            hot: patch.hot.unwrap_or(self.hot),
            warm: patch.warm.unwrap_or(self.warm),
        }
    }
}

/// Field-wise threshold update for config changes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThresholdPatch {
    pub hot: Option<f64>,
    pub warm: Option<f64>,
}

/// One immutable row of scoring configuration
///
/// Every update creates a new row; "current" is the most recently created
/// one. Weights use a BTreeMap so adjustment and normalization iterate in
/// a deterministic order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfigRecord {
    pub id: Uuid,
    pub weights: BTreeMap<String, f64>,
    pub thresholds: ScoreThresholds,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
}

impl ScoringConfigRecord {
    pub fn new(
        weights: BTreeMap<String, f64>,
        thresholds: ScoreThresholds,
        updated_by: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            weights,
            thresholds,
            updated_by: updated_by.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn weight_total(&self) -> f64 {
        self.weights.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_default() {
        let t = ScoreThresholds::default();
        assert_eq!(t.hot, 70.0);
        assert_eq!(t.warm, 40.0);
    }

    #[test]
    fn test_threshold_patch_keeps_unset_fields() {
        let current = ScoreThresholds::default();
        let patched = current.patched(&ThresholdPatch {
            hot: Some(80.0),
            warm: None,
        });
        assert_eq!(patched.hot, 80.0);
        assert_eq!(patched.warm, 40.0);

        let untouched = current.patched(&ThresholdPatch::default());
        assert_eq!(untouched.hot, current.hot);
        assert_eq!(untouched.warm, current.warm);
    }

    #[test]
    fn test_weight_total() {
        let mut weights = BTreeMap::new();
        weights.insert("urgency".to_string(), 0.6);
        weights.insert("budget".to_string(), 0.4);
        let record = ScoringConfigRecord::new(weights, ScoreThresholds::default(), "tester");
        assert!((record.weight_total() - 1.0).abs() < 1e-9);
    }
}
