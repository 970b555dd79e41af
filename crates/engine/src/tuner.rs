//! Adaptive scoring weight tuner
//!
//! Not ML. When a closed outcome contradicts the score the lead carried,
//! every weight is nudged by an EMA-smoothed 5% of its own value, floored
//! at the minimum weight, then the set is renormalized to sum to 1.0. Each
//! adjustment lands as a new versioned config row; rows are never edited.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use leadflow_config::ScoringDefaults;
use leadflow_core::{
    LeadOutcome, Result, ScoreThresholds, ScoringConfigRecord, ScoringConfigStore, ThresholdPatch,
    MIN_WEIGHT,
};

/// Smoothing factor for weight adjustments
const EMA_ALPHA: f64 = 0.1;

/// Fraction of a weight's own value used as the raw adjustment
const ADJUSTMENT_RATE: f64 = 0.05;

pub struct WeightTuner {
    configs: Arc<dyn ScoringConfigStore>,
    defaults: ScoringDefaults,
}

impl WeightTuner {
    pub fn new(configs: Arc<dyn ScoringConfigStore>, defaults: ScoringDefaults) -> Self {
        Self { configs, defaults }
    }

    /// The active config row, seeding the defaults if none exists yet
    pub async fn get_config(&self) -> Result<ScoringConfigRecord> {
        if let Some(config) = self.configs.latest().await? {
            return Ok(config);
        }

        let seeded = ScoringConfigRecord::new(
            self.defaults.as_weights(),
            ScoreThresholds {
                hot: self.defaults.hot_threshold,
                warm: self.defaults.warm_threshold,
            },
            "system",
        );
        self.configs.create(seeded.clone()).await?;
        info!(config_id = %seeded.id, "Seeded default scoring config");
        Ok(seeded)
    }

    /// Merge updates into the active config as a new versioned row
    ///
    /// Both weights and thresholds merge key-wise: anything not named in
    /// the update keeps its current value.
    pub async fn update_config(
        &self,
        weights: Option<BTreeMap<String, f64>>,
        thresholds: Option<ThresholdPatch>,
        user: &str,
    ) -> Result<ScoringConfigRecord> {
        let current = self.get_config().await?;

        let mut new_weights = current.weights.clone();
        if let Some(updates) = weights {
            new_weights.extend(updates);
        }
        let new_thresholds = match thresholds {
            Some(patch) => current.thresholds.patched(&patch),
            None => current.thresholds,
        };

        let new_config = ScoringConfigRecord::new(new_weights, new_thresholds, user);
        self.configs.create(new_config.clone()).await?;

        info!(config_id = %new_config.id, user = user, "Scoring config updated");
        Ok(new_config)
    }

    /// Adjust weights when a closed outcome contradicts the lead's score
    ///
    /// A positive outcome on a cold lead (score below warm) raises every
    /// weight; a negative outcome on a hot lead (score at or above hot)
    /// lowers them. Aligned outcomes leave the config untouched and return
    /// the current row.
    pub async fn update_from_feedback(
        &self,
        outcome: LeadOutcome,
        lead_score: i32,
    ) -> Result<ScoringConfigRecord> {
        info!(outcome = %outcome, score = lead_score, "Processing feedback for weight adjustment");

        let current = self.get_config().await?;
        let score = lead_score as f64;
        let score_was_low = score < current.thresholds.warm;
        let score_was_high = score >= current.thresholds.hot;

        let mut weights = current.weights.clone();

        let adjusted = if outcome.is_positive() && score_was_low {
            info!("Positive outcome with low score, increasing weights");
            for weight in weights.values_mut() {
                *weight += EMA_ALPHA * (*weight * ADJUSTMENT_RATE);
            }
            true
        } else if outcome.is_negative() && score_was_high {
            info!("Negative outcome with high score, decreasing weights");
            for weight in weights.values_mut() {
                *weight -= EMA_ALPHA * (*weight * ADJUSTMENT_RATE);
                *weight = weight.max(MIN_WEIGHT);
            }
            true
        } else {
            false
        };

        if !adjusted {
            info!("No weight adjustment needed, score aligned with outcome");
            return Ok(current);
        }

        let total: f64 = weights.values().sum();
        if total > 0.0 {
            for weight in weights.values_mut() {
                *weight /= total;
            }
        }

        self.update_config(Some(weights), None, "learning_system")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_store::InMemoryScoringConfigStore;

    fn tuner() -> (WeightTuner, Arc<InMemoryScoringConfigStore>) {
        let store = Arc::new(InMemoryScoringConfigStore::new());
        (
            WeightTuner::new(store.clone(), ScoringDefaults::default()),
            store,
        )
    }

    #[tokio::test]
    async fn test_seeds_defaults_once() {
        let (tuner, store) = tuner();
        let first = tuner.get_config().await.unwrap();
        let second = tuner.get_config().await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.row_count(), 1);
        assert!((first.weight_total() - 1.0).abs() < 1e-6);
        assert_eq!(first.thresholds.hot, 70.0);
    }

    #[tokio::test]
    async fn test_positive_outcome_low_score_adjusts() {
        let (tuner, store) = tuner();
        let before = tuner.get_config().await.unwrap();

        let after = tuner
            .update_from_feedback(LeadOutcome::ClosedWon, 25)
            .await
            .unwrap();

        assert_ne!(after.id, before.id);
        assert_eq!(after.updated_by, "learning_system");
        assert!((after.weight_total() - 1.0).abs() < 1e-6);
        assert!(after.weights.values().all(|w| *w >= MIN_WEIGHT));
        assert_eq!(store.row_count(), 2);
    }

    #[tokio::test]
    async fn test_negative_outcome_high_score_adjusts() {
        let (tuner, _) = tuner();
        let before = tuner.get_config().await.unwrap();

        let after = tuner
            .update_from_feedback(LeadOutcome::ClosedLost, 85)
            .await
            .unwrap();

        assert_ne!(after.id, before.id);
        assert!((after.weight_total() - 1.0).abs() < 1e-6);
        assert!(after.weights.values().all(|w| *w >= MIN_WEIGHT));
    }

    #[tokio::test]
    async fn test_aligned_outcome_is_noop() {
        let (tuner, store) = tuner();
        let before = tuner.get_config().await.unwrap();

        // Hot score that closed won: prediction was right
        let after = tuner
            .update_from_feedback(LeadOutcome::ClosedWon, 90)
            .await
            .unwrap();
        assert_eq!(after.id, before.id);

        // Cold score that went nowhere: also right
        let after = tuner
            .update_from_feedback(LeadOutcome::NoResponse, 10)
            .await
            .unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_floor_binds_on_tiny_weight() {
        let (tuner, store) = tuner();

        let mut weights = BTreeMap::new();
        weights.insert("urgency".to_string(), 0.99);
        weights.insert("source".to_string(), 0.01);
        store
            .create(ScoringConfigRecord::new(
                weights,
                ScoreThresholds::default(),
                "admin",
            ))
            .await
            .unwrap();

        let after = tuner
            .update_from_feedback(LeadOutcome::Disqualified, 95)
            .await
            .unwrap();

        // The floored weight kept its minimum before normalization, so the
        // distribution shifts slightly toward it
        assert!((after.weight_total() - 1.0).abs() < 1e-6);
        assert!(after.weights["source"] >= MIN_WEIGHT);
        assert!(after.weights["source"] > 0.01);
    }

    #[tokio::test]
    async fn test_update_config_merges() {
        let (tuner, _) = tuner();
        tuner.get_config().await.unwrap();

        let mut updates = BTreeMap::new();
        updates.insert("urgency".to_string(), 0.30);
        let updated = tuner
            .update_config(Some(updates), None, "admin")
            .await
            .unwrap();

        assert_eq!(updated.updated_by, "admin");
        assert!((updated.weights["urgency"] - 0.30).abs() < 1e-9);
        // Untouched keys carried over
        assert!((updated.weights["budget"] - 0.20).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_update_config_patches_one_threshold() {
        let (tuner, _) = tuner();
        tuner.get_config().await.unwrap();

        let updated = tuner
            .update_config(
                None,
                Some(ThresholdPatch {
                    hot: Some(75.0),
                    warm: None,
                }),
                "admin",
            )
            .await
            .unwrap();

        assert_eq!(updated.thresholds.hot, 75.0);
        // warm keeps its current value without being re-supplied
        assert_eq!(updated.thresholds.warm, 40.0);
    }
}
