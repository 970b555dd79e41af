//! Main settings module

use std::collections::BTreeMap;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Reply classifier configuration
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Stale lead sweep configuration
    #[serde(default)]
    pub sweep: SweepSettings,

    /// Seed values for the scoring configuration
    #[serde(default)]
    pub scoring: ScoringDefaults,
}

/// LLM-backed reply classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Use the LLM backend; rules-only when false
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key (set via LEADFLOW__CLASSIFIER__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Hard deadline for one classification call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Reply characters included in the prompt
    #[serde(default = "default_prompt_reply_chars")]
    pub prompt_reply_chars: usize,
}

fn default_endpoint() -> String {
    "http://localhost:11434/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_prompt_reply_chars() -> usize {
    1500
}
fn default_true() -> bool {
    true
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
            prompt_reply_chars: default_prompt_reply_chars(),
        }
    }
}

/// Stale lead sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Days in EMAIL_SENT before a lead is marked NO_RESPONSE
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
}

fn default_stale_after_days() -> i64 {
    14
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
        }
    }
}

/// Seed weights and thresholds used when no scoring config row exists yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringDefaults {
    #[serde(default = "default_weight_urgency")]
    pub weight_urgency: f64,
    #[serde(default = "default_weight_budget")]
    pub weight_budget: f64,
    #[serde(default = "default_weight_company_size")]
    pub weight_company_size: f64,
    #[serde(default = "default_weight_pain_point")]
    pub weight_pain_point: f64,
    #[serde(default = "default_weight_job_title")]
    pub weight_job_title: f64,
    #[serde(default = "default_weight_industry")]
    pub weight_industry: f64,
    #[serde(default = "default_weight_source")]
    pub weight_source: f64,

    /// Scores at or above this are hot
    #[serde(default = "default_hot_threshold")]
    pub hot_threshold: f64,

    /// Scores at or above this (and below hot) are warm
    #[serde(default = "default_warm_threshold")]
    pub warm_threshold: f64,
}

fn default_weight_urgency() -> f64 {
    0.25
}
fn default_weight_budget() -> f64 {
    0.20
}
fn default_weight_company_size() -> f64 {
    0.15
}
fn default_weight_pain_point() -> f64 {
    0.15
}
fn default_weight_job_title() -> f64 {
    0.10
}
fn default_weight_industry() -> f64 {
    0.10
}
fn default_weight_source() -> f64 {
    0.05
}
fn default_hot_threshold() -> f64 {
    70.0
}
fn default_warm_threshold() -> f64 {
    40.0
}

impl Default for ScoringDefaults {
    fn default() -> Self {
        Self {
            weight_urgency: default_weight_urgency(),
            weight_budget: default_weight_budget(),
            weight_company_size: default_weight_company_size(),
            weight_pain_point: default_weight_pain_point(),
            weight_job_title: default_weight_job_title(),
            weight_industry: default_weight_industry(),
            weight_source: default_weight_source(),
            hot_threshold: default_hot_threshold(),
            warm_threshold: default_warm_threshold(),
        }
    }
}

impl ScoringDefaults {
    /// Seed weights keyed by factor name
    pub fn as_weights(&self) -> BTreeMap<String, f64> {
        let mut weights = BTreeMap::new();
        weights.insert("urgency".to_string(), self.weight_urgency);
        weights.insert("budget".to_string(), self.weight_budget);
        weights.insert("company_size".to_string(), self.weight_company_size);
        weights.insert("pain_point".to_string(), self.weight_pain_point);
        weights.insert("job_title".to_string(), self.weight_job_title);
        weights.insert("industry".to_string(), self.weight_industry);
        weights.insert("source".to_string(), self.weight_source);
        weights
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_classifier()?;
        self.validate_sweep()?;
        self.validate_scoring()?;
        Ok(())
    }

    fn validate_classifier(&self) -> Result<(), ConfigError> {
        let classifier = &self.classifier;

        if classifier.enabled && classifier.endpoint.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "classifier.endpoint".to_string(),
                message: "Endpoint is required when the classifier is enabled".to_string(),
            });
        }

        if classifier.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "classifier.timeout_ms".to_string(),
                message: "Timeout must be at least 1ms".to_string(),
            });
        }

        if classifier.timeout_ms > 120_000 {
            return Err(ConfigError::InvalidValue {
                field: "classifier.timeout_ms".to_string(),
                message: format!("Timeout too high (maximum 120000ms), got {}", classifier.timeout_ms),
            });
        }

        if classifier.prompt_reply_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "classifier.prompt_reply_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if classifier.enabled
            && classifier.api_key.is_none()
            && !classifier.endpoint.starts_with("http://localhost")
            && !classifier.endpoint.starts_with("http://127.0.0.1")
        {
            tracing::warn!(
                "Classifier is enabled against a remote endpoint without an API key. \
                 Requests may be rejected."
            );
        }

        Ok(())
    }

    fn validate_sweep(&self) -> Result<(), ConfigError> {
        if self.sweep.stale_after_days < 1 {
            return Err(ConfigError::InvalidValue {
                field: "sweep.stale_after_days".to_string(),
                message: format!("Must be at least 1, got {}", self.sweep.stale_after_days),
            });
        }
        Ok(())
    }

    fn validate_scoring(&self) -> Result<(), ConfigError> {
        let scoring = &self.scoring;

        for (name, weight) in scoring.as_weights() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::InvalidValue {
                    field: format!("scoring.weight_{}", name),
                    message: format!("Must be between 0.0 and 1.0, got {}", weight),
                });
            }
        }

        let total: f64 = scoring.as_weights().values().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ConfigError::InvalidValue {
                field: "scoring".to_string(),
                message: format!("Weights must sum to 1.0, got {}", total),
            });
        }

        if !(0.0..=100.0).contains(&scoring.hot_threshold)
            || !(0.0..=100.0).contains(&scoring.warm_threshold)
        {
            return Err(ConfigError::InvalidValue {
                field: "scoring".to_string(),
                message: "Thresholds must be between 0 and 100".to_string(),
            });
        }

        if scoring.warm_threshold >= scoring.hot_threshold {
            return Err(ConfigError::InvalidValue {
                field: "scoring.warm_threshold".to_string(),
                message: format!(
                    "Must be below hot_threshold ({}), got {}",
                    scoring.hot_threshold, scoring.warm_threshold
                ),
            });
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (LEADFLOW_ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LEADFLOW")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
