//! Engine configuration.
//!
//! Deserializable from YAML or JSON. Every field has a serde default so an
//! empty document yields the stock engine.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub session: SessionConfig,
}

impl EngineConfig {
    /// Parse from a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// Fixture scoring weights.
///
/// The stock values encode relative-ordering intent (provider-observed
/// beats hand-authored beats consumer-captured; priority can outrank
/// source bias) and are preserved for behavioral compatibility. They are
/// policy, not law — tune per deployment if the ordering intent changes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    #[serde(default = "default_provider_bias")]
    pub provider_bias: f64,
    #[serde(default = "default_manual_bias")]
    pub manual_bias: f64,
    #[serde(default = "default_consumer_bias")]
    pub consumer_bias: f64,
    /// Multiplier applied to the author-assigned fixture priority.
    #[serde(default = "default_priority_factor")]
    pub priority_factor: f64,
    /// Bonus when the stored request path equals the incoming path.
    #[serde(default = "default_path_bonus")]
    pub path_bonus: f64,
    /// Bonus when the stored body serializes byte-identically.
    #[serde(default = "default_body_bonus")]
    pub body_bonus: f64,
    /// Bonus when incoming query keys are a subset of stored keys.
    #[serde(default = "default_query_bonus")]
    pub query_bonus: f64,
}

fn default_provider_bias() -> f64 {
    30.0
}

fn default_manual_bias() -> f64 {
    20.0
}

fn default_consumer_bias() -> f64 {
    10.0
}

fn default_priority_factor() -> f64 {
    5.0
}

fn default_path_bonus() -> f64 {
    10.0
}

fn default_body_bonus() -> f64 {
    10.0
}

fn default_query_bonus() -> f64 {
    5.0
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            provider_bias: default_provider_bias(),
            manual_bias: default_manual_bias(),
            consumer_bias: default_consumer_bias(),
            priority_factor: default_priority_factor(),
            path_bonus: default_path_bonus(),
            body_bonus: default_body_bonus(),
            query_bonus: default_query_bonus(),
        }
    }
}

/// Recording session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Pending interactions that trigger an automatic flush.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,
    /// Upload endpoint for the HTTP sink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_flush_threshold() -> usize {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flush_threshold: default_flush_threshold(),
            endpoint: None,
        }
    }
}
