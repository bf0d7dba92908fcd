//! Specification handling: the per-format capability contract and its
//! three built-in variants.
//!
//! Each variant (REST, graph, event) implements the same capability set
//! behind [`SpecHandler`]: sniff a raw document, parse it into a typed
//! spec, flatten it into operations, match requests against those
//! operations, synthesize responses, and validate actual responses.

pub mod event;
pub mod graph;
pub mod registry;
pub mod rest;

pub use event::EventHandler;
pub use graph::GraphHandler;
pub use registry::SpecRegistry;
pub use rest::RestHandler;

use crate::config::ScoringWeights;
use crate::error::EngineError;
use crate::model::{
    ApiOperation, ApiSpec, Fixture, FixtureSelectionResult, OperationMatchCandidate,
    OperationMatchResult, SpecType, UnifiedRequest, UnifiedResponse,
};
use serde::{Deserialize, Serialize};

/// A raw specification document as handed over by the spec-storage
/// collaborator: either unparsed text (JSON, YAML, or SDL) or an already
/// parsed JSON value (document object or introspection result).
#[derive(Debug, Clone)]
pub enum RawDocument {
    Text(String),
    Value(serde_json::Value),
}

impl RawDocument {
    /// Parse text as JSON first, then YAML; already parsed values pass
    /// through. `None` for text that is neither.
    pub fn to_value(&self) -> Option<serde_json::Value> {
        match self {
            RawDocument::Value(value) => Some(value.clone()),
            RawDocument::Text(text) => serde_json::from_str(text)
                .ok()
                .or_else(|| serde_yaml::from_str(text).ok()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawDocument::Text(text) => Some(text),
            RawDocument::Value(serde_json::Value::String(text)) => Some(text),
            RawDocument::Value(_) => None,
        }
    }
}

impl From<serde_json::Value> for RawDocument {
    fn from(value: serde_json::Value) -> Self {
        RawDocument::Value(value)
    }
}

impl From<&str> for RawDocument {
    fn from(text: &str) -> Self {
        RawDocument::Text(text.to_string())
    }
}

/// Inputs to one match call.
pub struct MatchContext<'a> {
    pub request: &'a UnifiedRequest,
    pub operations: &'a [ApiOperation],
    pub spec_type: SpecType,
}

/// Inputs to response synthesis. `fixture_selection` carries the scored
/// pool so format-specific synthesis can still use partial fixture data
/// even when the router adapted nothing directly.
pub struct SynthesisParams<'a> {
    pub operation: &'a ApiOperation,
    pub fixtures: &'a [Fixture],
    pub request: &'a UnifiedRequest,
    pub match_candidate: &'a OperationMatchCandidate,
    pub fixture_selection: Option<&'a FixtureSelectionResult>,
    pub spec: &'a ApiSpec,
}

/// Outcome of validating an actual response against an operation's
/// declared expectations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResponseValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ResponseValidation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: vec![],
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// Per-format capability bundle. All operations are synchronous and pure;
/// matching never fails for a well-formed request — an empty candidate
/// list is the "no plausible operation" outcome.
pub trait SpecHandler: Send + Sync {
    fn spec_type(&self) -> SpecType;

    /// Format-sniffing predicate used only by registry auto-detection.
    fn can_handle(&self, raw: &RawDocument) -> bool;

    /// Total for any input that passed `can_handle`; `None` for input
    /// that looks like the format but is not fully parseable. Callers
    /// treat an absent result as "unsupported", not a fatal error.
    fn parse_spec(&self, raw: &RawDocument) -> Option<ApiSpec>;

    /// Deterministic, order-stable, side-effect-free. Empty specs yield
    /// an empty list, never an error.
    fn extract_operations(&self, spec: &ApiSpec) -> Vec<ApiOperation>;

    fn match_operation(&self, ctx: &MatchContext<'_>) -> OperationMatchResult;

    /// Synthesize a response when no fixture was adapted directly.
    fn generate_response(
        &self,
        params: &SynthesisParams<'_>,
    ) -> Result<UnifiedResponse, EngineError>;

    /// Variant-specific fixture scoring. `None` means the default scorer
    /// applies.
    fn score_fixtures(
        &self,
        _fixtures: &[Fixture],
        _request: &UnifiedRequest,
        _candidate: &OperationMatchCandidate,
        _weights: &ScoringWeights,
    ) -> Option<FixtureSelectionResult> {
        None
    }

    /// Validate an actual response against the operation's declared
    /// expectations. Total over any operation this handler extracted.
    fn validate_response(
        &self,
        operation: &ApiOperation,
        response: &UnifiedResponse,
        spec: &ApiSpec,
    ) -> ResponseValidation;

    /// Deterministic schema-shaped example data for an operation. Total;
    /// falls back to `null` when the spec declares nothing usable.
    fn generate_mock_data(&self, operation: &ApiOperation, spec: &ApiSpec) -> serde_json::Value;
}
