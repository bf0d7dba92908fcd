//! Fixture types and scoring result shapes.
//!
//! A fixture is a stored example request/response pair satisfying one
//! operation. Pools are supplied per call by the owner (server-side store
//! or a locally supplied array) and are never mutated by the engine;
//! scoring is a pure read.

use crate::model::UnifiedRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Who observed the interaction a fixture was built from. Encodes trust:
/// provider-asserted fixtures outrank hand-authored ones, which outrank
/// consumer-captured ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureSource {
    Consumer,
    Provider,
    Manual,
}

impl FixtureSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureSource::Consumer => "consumer",
            FixtureSource::Provider => "provider",
            FixtureSource::Manual => "manual",
        }
    }
}

/// Fixture lifecycle status. The engine carries this as data; pool
/// filtering by status is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    Draft,
    #[default]
    Approved,
    Archived,
}

/// The originating request a fixture recorded, used for specificity
/// scoring against the incoming request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FixtureRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl From<&UnifiedRequest> for FixtureRequest {
    fn from(request: &UnifiedRequest) -> Self {
        Self {
            method: request.method.clone(),
            path: request.path.clone(),
            query: request.query.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        }
    }
}

/// The stored response a selected fixture replays.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FixtureResponse {
    /// Absent status defaults to 200 at adaptation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Fixture payload: optional originating request, the response to replay,
/// and optional provider-state data.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FixtureData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<FixtureRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<FixtureResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

/// A stored, approved (or draft) example interaction for one operation.
///
/// `operation` must equal an operation id in the spec it is scored
/// against, but the scorer does not validate membership: callers
/// pre-filter by exact id equality, so mismatched fixtures are silently
/// never selected rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: String,
    /// Id of the operation this fixture satisfies.
    pub operation: String,
    pub source: FixtureSource,
    /// Author-assigned ranking weight.
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub status: FixtureStatus,
    #[serde(default)]
    pub data: FixtureData,
}

impl Fixture {
    pub fn new(id: impl Into<String>, operation: impl Into<String>, source: FixtureSource) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
            source,
            priority: 0,
            status: FixtureStatus::Approved,
            data: FixtureData::default(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: FixtureStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_response(mut self, response: FixtureResponse) -> Self {
        self.data.response = Some(response);
        self
    }

    pub fn with_request(mut self, request: FixtureRequest) -> Self {
        self.data.request = Some(request);
        self
    }
}

/// Specificity bonus components, present only when the fixture stores its
/// own originating request and at least one bonus applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpecificityBonus {
    /// +path bonus: stored request path equals incoming path exactly.
    pub path: f64,
    /// +body bonus: stored body, serialized, is byte-identical.
    pub body: f64,
    /// +query bonus: incoming query keys are a subset of stored keys.
    pub query: f64,
}

impl SpecificityBonus {
    pub fn total(&self) -> f64 {
        self.path + self.body + self.query
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0.0
    }
}

/// Per-fixture score explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureScoreBreakdown {
    pub fixture_id: String,
    /// Starting score; zero for the default scorer, handler overrides may
    /// seed it.
    pub base: f64,
    /// `priority × priority_factor`
    pub priority_score: f64,
    pub source_bias: f64,
    /// Absent when no alignment bonus applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specificity: Option<SpecificityBonus>,
    pub total: f64,
    pub reasons: Vec<String>,
}

/// Outcome of scoring a fixture pool. `ordered` holds every scored
/// fixture best-first; `selected` is its head, absent when the filtered
/// pool was empty.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FixtureSelectionResult {
    pub ordered: Vec<FixtureScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<FixtureScoreBreakdown>,
}

impl FixtureSelectionResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_builder_defaults() {
        let fixture = Fixture::new("fx-1", "getOrder", FixtureSource::Manual);
        assert_eq!(fixture.priority, 0);
        assert_eq!(fixture.status, FixtureStatus::Approved);
        assert!(fixture.data.request.is_none());
        assert!(fixture.data.response.is_none());
    }

    #[test]
    fn test_specificity_zero_detection() {
        assert!(SpecificityBonus::default().is_zero());
        let bonus = SpecificityBonus {
            path: 10.0,
            body: 0.0,
            query: 0.0,
        };
        assert!(!bonus.is_zero());
        assert_eq!(bonus.total(), 10.0);
    }

    #[test]
    fn test_fixture_request_from_unified() {
        let request = UnifiedRequest::rest("GET", "/orders/42").with_query("expand", "items");
        let stored = FixtureRequest::from(&request);
        assert_eq!(stored.method.as_deref(), Some("GET"));
        assert_eq!(stored.path.as_deref(), Some("/orders/42"));
        assert_eq!(stored.query.get("expand").map(String::as_str), Some("items"));
    }

    #[test]
    fn test_source_serde_is_lowercase() {
        let json = serde_json::to_string(&FixtureSource::Provider).unwrap();
        assert_eq!(json, "\"provider\"");
    }
}
