//! Specification and operation value types.

use serde::{Deserialize, Serialize};

/// Supported specification formats. Closed set: exactly these three
/// variants are registered and no dynamic registration exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecType {
    OpenApi,
    GraphQl,
    AsyncApi,
}

impl SpecType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecType::OpenApi => "openapi",
            SpecType::GraphQl => "graphql",
            SpecType::AsyncApi => "asyncapi",
        }
    }
}

impl std::fmt::Display for SpecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed specification. `spec_type` is fixed at parse time and
/// determines which handler processes the document; it is never
/// re-detected per call.
///
/// For the graph variant `document` is either an SDL string
/// (`Value::String`) or an introspection object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpec {
    #[serde(rename = "type")]
    pub spec_type: SpecType,
    pub document: serde_json::Value,
}

/// One addressable capability described by a specification, flattened by
/// the owning handler. Only the fields relevant to the variant are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOperation {
    /// Stable handler-chosen id: REST uses `operationId` or a
    /// method+path derivation, graph uses `Kind.fieldName`, event uses
    /// `channel:direction`.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Graph operation kind: "query", "mutation", or "subscription"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Event direction: "publish" or "subscribe"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Declared message type for event operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

impl ApiOperation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: None,
            path: None,
            operation_type: None,
            channel: None,
            direction: None,
            message_type: None,
        }
    }
}

/// One candidate operation for a request, with a relative confidence and
/// the reasons that produced it. Confidence scales are handler-defined and
/// only comparable within a single match call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMatchCandidate {
    pub operation: ApiOperation,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

/// Outcome of one match call. `selected` absent is the normal
/// "no operation identified" business outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationMatchResult {
    /// All considered candidates, best-first.
    pub candidates: Vec<OperationMatchCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<OperationMatchCandidate>,
}

impl OperationMatchResult {
    /// The empty result: no candidates, nothing selected.
    pub fn unmatched() -> Self {
        Self::default()
    }

    /// Build a result from candidates, sorting best-first and selecting
    /// the top. The sort is stable so equal-confidence candidates keep
    /// their handler-produced order.
    pub fn from_candidates(mut candidates: Vec<OperationMatchCandidate>) -> Self {
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let selected = candidates.first().cloned();
        Self {
            candidates,
            selected,
        }
    }
}
