//! Classification helpers for the interceptor and verification-replay
//! call sites.
//!
//! The interceptor passively classifies real traffic (operation id plus
//! confidence, no synthesis). Verification replay re-derives the match
//! for a previously recorded interaction — primarily for explainability
//! in reports — and validates the provider's actual response against the
//! owning handler's expectations; the comparison outcome feeds the
//! external verification-results collaborator.

use crate::matcher::OperationMatcher;
use crate::model::{UnifiedRequest, UnifiedResponse};
use crate::spec::ResponseValidation;
use serde::{Deserialize, Serialize};

/// Operation classification for one observed request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl Classification {
    pub fn is_classified(&self) -> bool {
        self.operation_id.is_some()
    }
}

/// Classify a request without synthesizing anything.
pub fn classify(matcher: &OperationMatcher<'_>, request: &UnifiedRequest) -> Classification {
    let result = matcher.match_request(request);
    match result.selected {
        Some(candidate) => Classification {
            operation_id: Some(candidate.operation.id),
            confidence: Some(candidate.confidence),
            reasons: candidate.reasons,
        },
        None => Classification::default(),
    }
}

/// Classification plus response validation for a replayed interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub classification: Classification,
    /// Absent when the interaction could not be classified; validation
    /// needs an operation to validate against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ResponseValidation>,
}

/// Re-derive the match for a recorded interaction and validate the
/// provider's actual response against the matched operation.
pub fn replay_report(
    matcher: &OperationMatcher<'_>,
    request: &UnifiedRequest,
    actual_response: &UnifiedResponse,
) -> ReplayReport {
    let result = matcher.match_request(request);
    let Some(candidate) = result.selected else {
        return ReplayReport {
            classification: Classification::default(),
            validation: None,
        };
    };

    let validation = matcher
        .handler()
        .map(|handler| handler.validate_response(&candidate.operation, actual_response, matcher.spec()));

    ReplayReport {
        classification: Classification {
            operation_id: Some(candidate.operation.id),
            confidence: Some(candidate.confidence),
            reasons: candidate.reasons,
        },
        validation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{RawDocument, SpecRegistry};
    use serde_json::json;

    fn matcher() -> OperationMatcher<'static> {
        let registry = SpecRegistry::global();
        let spec = registry
            .parse_spec(&RawDocument::from(json!({
                "openapi": "3.0.0",
                "paths": {
                    "/castles/{id}": {
                        "get": {
                            "operationId": "getCastle",
                            "responses": { "200": {} }
                        }
                    }
                }
            })))
            .unwrap();
        OperationMatcher::new(registry, spec)
    }

    #[test]
    fn test_classify_reports_operation_and_reasons() {
        let matcher = matcher();
        let classification = classify(&matcher, &UnifiedRequest::rest("GET", "/castles/42"));

        assert!(classification.is_classified());
        assert_eq!(classification.operation_id.as_deref(), Some("getCastle"));
        assert!(classification.confidence.unwrap() > 0.0);
        assert!(!classification.reasons.is_empty());
    }

    #[test]
    fn test_classify_unknown_traffic_is_empty() {
        let matcher = matcher();
        let classification = classify(&matcher, &UnifiedRequest::rest("POST", "/sieges"));
        assert!(!classification.is_classified());
        assert!(classification.confidence.is_none());
    }

    #[test]
    fn test_replay_report_validates_actual_response() {
        let matcher = matcher();
        let request = UnifiedRequest::rest("GET", "/castles/42");

        let declared = replay_report(&matcher, &request, &UnifiedResponse::ok(json!({"id": 42})));
        assert!(declared.validation.unwrap().valid);

        let undeclared = replay_report(
            &matcher,
            &request,
            &UnifiedResponse::with_status(503, json!({})),
        );
        assert!(!undeclared.validation.unwrap().valid);
    }

    #[test]
    fn test_replay_report_without_match_has_no_validation() {
        let matcher = matcher();
        let report = replay_report(
            &matcher,
            &UnifiedRequest::rest("GET", "/unknown"),
            &UnifiedResponse::ok(json!({})),
        );
        assert!(!report.classification.is_classified());
        assert!(report.validation.is_none());
    }
}
