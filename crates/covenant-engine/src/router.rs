//! Request routing: match → score → synthesize-or-fallback.
//!
//! The router is the component every caller actually invokes. It is a
//! pure function of its inputs per call; the fixture pool is treated as
//! an immutable snapshot for the duration of one `handle` call. All
//! failures on the scoring/synthesis path are recovered here — nothing
//! propagates to the transport.

use crate::config::ScoringWeights;
use crate::matcher::OperationMatcher;
use crate::metrics;
use crate::model::{
    Fixture, FixtureSelectionResult, OperationMatchCandidate, OperationMatchResult,
    UnifiedRequest, UnifiedResponse,
};
use crate::scorer;
use crate::spec::{SpecHandler, SynthesisParams};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The three effective states a caller experiences per request. The
/// recording policy keys off this: record always, collect fixtures only
/// for 2xx outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterDisposition {
    MatchedWithFixture,
    MatchedGenerated,
    Unmatched,
}

/// Everything one `handle` call produced.
#[derive(Debug, Clone)]
pub struct RouterOutcome {
    pub match_result: OperationMatchResult,
    pub fixture_selection: Option<FixtureSelectionResult>,
    pub response: UnifiedResponse,
    pub disposition: RouterDisposition,
}

pub struct RequestRouter<'a> {
    matcher: &'a OperationMatcher<'a>,
    fixtures: &'a [Fixture],
    weights: ScoringWeights,
}

impl<'a> RequestRouter<'a> {
    pub fn new(matcher: &'a OperationMatcher<'a>, fixtures: &'a [Fixture]) -> Self {
        Self {
            matcher,
            fixtures,
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Resolve one request: identify the operation, rank the fixture
    /// pool, and produce a response from the best fixture or from
    /// handler synthesis. An unmatched request is a normal business
    /// outcome (404-shaped response), never an error.
    pub fn handle(&self, request: &UnifiedRequest) -> RouterOutcome {
        let spec_type = self.matcher.spec().spec_type;
        let match_result = self.matcher.match_request(request);

        let Some(candidate) = match_result.selected.clone() else {
            metrics::record_match(spec_type.as_str(), false);
            return RouterOutcome {
                match_result,
                fixture_selection: None,
                response: not_found_response(),
                disposition: RouterDisposition::Unmatched,
            };
        };
        metrics::record_match(spec_type.as_str(), true);

        let Some(handler) = self.matcher.handler() else {
            // Matching produced a candidate, so the handler exists; kept
            // as a defensive degradation path.
            return RouterOutcome {
                match_result,
                fixture_selection: None,
                response: not_found_response(),
                disposition: RouterDisposition::Unmatched,
            };
        };

        let selection = self.score(handler, request, &candidate);
        metrics::record_fixture_selection(selection.selected.is_some());

        // Fixture-backed responses always win over synthesis when the
        // stored data carries a response body.
        if let Some(selected) = &selection.selected {
            match self.adapt_fixture(&selected.fixture_id) {
                Some(response) => {
                    return RouterOutcome {
                        match_result,
                        fixture_selection: Some(selection),
                        response,
                        disposition: RouterDisposition::MatchedWithFixture,
                    };
                }
                None => {
                    debug!(
                        fixture_id = %selected.fixture_id,
                        operation_id = %candidate.operation.id,
                        "selected fixture has no stored response body; falling back to synthesis"
                    );
                }
            }
        }

        let params = SynthesisParams {
            operation: &candidate.operation,
            fixtures: self.fixtures,
            request,
            match_candidate: &candidate,
            fixture_selection: Some(&selection),
            spec: self.matcher.spec(),
        };
        match handler.generate_response(&params) {
            Ok(response) => {
                metrics::record_synthesis(spec_type.as_str(), true);
                RouterOutcome {
                    match_result,
                    fixture_selection: Some(selection),
                    response,
                    disposition: RouterDisposition::MatchedGenerated,
                }
            }
            Err(error) => {
                metrics::record_synthesis(spec_type.as_str(), false);
                warn!(
                    operation_id = %candidate.operation.id,
                    %error,
                    "response synthesis failed; degrading to unmatched shape"
                );
                RouterOutcome {
                    match_result,
                    fixture_selection: Some(selection),
                    response: synthesis_error_response(),
                    disposition: RouterDisposition::Unmatched,
                }
            }
        }
    }

    /// Handler-supplied scoring when the variant overrides it, the
    /// default scorer otherwise.
    fn score(
        &self,
        handler: &dyn SpecHandler,
        request: &UnifiedRequest,
        candidate: &OperationMatchCandidate,
    ) -> FixtureSelectionResult {
        handler
            .score_fixtures(self.fixtures, request, candidate, &self.weights)
            .unwrap_or_else(|| {
                scorer::score_fixtures_default(self.fixtures, request, candidate, &self.weights)
            })
    }

    /// Adapt a selected fixture's stored response verbatim into the wire
    /// shape. `None` when the fixture stores no response body (malformed
    /// fixture data falls through to synthesis).
    fn adapt_fixture(&self, fixture_id: &str) -> Option<UnifiedResponse> {
        let fixture = self.fixtures.iter().find(|f| f.id == fixture_id)?;
        let stored = fixture.data.response.as_ref()?;
        let body = stored.body.clone()?;
        let status = stored.status.unwrap_or(200);
        Some(UnifiedResponse {
            status,
            headers: stored.headers.clone(),
            body,
            success: status < 400,
        })
    }
}

fn not_found_response() -> UnifiedResponse {
    UnifiedResponse::with_status(404, serde_json::json!({"error": "operation_not_found"}))
}

fn synthesis_error_response() -> UnifiedResponse {
    UnifiedResponse::with_status(404, serde_json::json!({"error": "internal_synthesis_error"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiSpec, FixtureResponse, FixtureSource, SpecType};
    use crate::spec::{RawDocument, SpecRegistry};
    use serde_json::json;

    fn registry() -> &'static SpecRegistry {
        SpecRegistry::global()
    }

    fn castle_spec() -> ApiSpec {
        registry()
            .parse_spec(&RawDocument::from(json!({
                "openapi": "3.0.0",
                "paths": {
                    "/castles": {
                        "get": {
                            "operationId": "listCastles",
                            "responses": {
                                "200": {
                                    "content": {
                                        "application/json": {
                                            "example": [{"id": 1}]
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            })))
            .unwrap()
    }

    #[test]
    fn test_unmatched_request_short_circuits() {
        let matcher = OperationMatcher::new(registry(), castle_spec());
        let router = RequestRouter::new(&matcher, &[]);

        let outcome = router.handle(&UnifiedRequest::rest("GET", "/keeps"));

        assert_eq!(outcome.disposition, RouterDisposition::Unmatched);
        assert_eq!(outcome.response.status, 404);
        assert_eq!(outcome.response.body["error"], "operation_not_found");
        assert!(outcome.fixture_selection.is_none());
        assert!(!outcome.response.success);
    }

    #[test]
    fn test_fixture_backed_response_round_trips() {
        let matcher = OperationMatcher::new(registry(), castle_spec());
        let fixtures = vec![
            Fixture::new("fx-1", "listCastles", FixtureSource::Provider).with_response(
                FixtureResponse {
                    status: Some(201),
                    headers: [("x-castle".to_string(), "bran".to_string())].into(),
                    body: Some(json!([{"id": 7, "name": "Bran"}])),
                },
            ),
        ];
        let router = RequestRouter::new(&matcher, &fixtures);

        let outcome = router.handle(&UnifiedRequest::rest("GET", "/castles"));

        assert_eq!(outcome.disposition, RouterDisposition::MatchedWithFixture);
        assert_eq!(outcome.response.status, 201);
        assert_eq!(outcome.response.body, json!([{"id": 7, "name": "Bran"}]));
        assert_eq!(
            outcome.response.headers.get("x-castle").map(String::as_str),
            Some("bran")
        );
        assert!(outcome.response.success);
    }

    #[test]
    fn test_fixture_without_status_defaults_to_200() {
        let matcher = OperationMatcher::new(registry(), castle_spec());
        let fixtures = vec![
            Fixture::new("fx-1", "listCastles", FixtureSource::Manual).with_response(
                FixtureResponse {
                    status: None,
                    headers: Default::default(),
                    body: Some(json!([])),
                },
            ),
        ];
        let router = RequestRouter::new(&matcher, &fixtures);

        let outcome = router.handle(&UnifiedRequest::rest("GET", "/castles"));
        assert_eq!(outcome.response.status, 200);
    }

    #[test]
    fn test_empty_pool_falls_back_to_synthesis() {
        let matcher = OperationMatcher::new(registry(), castle_spec());
        let router = RequestRouter::new(&matcher, &[]);

        let outcome = router.handle(&UnifiedRequest::rest("GET", "/castles"));

        assert_eq!(outcome.disposition, RouterDisposition::MatchedGenerated);
        let selection = outcome.fixture_selection.unwrap();
        assert!(selection.selected.is_none());
        assert!(selection.ordered.is_empty());
        // Handler used the declared example
        assert_eq!(outcome.response.body[0]["id"], 1);
        assert!(outcome.response.success);
    }

    #[test]
    fn test_malformed_fixture_falls_through_to_synthesis() {
        let matcher = OperationMatcher::new(registry(), castle_spec());
        // Fixture matches the operation but stores no response body.
        let fixtures = vec![Fixture::new("fx-broken", "listCastles", FixtureSource::Provider)];
        let router = RequestRouter::new(&matcher, &fixtures);

        let outcome = router.handle(&UnifiedRequest::rest("GET", "/castles"));

        assert_eq!(outcome.disposition, RouterDisposition::MatchedGenerated);
        assert_eq!(outcome.response.body[0]["id"], 1);
        // The broken fixture was still scored and reported
        let selection = outcome.fixture_selection.unwrap();
        assert_eq!(selection.selected.unwrap().fixture_id, "fx-broken");
    }

    #[test]
    fn test_synthesis_failure_degrades_to_error_shape() {
        // An operation whose document declares only failure responses
        // cannot synthesize a success.
        let spec = registry()
            .parse_spec(&RawDocument::from(json!({
                "openapi": "3.0.0",
                "paths": {
                    "/broken": {
                        "get": {
                            "operationId": "brokenOp",
                            "responses": { "500": {} }
                        }
                    }
                }
            })))
            .unwrap();
        let matcher = OperationMatcher::new(registry(), spec);
        let router = RequestRouter::new(&matcher, &[]);

        let outcome = router.handle(&UnifiedRequest::rest("GET", "/broken"));

        assert_eq!(outcome.disposition, RouterDisposition::Unmatched);
        assert_eq!(outcome.response.status, 404);
        assert_eq!(outcome.response.body["error"], "internal_synthesis_error");
    }

    #[test]
    fn test_graph_router_uses_variant_scoring() {
        let spec = registry()
            .parse_spec(&RawDocument::from("type Query { listCastles: [Castle] }"))
            .unwrap();
        assert_eq!(spec.spec_type, SpecType::GraphQl);
        let matcher = OperationMatcher::new(registry(), spec);

        let mut stored = crate::model::FixtureRequest::default();
        stored.body = Some(json!({"query": "{ listCastles   { id } }"}));
        let fixtures = vec![
            Fixture::new("fx-g", "Query.listCastles", FixtureSource::Consumer)
                .with_request(stored)
                .with_response(FixtureResponse {
                    status: Some(200),
                    headers: Default::default(),
                    body: Some(json!({"data": {"listCastles": [{"id": 3}]}})),
                }),
        ];
        let router = RequestRouter::new(&matcher, &fixtures);

        let outcome = router.handle(&UnifiedRequest::graph("{ listCastles { id } }"));

        assert_eq!(outcome.disposition, RouterDisposition::MatchedWithFixture);
        assert_eq!(outcome.response.body["data"]["listCastles"][0]["id"], 3);
        // Whitespace-normalized document equality earned the body bonus
        let selection = outcome.fixture_selection.unwrap();
        let bonus = selection.selected.unwrap().specificity.unwrap();
        assert_eq!(bonus.body, 10.0);
    }
}
