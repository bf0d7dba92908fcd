//! Operation matching orchestration.
//!
//! A matcher is constructed once per parsed spec and lives for the
//! session: the handler is resolved once from the registry and the
//! operation list is extracted eagerly at construction (extraction is
//! assumed expensive enough to avoid repeating per request). Each
//! `match_request` call delegates to the owning handler.

use crate::model::{ApiOperation, ApiSpec, OperationMatchResult, UnifiedRequest};
use crate::spec::{MatchContext, SpecHandler, SpecRegistry};
use tracing::warn;

pub struct OperationMatcher<'a> {
    spec: ApiSpec,
    handler: Option<&'a dyn SpecHandler>,
    operations: Vec<ApiOperation>,
}

impl<'a> OperationMatcher<'a> {
    /// Resolve the handler and extract the operation cache for `spec`.
    ///
    /// The spec's type was produced by `parse_spec`, so the lookup cannot
    /// normally miss; a mismatched dispatch entry is still checked
    /// defensively and degrades every match to the empty result instead
    /// of failing.
    pub fn new(registry: &'a SpecRegistry, spec: ApiSpec) -> Self {
        let handler = registry.handler(spec.spec_type);
        let handler = (handler.spec_type() == spec.spec_type).then_some(handler);
        if handler.is_none() {
            warn!(
                spec_type = %spec.spec_type,
                "registry returned a handler for a different spec type; matcher will match nothing"
            );
        }
        let operations = handler
            .map(|h| h.extract_operations(&spec))
            .unwrap_or_default();
        Self {
            spec,
            handler,
            operations,
        }
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }

    /// The cached operation list (extracted once at construction).
    pub fn operations(&self) -> &[ApiOperation] {
        &self.operations
    }

    pub fn handler(&self) -> Option<&'a dyn SpecHandler> {
        self.handler
    }

    /// Classify one request. Total: an unresolvable handler yields the
    /// empty synthetic result.
    pub fn match_request(&self, request: &UnifiedRequest) -> OperationMatchResult {
        let Some(handler) = self.handler else {
            return OperationMatchResult::unmatched();
        };
        handler.match_operation(&MatchContext {
            request,
            operations: &self.operations,
            spec_type: self.spec.spec_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RawDocument;
    use serde_json::json;

    fn registry() -> &'static SpecRegistry {
        SpecRegistry::global()
    }

    fn rest_spec() -> ApiSpec {
        registry()
            .parse_spec(&RawDocument::from(json!({
                "openapi": "3.0.0",
                "paths": {
                    "/castles": {
                        "get": { "operationId": "listCastles", "responses": { "200": {} } }
                    }
                }
            })))
            .unwrap()
    }

    #[test]
    fn test_operations_cached_at_construction() {
        let matcher = OperationMatcher::new(registry(), rest_spec());
        assert_eq!(matcher.operations().len(), 1);
        assert_eq!(matcher.operations()[0].id, "listCastles");
    }

    #[test]
    fn test_match_request_delegates_to_handler() {
        let matcher = OperationMatcher::new(registry(), rest_spec());
        let result = matcher.match_request(&UnifiedRequest::rest("GET", "/castles"));
        assert_eq!(result.selected.unwrap().operation.id, "listCastles");
    }

    #[test]
    fn test_unmatched_request_is_a_normal_outcome() {
        let matcher = OperationMatcher::new(registry(), rest_spec());
        let result = matcher.match_request(&UnifiedRequest::rest("GET", "/keeps"));
        assert!(result.candidates.is_empty());
        assert!(result.selected.is_none());
    }

    #[test]
    fn test_empty_spec_matches_nothing_for_any_request() {
        let spec = registry()
            .parse_spec(&RawDocument::from(json!({"openapi": "3.0.0", "paths": {}})))
            .unwrap();
        let matcher = OperationMatcher::new(registry(), spec);

        for request in [
            UnifiedRequest::rest("GET", "/anything"),
            UnifiedRequest::graph("{ anything }"),
            UnifiedRequest::event("any/channel", None),
        ] {
            let result = matcher.match_request(&request);
            assert!(result.candidates.is_empty());
            assert!(result.selected.is_none());
        }
    }
}
