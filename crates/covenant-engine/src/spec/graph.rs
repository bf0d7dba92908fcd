//! Graph query language handler (SDL schemas and introspection results).
//!
//! Operations are the fields of the root `Query`/`Mutation`/`Subscription`
//! types, identified as `Kind.fieldName`. Matching parses the request
//! body's query document and resolves its root field; confidence is binary
//! in practice but a ranked candidate list is still returned to stay
//! uniform with the other variants.

use super::{MatchContext, RawDocument, ResponseValidation, SpecHandler, SynthesisParams};
use crate::config::ScoringWeights;
use crate::error::EngineError;
use crate::model::{
    ApiOperation, ApiSpec, Fixture, FixtureSelectionResult, OperationMatchCandidate,
    OperationMatchResult, SpecType, UnifiedRequest, UnifiedResponse,
};
use crate::scorer;
use once_cell::sync::Lazy;
use regex::Regex;

/// Root type blocks in an SDL document.
static ROOT_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\btype\s+(Query|Mutation|Subscription)\b[^{]*\{(.*?)\}")
        .expect("root type pattern is valid")
});

/// One field declaration inside a type block: `name(args): Type`.
static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*([A-Za-z_]\w*)\s*(?:\([^)]*\))?\s*:").expect("field pattern is valid"));

/// Leading shape of a query document: optional operation keyword and name,
/// then the first root field inside the selection set.
static DOCUMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(query|mutation|subscription)\b[^{]*)?\{\s*([A-Za-z_]\w*)")
        .expect("document pattern is valid")
});

#[derive(Debug, Default)]
pub struct GraphHandler;

impl GraphHandler {
    pub fn new() -> Self {
        Self
    }
}

impl SpecHandler for GraphHandler {
    fn spec_type(&self) -> SpecType {
        SpecType::GraphQl
    }

    fn can_handle(&self, raw: &RawDocument) -> bool {
        if let Some(text) = raw.as_text() {
            return looks_like_sdl(text);
        }
        if let RawDocument::Value(value) = raw {
            return introspection_schema(value).is_some();
        }
        false
    }

    fn parse_spec(&self, raw: &RawDocument) -> Option<ApiSpec> {
        if let Some(text) = raw.as_text() {
            if !looks_like_sdl(text) || !ROOT_TYPE_RE.is_match(text) {
                return None;
            }
            return Some(ApiSpec {
                spec_type: SpecType::GraphQl,
                document: serde_json::Value::String(text.to_string()),
            });
        }
        if let RawDocument::Value(value) = raw {
            introspection_schema(value)?;
            return Some(ApiSpec {
                spec_type: SpecType::GraphQl,
                document: value.clone(),
            });
        }
        None
    }

    fn extract_operations(&self, spec: &ApiSpec) -> Vec<ApiOperation> {
        match &spec.document {
            serde_json::Value::String(sdl) => extract_from_sdl(sdl),
            value => extract_from_introspection(value),
        }
    }

    fn match_operation(&self, ctx: &MatchContext<'_>) -> OperationMatchResult {
        let Some(document) = request_document(ctx.request) else {
            return OperationMatchResult::unmatched();
        };
        let Some((kind, field)) = parse_document(&document) else {
            return OperationMatchResult::unmatched();
        };

        let wanted = format!("{}.{}", kind, field);
        let candidates: Vec<OperationMatchCandidate> = ctx
            .operations
            .iter()
            .filter(|operation| operation.id == wanted)
            .map(|operation| OperationMatchCandidate {
                operation: operation.clone(),
                confidence: 1.0,
                reasons: vec![
                    format!("operation_kind {}", kind.to_lowercase()),
                    format!("document_root_field {}", field),
                ],
            })
            .collect();

        OperationMatchResult::from_candidates(candidates)
    }

    fn generate_response(
        &self,
        params: &SynthesisParams<'_>,
    ) -> Result<UnifiedResponse, EngineError> {
        let field = root_field(&params.operation.id);

        // A fixture fragment, when the selection carries one, fills the
        // data envelope; otherwise the field resolves to a mock stub.
        let fragment = params.fixture_selection.and_then(|selection| {
            selection.ordered.iter().find_map(|breakdown| {
                params
                    .fixtures
                    .iter()
                    .find(|fixture| fixture.id == breakdown.fixture_id)
                    .and_then(|fixture| fixture.data.response.as_ref())
                    .and_then(|response| response.body.clone())
            })
        });

        let body = match fragment {
            Some(body) if body.get("data").is_some() => body,
            Some(fragment) => data_envelope(field, fragment),
            None => data_envelope(
                field,
                self.generate_mock_data(params.operation, params.spec),
            ),
        };

        Ok(UnifiedResponse::ok(body).with_header("content-type", "application/json"))
    }

    fn score_fixtures(
        &self,
        fixtures: &[Fixture],
        request: &UnifiedRequest,
        candidate: &OperationMatchCandidate,
        weights: &ScoringWeights,
    ) -> Option<FixtureSelectionResult> {
        // Graph documents differ textually (whitespace, operation names)
        // while meaning the same query, so the body-alignment bonus uses
        // normalized document equality instead of byte identity.
        Some(scorer::score_with_comparator(
            fixtures,
            request,
            candidate,
            weights,
            documents_equivalent,
        ))
    }

    fn validate_response(
        &self,
        _operation: &ApiOperation,
        response: &UnifiedResponse,
        _spec: &ApiSpec,
    ) -> ResponseValidation {
        let Some(object) = response.body.as_object() else {
            return ResponseValidation::invalid(vec![
                "graph response body must be an object".to_string(),
            ]);
        };
        if !object.contains_key("data") && !object.contains_key("errors") {
            return ResponseValidation::invalid(vec![
                "graph response must carry 'data' or 'errors'".to_string(),
            ]);
        }
        let has_errors = object
            .get("errors")
            .and_then(|e| e.as_array())
            .map(|errors| !errors.is_empty())
            .unwrap_or(false);
        if has_errors {
            return ResponseValidation::invalid(vec!["graph response carries errors".to_string()]);
        }
        ResponseValidation::valid()
    }

    fn generate_mock_data(&self, _operation: &ApiOperation, _spec: &ApiSpec) -> serde_json::Value {
        // Field resolution without a fixture yields a null stub; shaping
        // from SDL return types is left to richer generators upstream.
        serde_json::Value::Null
    }
}

/// `{data: {<field>: payload}}`
fn data_envelope(field: &str, payload: serde_json::Value) -> serde_json::Value {
    let mut data = serde_json::Map::new();
    data.insert(field.to_string(), payload);
    serde_json::json!({ "data": data })
}

/// SDL sniffing: any root type block or schema definition keyword.
fn looks_like_sdl(text: &str) -> bool {
    text.contains("type Query")
        || text.contains("type Mutation")
        || text.contains("type Subscription")
        || text.contains("schema {")
        || text.contains("schema{")
}

/// The `__schema` object of an introspection result, tolerating the
/// common `{data: {__schema: ...}}` envelope.
fn introspection_schema(value: &serde_json::Value) -> Option<&serde_json::Value> {
    value
        .get("__schema")
        .or_else(|| value.get("data").and_then(|d| d.get("__schema")))
        .filter(|schema| schema.is_object())
}

fn extract_from_sdl(sdl: &str) -> Vec<ApiOperation> {
    let mut operations = Vec::new();
    for capture in ROOT_TYPE_RE.captures_iter(sdl) {
        let kind = &capture[1];
        let block = &capture[2];
        for field in FIELD_RE.captures_iter(block) {
            let name = &field[1];
            let mut operation = ApiOperation::new(format!("{}.{}", kind, name));
            operation.operation_type = Some(kind.to_lowercase());
            operations.push(operation);
        }
    }
    operations
}

fn extract_from_introspection(value: &serde_json::Value) -> Vec<ApiOperation> {
    let Some(schema) = introspection_schema(value) else {
        return vec![];
    };
    let Some(types) = schema.get("types").and_then(|t| t.as_array()) else {
        return vec![];
    };

    let mut operations = Vec::new();
    for (kind, root_key) in [
        ("Query", "queryType"),
        ("Mutation", "mutationType"),
        ("Subscription", "subscriptionType"),
    ] {
        let Some(root_name) = schema
            .get(root_key)
            .and_then(|t| t.get("name"))
            .and_then(|n| n.as_str())
        else {
            continue;
        };
        let Some(root_type) = types
            .iter()
            .find(|t| t.get("name").and_then(|n| n.as_str()) == Some(root_name))
        else {
            continue;
        };
        let Some(fields) = root_type.get("fields").and_then(|f| f.as_array()) else {
            continue;
        };
        for field in fields {
            let Some(name) = field.get("name").and_then(|n| n.as_str()) else {
                continue;
            };
            let mut operation = ApiOperation::new(format!("{}.{}", kind, name));
            operation.operation_type = Some(kind.to_lowercase());
            operations.push(operation);
        }
    }
    operations
}

/// The query document carried by a unified request: a string body or an
/// object body with a `query` field.
fn request_document(request: &UnifiedRequest) -> Option<String> {
    match request.body.as_ref()? {
        serde_json::Value::String(document) => Some(document.clone()),
        serde_json::Value::Object(object) => object
            .get("query")
            .and_then(|q| q.as_str())
            .map(str::to_string),
        _ => None,
    }
}

/// Resolve a document to its operation kind (capitalized) and root field.
/// `None` for documents the tokenizer cannot shape.
fn parse_document(document: &str) -> Option<(String, String)> {
    let capture = DOCUMENT_RE.captures(document)?;
    let kind = match capture.get(1).map(|m| m.as_str()) {
        Some("mutation") => "Mutation",
        Some("subscription") => "Subscription",
        // Bare selection sets are queries by convention.
        _ => "Query",
    };
    Some((kind.to_string(), capture[2].to_string()))
}

fn root_field(operation_id: &str) -> &str {
    operation_id
        .split_once('.')
        .map(|(_, field)| field)
        .unwrap_or(operation_id)
}

/// Whitespace-normalized equality of two graph request bodies.
fn documents_equivalent(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    let text = |value: &serde_json::Value| -> Option<String> {
        let document = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(o) => o.get("query")?.as_str()?.to_string(),
            _ => return None,
        };
        Some(document.split_whitespace().collect::<Vec<_>>().join(" "))
    };
    match (text(a), text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => scorer::bodies_byte_identical(a, b),
    }
}
