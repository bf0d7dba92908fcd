//! REST-style specification handler (OpenAPI/Swagger documents).
//!
//! Operations are flattened from the `paths` object. Matching filters by
//! method, then compares paths segment-wise: literal segments outscore
//! template placeholders (`/orders/{id}`), so an exact path always ranks
//! strictly above a templated one of the same length.

use super::{MatchContext, RawDocument, ResponseValidation, SpecHandler, SynthesisParams};
use crate::error::EngineError;
use crate::model::{
    ApiOperation, ApiSpec, OperationMatchCandidate, OperationMatchResult, SpecType,
    UnifiedResponse,
};

/// HTTP methods recognized as operation keys in a path item.
const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Score contribution of a literal path segment vs. a template placeholder.
const LITERAL_SEGMENT_SCORE: f64 = 2.0;
const TEMPLATE_SEGMENT_SCORE: f64 = 1.0;
const METHOD_SCORE: f64 = 1.0;

/// Cap for `$ref` chasing during mock generation.
const MAX_SCHEMA_DEPTH: usize = 8;

#[derive(Debug, Default)]
pub struct RestHandler;

impl RestHandler {
    pub fn new() -> Self {
        Self
    }
}

impl SpecHandler for RestHandler {
    fn spec_type(&self) -> SpecType {
        SpecType::OpenApi
    }

    fn can_handle(&self, raw: &RawDocument) -> bool {
        raw.to_value()
            .and_then(|value| value.as_object().cloned())
            .map(|obj| obj.contains_key("openapi") || obj.contains_key("swagger"))
            .unwrap_or(false)
    }

    fn parse_spec(&self, raw: &RawDocument) -> Option<ApiSpec> {
        let value = raw.to_value()?;
        let obj = value.as_object()?;
        if !obj.contains_key("openapi") && !obj.contains_key("swagger") {
            return None;
        }
        // A present-but-malformed paths object makes the document
        // unparseable rather than silently empty.
        if let Some(paths) = obj.get("paths") {
            if !paths.is_object() {
                return None;
            }
        }
        Some(ApiSpec {
            spec_type: SpecType::OpenApi,
            document: value,
        })
    }

    fn extract_operations(&self, spec: &ApiSpec) -> Vec<ApiOperation> {
        let Some(paths) = spec.document.get("paths").and_then(|p| p.as_object()) else {
            return vec![];
        };

        let mut operations = Vec::new();
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            for method in METHODS {
                let Some(op) = item.get(method) else {
                    continue;
                };
                let id = op
                    .get("operationId")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| derive_operation_id(method, path));

                let mut operation = ApiOperation::new(id);
                operation.method = Some(method.to_uppercase());
                operation.path = Some(path.clone());
                operations.push(operation);
            }
        }
        operations
    }

    fn match_operation(&self, ctx: &MatchContext<'_>) -> OperationMatchResult {
        let (Some(method), Some(path)) = (ctx.request.method.as_deref(), ctx.request.path.as_deref())
        else {
            return OperationMatchResult::unmatched();
        };

        let mut candidates = Vec::new();
        for operation in ctx.operations {
            let Some(op_method) = operation.method.as_deref() else {
                continue;
            };
            if !op_method.eq_ignore_ascii_case(method) {
                continue;
            }
            let Some(template) = operation.path.as_deref() else {
                continue;
            };
            let Some(alignment) = match_path(template, path) else {
                continue;
            };

            let confidence = METHOD_SCORE
                + alignment.literals as f64 * LITERAL_SEGMENT_SCORE
                + alignment.params.len() as f64 * TEMPLATE_SEGMENT_SCORE;

            let mut reasons = vec![format!("method_exact {}", op_method)];
            if alignment.params.is_empty() {
                reasons.push(format!("path_exact {}", template));
            } else {
                reasons.push(format!("path_template {}", template));
                for (name, value) in &alignment.params {
                    reasons.push(format!("param {}={}", name, value));
                }
            }

            candidates.push(OperationMatchCandidate {
                operation: operation.clone(),
                confidence,
                reasons,
            });
        }

        OperationMatchResult::from_candidates(candidates)
    }

    fn generate_response(
        &self,
        params: &SynthesisParams<'_>,
    ) -> Result<UnifiedResponse, EngineError> {
        let operation = params.operation;
        let Some(op_value) = operation_document(&params.spec.document, operation) else {
            return Err(EngineError::synthesis(
                &operation.id,
                "operation not present in specification document",
            ));
        };

        let Some(responses) = op_value.get("responses").and_then(|r| r.as_object()) else {
            // Nothing declared: an empty success acknowledgement.
            return Ok(UnifiedResponse::with_status(200, serde_json::Value::Null));
        };

        let (status, response_decl) = pick_success_response(responses).ok_or_else(|| {
            EngineError::synthesis(&operation.id, "no success response declared")
        })?;

        let body = response_body(response_decl, &params.spec.document);
        let mut response = UnifiedResponse::with_status(status, body);
        if !response.body.is_null() {
            response = response.with_header("content-type", "application/json");
        }
        Ok(response)
    }

    fn validate_response(
        &self,
        operation: &ApiOperation,
        response: &UnifiedResponse,
        spec: &ApiSpec,
    ) -> ResponseValidation {
        let Some(op_value) = operation_document(&spec.document, operation) else {
            return ResponseValidation::invalid(vec![format!(
                "operation '{}' not present in specification document",
                operation.id
            )]);
        };
        let Some(responses) = op_value.get("responses").and_then(|r| r.as_object()) else {
            // No declared responses: anything goes.
            return ResponseValidation::valid();
        };

        let status_key = response.status.to_string();
        let declared = responses
            .get(&status_key)
            .or_else(|| responses.get("default"));
        let Some(declared) = declared else {
            return ResponseValidation::invalid(vec![format!(
                "status {} is not declared for operation '{}'",
                response.status, operation.id
            )]);
        };

        let mut errors = Vec::new();
        if let Some(schema) = response_schema(declared, &spec.document) {
            check_shape(&schema, &response.body, &mut errors);
        }
        if errors.is_empty() {
            ResponseValidation::valid()
        } else {
            ResponseValidation::invalid(errors)
        }
    }

    fn generate_mock_data(&self, operation: &ApiOperation, spec: &ApiSpec) -> serde_json::Value {
        let Some(op_value) = operation_document(&spec.document, operation) else {
            return serde_json::Value::Null;
        };
        let Some(responses) = op_value.get("responses").and_then(|r| r.as_object()) else {
            return serde_json::Value::Null;
        };
        let Some((_, declared)) = pick_success_response(responses) else {
            return serde_json::Value::Null;
        };
        response_schema(declared, &spec.document)
            .map(|schema| mock_from_schema(&schema, &spec.document, 0))
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Fallback operation id when `operationId` is absent:
/// `GET /castles/{id}` becomes `get_castles_id`.
fn derive_operation_id(method: &str, path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_start_matches('{').trim_end_matches('}').to_string())
        .collect();
    if segments.is_empty() {
        format!("{}_root", method.to_lowercase())
    } else {
        format!("{}_{}", method.to_lowercase(), segments.join("_"))
    }
}

/// Result of aligning a template against a concrete path.
struct PathAlignment {
    literals: usize,
    params: Vec<(String, String)>,
}

/// Segment-wise comparison of a path template against a concrete path.
/// `None` on any literal mismatch or length difference.
fn match_path(template: &str, path: &str) -> Option<PathAlignment> {
    let template_segments: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut literals = 0;
    let mut params = Vec::new();
    for (tpl, actual) in template_segments.iter().zip(&path_segments) {
        if tpl.starts_with('{') && tpl.ends_with('}') {
            let name = tpl.trim_start_matches('{').trim_end_matches('}');
            params.push((name.to_string(), (*actual).to_string()));
        } else if tpl == actual {
            literals += 1;
        } else {
            return None;
        }
    }
    Some(PathAlignment { literals, params })
}

/// Locate the raw operation object for an extracted operation.
fn operation_document<'a>(
    document: &'a serde_json::Value,
    operation: &ApiOperation,
) -> Option<&'a serde_json::Value> {
    let path = operation.path.as_deref()?;
    let method = operation.method.as_deref()?.to_lowercase();
    document.get("paths")?.get(path)?.get(method)
}

/// First declared 2xx response (numeric key order), falling back to
/// `default` at status 200.
fn pick_success_response(
    responses: &serde_json::Map<String, serde_json::Value>,
) -> Option<(u16, &serde_json::Value)> {
    let mut success: Vec<(u16, &serde_json::Value)> = responses
        .iter()
        .filter_map(|(key, value)| {
            key.parse::<u16>()
                .ok()
                .filter(|status| (200..300).contains(status))
                .map(|status| (status, value))
        })
        .collect();
    success.sort_by_key(|(status, _)| *status);
    success
        .first()
        .copied()
        .or_else(|| responses.get("default").map(|v| (200, v)))
}

/// Body for a declared response: explicit example, first named example,
/// then schema-derived mock data.
fn response_body(declared: &serde_json::Value, document: &serde_json::Value) -> serde_json::Value {
    let media = declared
        .get("content")
        .and_then(|c| c.get("application/json"));

    if let Some(media) = media {
        if let Some(example) = media.get("example") {
            return example.clone();
        }
        if let Some(examples) = media.get("examples").and_then(|e| e.as_object()) {
            if let Some(first) = examples.values().next() {
                return first.get("value").unwrap_or(first).clone();
            }
        }
        if let Some(schema) = media.get("schema") {
            return mock_from_schema(schema, document, 0);
        }
    }

    // Swagger 2.0 keeps schema/examples directly on the response object.
    if let Some(example) = declared.get("example") {
        return example.clone();
    }
    if let Some(schema) = declared.get("schema") {
        return mock_from_schema(schema, document, 0);
    }
    serde_json::Value::Null
}

/// Schema declared for a response, if any.
fn response_schema(
    declared: &serde_json::Value,
    document: &serde_json::Value,
) -> Option<serde_json::Value> {
    let schema = declared
        .get("content")
        .and_then(|c| c.get("application/json"))
        .and_then(|m| m.get("schema"))
        .or_else(|| declared.get("schema"))?;
    Some(resolve_ref(schema, document, 0).clone())
}

/// Follow `#/components/schemas/...` references, bounded by depth.
fn resolve_ref<'a>(
    schema: &'a serde_json::Value,
    document: &'a serde_json::Value,
    depth: usize,
) -> &'a serde_json::Value {
    if depth >= MAX_SCHEMA_DEPTH {
        return schema;
    }
    let Some(reference) = schema.get("$ref").and_then(|r| r.as_str()) else {
        return schema;
    };
    let mut target = document;
    for segment in reference.trim_start_matches("#/").split('/') {
        match target.get(segment) {
            Some(next) => target = next,
            None => return schema,
        }
    }
    resolve_ref(target, document, depth + 1)
}

/// Deterministic example data for a JSON schema. Prefers declared
/// examples and enum heads; falls back to fixed per-type placeholders.
/// Shared with the event variant, whose message payloads are the same
/// schema dialect.
pub(crate) fn mock_from_schema(
    schema: &serde_json::Value,
    document: &serde_json::Value,
    depth: usize,
) -> serde_json::Value {
    if depth >= MAX_SCHEMA_DEPTH {
        return serde_json::Value::Null;
    }
    let schema = resolve_ref(schema, document, 0);

    if let Some(example) = schema.get("example") {
        return example.clone();
    }
    if let Some(values) = schema.get("enum").and_then(|e| e.as_array()) {
        return values.first().cloned().unwrap_or(serde_json::Value::Null);
    }

    match schema.get("type").and_then(|t| t.as_str()) {
        Some("object") => {
            let mut object = serde_json::Map::new();
            if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
                for (name, prop) in properties {
                    object.insert(name.clone(), mock_from_schema(prop, document, depth + 1));
                }
            }
            serde_json::Value::Object(object)
        }
        Some("array") => {
            let item = schema
                .get("items")
                .map(|items| mock_from_schema(items, document, depth + 1))
                .unwrap_or(serde_json::Value::Null);
            serde_json::Value::Array(vec![item])
        }
        Some("string") => {
            let placeholder = match schema.get("format").and_then(|f| f.as_str()) {
                Some("date-time") => "2024-01-01T00:00:00Z",
                Some("date") => "2024-01-01",
                Some("uuid") => "00000000-0000-0000-0000-000000000000",
                Some("email") => "user@example.com",
                Some("uri") => "https://example.com",
                _ => "string",
            };
            serde_json::Value::String(placeholder.to_string())
        }
        Some("integer") => serde_json::json!(0),
        Some("number") => serde_json::json!(0.0),
        Some("boolean") => serde_json::json!(true),
        _ => serde_json::Value::Null,
    }
}

/// Shallow structural check of a body against a schema: top-level type
/// plus presence of required object properties.
fn check_shape(schema: &serde_json::Value, body: &serde_json::Value, errors: &mut Vec<String>) {
    let Some(expected) = schema.get("type").and_then(|t| t.as_str()) else {
        return;
    };
    let actual_matches = match expected {
        "object" => body.is_object(),
        "array" => body.is_array(),
        "string" => body.is_string(),
        "integer" | "number" => body.is_number(),
        "boolean" => body.is_boolean(),
        _ => true,
    };
    if !actual_matches {
        errors.push(format!("expected body of type '{}'", expected));
        return;
    }
    if expected == "object" {
        if let (Some(required), Some(object)) = (
            schema.get("required").and_then(|r| r.as_array()),
            body.as_object(),
        ) {
            for name in required.iter().filter_map(|n| n.as_str()) {
                if !object.contains_key(name) {
                    errors.push(format!("missing required property '{}'", name));
                }
            }
        }
    }
}
