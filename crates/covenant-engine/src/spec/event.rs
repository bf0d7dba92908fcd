//! Event/message specification handler (AsyncAPI documents).
//!
//! Operations are channel directions: each `publish`/`subscribe` entry of
//! a channel becomes one operation identified as `channel:direction`.
//! Matching is by channel, refined by message type when the request
//! carries an `eventType`. Pure publish operations have no response-status
//! concept, so synthesis returns a `success: true` acknowledgement shape
//! by convention.

use super::rest::mock_from_schema;
use super::{MatchContext, RawDocument, ResponseValidation, SpecHandler, SynthesisParams};
use crate::error::EngineError;
use crate::model::{
    ApiOperation, ApiSpec, OperationMatchCandidate, OperationMatchResult, SpecType,
    UnifiedResponse,
};

/// Channel directions recognized as operation keys.
const DIRECTIONS: [&str; 2] = ["publish", "subscribe"];

/// Confidence for a channel match refined by message type vs. channel
/// alone.
const CHANNEL_AND_TYPE_SCORE: f64 = 2.0;
const CHANNEL_ONLY_SCORE: f64 = 1.0;

#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }
}

impl SpecHandler for EventHandler {
    fn spec_type(&self) -> SpecType {
        SpecType::AsyncApi
    }

    fn can_handle(&self, raw: &RawDocument) -> bool {
        raw.to_value()
            .and_then(|value| value.as_object().cloned())
            .map(|obj| obj.contains_key("asyncapi"))
            .unwrap_or(false)
    }

    fn parse_spec(&self, raw: &RawDocument) -> Option<ApiSpec> {
        let value = raw.to_value()?;
        let obj = value.as_object()?;
        if !obj.contains_key("asyncapi") {
            return None;
        }
        if let Some(channels) = obj.get("channels") {
            if !channels.is_object() {
                return None;
            }
        }
        Some(ApiSpec {
            spec_type: SpecType::AsyncApi,
            document: value,
        })
    }

    fn extract_operations(&self, spec: &ApiSpec) -> Vec<ApiOperation> {
        let Some(channels) = spec.document.get("channels").and_then(|c| c.as_object()) else {
            return vec![];
        };

        let mut operations = Vec::new();
        for (channel, item) in channels {
            let Some(item) = item.as_object() else {
                continue;
            };
            for direction in DIRECTIONS {
                let Some(entry) = item.get(direction) else {
                    continue;
                };
                let mut operation = ApiOperation::new(format!("{}:{}", channel, direction));
                operation.channel = Some(channel.clone());
                operation.direction = Some(direction.to_string());
                operation.message_type = message_type(entry);
                operations.push(operation);
            }
        }
        operations
    }

    fn match_operation(&self, ctx: &MatchContext<'_>) -> OperationMatchResult {
        let Some(channel) = ctx.request.channel.as_deref() else {
            return OperationMatchResult::unmatched();
        };

        let candidates: Vec<OperationMatchCandidate> = ctx
            .operations
            .iter()
            .filter(|operation| operation.channel.as_deref() == Some(channel))
            .map(|operation| {
                let mut reasons = vec![format!("channel_exact {}", channel)];
                let confidence = match ctx.request.event_type.as_deref() {
                    Some(event_type) if operation.message_type.as_deref() == Some(event_type) => {
                        reasons.push(format!("event_type_exact {}", event_type));
                        CHANNEL_AND_TYPE_SCORE
                    }
                    Some(_) => {
                        reasons.push("event_type_unmatched".to_string());
                        CHANNEL_ONLY_SCORE
                    }
                    None => CHANNEL_ONLY_SCORE,
                };
                OperationMatchCandidate {
                    operation: operation.clone(),
                    confidence,
                    reasons,
                }
            })
            .collect();

        OperationMatchResult::from_candidates(candidates)
    }

    fn generate_response(
        &self,
        params: &SynthesisParams<'_>,
    ) -> Result<UnifiedResponse, EngineError> {
        let mut body = serde_json::json!({ "acknowledged": true });
        if let Some(channel) = &params.operation.channel {
            body["channel"] = serde_json::Value::String(channel.clone());
        }
        Ok(UnifiedResponse::with_status(200, body))
    }

    fn validate_response(
        &self,
        _operation: &ApiOperation,
        response: &UnifiedResponse,
        _spec: &ApiSpec,
    ) -> ResponseValidation {
        // Event exchanges have no schema-declared response; the uniform
        // success signal is all there is to check.
        if response.success && response.status < 400 {
            ResponseValidation::valid()
        } else {
            ResponseValidation::invalid(vec![format!(
                "event acknowledgement failed (status {})",
                response.status
            )])
        }
    }

    fn generate_mock_data(&self, operation: &ApiOperation, spec: &ApiSpec) -> serde_json::Value {
        let Some(payload) = operation_payload(&spec.document, operation) else {
            return serde_json::Value::Null;
        };
        mock_from_schema(payload, &spec.document, 0)
    }
}

/// Declared message type: `message.name`, falling back to `message.title`
/// or the tail of a `$ref`.
fn message_type(entry: &serde_json::Value) -> Option<String> {
    let message = entry.get("message")?;
    if let Some(name) = message.get("name").and_then(|n| n.as_str()) {
        return Some(name.to_string());
    }
    if let Some(title) = message.get("title").and_then(|t| t.as_str()) {
        return Some(title.to_string());
    }
    message
        .get("$ref")
        .and_then(|r| r.as_str())
        .and_then(|r| r.rsplit('/').next())
        .map(str::to_string)
}

/// Payload schema for an operation's message.
fn operation_payload<'a>(
    document: &'a serde_json::Value,
    operation: &ApiOperation,
) -> Option<&'a serde_json::Value> {
    let channel = operation.channel.as_deref()?;
    let direction = operation.direction.as_deref()?;
    document
        .get("channels")?
        .get(channel)?
        .get(direction)?
        .get("message")?
        .get("payload")
}
