//! Format-agnostic request and response value types.
//!
//! Every call site (mock server, interceptor, verification replay) converts
//! its wire format into these shapes before entering the engine. Exactly one
//! of the three request shapes (REST, graph, event) is populated per real
//! call, but the type does not enforce this; handlers tolerate absent fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request normalized across REST calls, graph operations, and event
/// messages.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedRequest {
    /// HTTP method (REST shape)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request path (REST shape)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Request body; carries the query document for graph operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Channel name (event shape)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Message type (event shape)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
}

impl UnifiedRequest {
    /// REST-shaped request.
    pub fn rest(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Graph-shaped request carrying a query/mutation document.
    pub fn graph(document: impl Into<String>) -> Self {
        Self {
            body: Some(serde_json::json!({ "query": document.into() })),
            ..Default::default()
        }
    }

    /// Event-shaped request.
    pub fn event(channel: impl Into<String>, event_type: Option<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            event_type,
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response normalized across all variants. `status` is HTTP-style even
/// for non-HTTP variants and is used uniformly as a success/failure signal;
/// `success` is independent so a handler can signal logical failure without
/// an HTTP code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: serde_json::Value,
    pub success: bool,
}

fn default_status() -> u16 {
    200
}

impl UnifiedResponse {
    /// Response with `success` derived from the status class.
    pub fn with_status(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
            success: status < 400,
        }
    }

    pub fn ok(body: serde_json::Value) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Whether the status is in the 2xx class (drives fixture collection).
    pub fn is_2xx(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = UnifiedRequest::rest("GET", "/orders").with_header("Content-Type", "application/json");

        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn test_graph_request_wraps_document() {
        let req = UnifiedRequest::graph("{ listOrders { id } }");
        let doc = req.body.unwrap();
        assert_eq!(doc["query"], "{ listOrders { id } }");
    }

    #[test]
    fn test_response_success_follows_status_class() {
        assert!(UnifiedResponse::with_status(201, serde_json::Value::Null).success);
        assert!(!UnifiedResponse::with_status(404, serde_json::Value::Null).success);
    }

    #[test]
    fn test_is_2xx_bounds() {
        assert!(UnifiedResponse::with_status(200, serde_json::Value::Null).is_2xx());
        assert!(UnifiedResponse::with_status(299, serde_json::Value::Null).is_2xx());
        assert!(!UnifiedResponse::with_status(300, serde_json::Value::Null).is_2xx());
        assert!(!UnifiedResponse::with_status(199, serde_json::Value::Null).is_2xx());
    }
}
