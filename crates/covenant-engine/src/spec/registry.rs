//! Fixed dispatch over the three built-in specification handlers.
//!
//! The registry holds exactly the REST, graph, and event variants in
//! registration order. Detection iterates in that order, so ambiguous
//! inputs resolve to the first variant that claims them. No dynamic
//! registration exists; the set is closed.

use super::{EventHandler, GraphHandler, RawDocument, RestHandler, SpecHandler};
use crate::model::{ApiSpec, SpecType};
use once_cell::sync::Lazy;

/// Process-wide registry instance. Read-mostly, initialized once.
static GLOBAL: Lazy<SpecRegistry> = Lazy::new(SpecRegistry::new);

pub struct SpecRegistry {
    rest: RestHandler,
    graph: GraphHandler,
    event: EventHandler,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self {
            rest: RestHandler::new(),
            graph: GraphHandler::new(),
            event: EventHandler::new(),
        }
    }

    /// The shared process-wide instance.
    pub fn global() -> &'static SpecRegistry {
        &GLOBAL
    }

    /// Handlers in registration order (REST, graph, event). Detection
    /// order is part of the contract: first claim wins.
    fn handlers(&self) -> [&dyn SpecHandler; 3] {
        [&self.rest, &self.graph, &self.event]
    }

    /// The type of the first handler whose sniffer accepts the input.
    pub fn detect_type(&self, raw: &RawDocument) -> Option<SpecType> {
        self.handlers()
            .into_iter()
            .find(|handler| handler.can_handle(raw))
            .map(|handler| handler.spec_type())
    }

    /// Detect, then delegate parsing to the owning handler. `None` when
    /// no variant claims the input ("unsupported", not an error).
    pub fn parse_spec(&self, raw: &RawDocument) -> Option<ApiSpec> {
        let spec_type = self.detect_type(raw)?;
        self.handler(spec_type).parse_spec(raw)
    }

    /// O(1) lookup by discriminant.
    pub fn handler(&self, spec_type: SpecType) -> &dyn SpecHandler {
        match spec_type {
            SpecType::OpenApi => &self.rest,
            SpecType::GraphQl => &self.graph,
            SpecType::AsyncApi => &self.event,
        }
    }
}

impl Default for SpecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detects_each_builtin_format() {
        let registry = SpecRegistry::new();
        assert_eq!(
            registry.detect_type(&RawDocument::from(json!({"openapi": "3.0.0"}))),
            Some(SpecType::OpenApi)
        );
        assert_eq!(
            registry.detect_type(&RawDocument::from("type Query { ping: String }")),
            Some(SpecType::GraphQl)
        );
        assert_eq!(
            registry.detect_type(&RawDocument::from(json!({"asyncapi": "2.6.0"}))),
            Some(SpecType::AsyncApi)
        );
    }

    #[test]
    fn test_unclaimed_input_is_unsupported() {
        let registry = SpecRegistry::new();
        let raw = RawDocument::from(json!({"not": "a spec"}));
        assert_eq!(registry.detect_type(&raw), None);
        assert!(registry.parse_spec(&raw).is_none());
    }

    #[test]
    fn test_registration_order_breaks_ambiguity() {
        // A document carrying both markers belongs to the first
        // registered variant that claims it (REST).
        let registry = SpecRegistry::new();
        let raw = RawDocument::from(json!({"openapi": "3.0.0", "asyncapi": "2.6.0"}));
        assert_eq!(registry.detect_type(&raw), Some(SpecType::OpenApi));
    }

    #[test]
    fn test_parse_spec_delegates_to_owner() {
        let registry = SpecRegistry::new();
        let spec = registry
            .parse_spec(&RawDocument::from(json!({
                "asyncapi": "2.6.0",
                "channels": {}
            })))
            .unwrap();
        assert_eq!(spec.spec_type, SpecType::AsyncApi);
    }

    #[test]
    fn test_handler_lookup_matches_discriminant() {
        let registry = SpecRegistry::new();
        assert_eq!(registry.handler(SpecType::OpenApi).spec_type(), SpecType::OpenApi);
        assert_eq!(registry.handler(SpecType::GraphQl).spec_type(), SpecType::GraphQl);
        assert_eq!(registry.handler(SpecType::AsyncApi).spec_type(), SpecType::AsyncApi);
    }

    #[test]
    fn test_global_instance_is_shared() {
        let a = SpecRegistry::global() as *const SpecRegistry;
        let b = SpecRegistry::global() as *const SpecRegistry;
        assert_eq!(a, b);
    }
}
