//! Engine error taxonomy.
//!
//! Everything here is recovered locally before leaving the engine: the
//! router degrades synthesis failures to an unmatched-shaped response, and
//! unsupported documents surface as absent parse results. Nothing from the
//! matching layer propagates to the transport as an unhandled failure.

/// Failures raised at the engine's fallible boundaries.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Raw document matched no registered handler.
    #[error("document matches no registered specification format")]
    UnsupportedFormat,

    /// Handler response synthesis failed for a matched operation.
    #[error("response synthesis failed for operation '{operation_id}': {detail}")]
    SynthesisFailure {
        operation_id: String,
        detail: String,
    },

    /// A selected fixture lacked the data the router expected.
    #[error("fixture '{fixture_id}' is missing a stored response")]
    MalformedFixture { fixture_id: String },
}

impl EngineError {
    pub fn synthesis(operation_id: impl Into<String>, detail: impl Into<String>) -> Self {
        EngineError::SynthesisFailure {
            operation_id: operation_id.into(),
            detail: detail.into(),
        }
    }
}
