//! Covenant request-resolution engine.
//!
//! Given an incoming request (HTTP call, graph operation, or event
//! message) and a specification in one of three description formats,
//! identify which logical operation the request represents — with a
//! ranked, explainable confidence score — and select the best matching
//! recorded fixture to synthesize a deterministic response.
//!
//! The same matching and scoring core backs three call sites: the mock
//! server, the request interceptor, and provider verification replay.

// ===== Core resolution pipeline =====
pub mod matcher;
pub mod model;
pub mod router;
pub mod scorer;
pub mod spec;

// ===== Call-site support =====
pub mod replay;
pub mod session;

// ===== Ambient =====
pub mod config;
pub mod error;
pub mod metrics;

pub use config::{EngineConfig, ScoringWeights, SessionConfig};
pub use error::EngineError;
pub use matcher::OperationMatcher;
pub use model::{
    ApiOperation, ApiSpec, Fixture, FixtureSelectionResult, OperationMatchResult, SpecType,
    UnifiedRequest, UnifiedResponse,
};
pub use router::{RequestRouter, RouterDisposition, RouterOutcome};
pub use spec::{RawDocument, SpecHandler, SpecRegistry};
