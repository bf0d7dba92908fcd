//! Unified value types shared by every engine component.

mod fixture;
mod operation;
mod request;

pub use fixture::{
    Fixture, FixtureData, FixtureRequest, FixtureResponse, FixtureScoreBreakdown,
    FixtureSelectionResult, FixtureSource, FixtureStatus, SpecificityBonus,
};
pub use operation::{
    ApiOperation, ApiSpec, OperationMatchCandidate, OperationMatchResult, SpecType,
};
pub use request::{UnifiedRequest, UnifiedResponse};
