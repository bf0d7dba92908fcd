//! Default fixture scoring.
//!
//! Given a matched operation and the caller's fixture pool, rank candidate
//! fixtures by a deterministic weighted score: author priority, source
//! trust bias, and request-alignment specificity. Scoring is a pure read;
//! identical inputs always yield identical ordering.

use crate::config::ScoringWeights;
use crate::model::{
    Fixture, FixtureScoreBreakdown, FixtureSelectionResult, FixtureSource,
    OperationMatchCandidate, SpecificityBonus, UnifiedRequest,
};

/// Body comparison hook: the default is serialized byte equality, variant
/// overrides may substitute format-aware equality (e.g. whitespace-
/// normalized graph documents).
pub type BodyComparator = fn(&serde_json::Value, &serde_json::Value) -> bool;

/// Serialized byte-identity of two JSON bodies.
pub fn bodies_byte_identical(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    // serde_json renders maps in key order, so equal values serialize
    // identically regardless of construction order.
    serde_json::to_string(a).ok() == serde_json::to_string(b).ok()
}

/// Score the pool for a matched operation with the stock body comparator.
pub fn score_fixtures_default(
    fixtures: &[Fixture],
    request: &UnifiedRequest,
    candidate: &OperationMatchCandidate,
    weights: &ScoringWeights,
) -> FixtureSelectionResult {
    score_with_comparator(fixtures, request, candidate, weights, bodies_byte_identical)
}

/// Score the pool with a custom body comparator.
///
/// The pool is first filtered to fixtures whose `operation` equals the
/// candidate's operation id exactly; scoring never fabricates a match for
/// an empty filtered pool. The final sort is stable and descending, so
/// equal totals keep pool order — callers that need reproducible ties
/// should order their pool.
pub fn score_with_comparator(
    fixtures: &[Fixture],
    request: &UnifiedRequest,
    candidate: &OperationMatchCandidate,
    weights: &ScoringWeights,
    body_eq: BodyComparator,
) -> FixtureSelectionResult {
    let mut ordered: Vec<FixtureScoreBreakdown> = fixtures
        .iter()
        .filter(|fixture| fixture.operation == candidate.operation.id)
        .map(|fixture| score_fixture(fixture, request, weights, body_eq))
        .collect();

    ordered.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let selected = ordered.first().cloned();
    FixtureSelectionResult { ordered, selected }
}

fn score_fixture(
    fixture: &Fixture,
    request: &UnifiedRequest,
    weights: &ScoringWeights,
    body_eq: BodyComparator,
) -> FixtureScoreBreakdown {
    let source_bias = match fixture.source {
        FixtureSource::Provider => weights.provider_bias,
        FixtureSource::Manual => weights.manual_bias,
        FixtureSource::Consumer => weights.consumer_bias,
    };
    let priority_score = fixture.priority as f64 * weights.priority_factor;

    let mut reasons = vec![
        format!("source_{}", fixture.source.as_str()),
        format!("priority_{}", fixture.priority),
    ];

    let specificity = fixture
        .data
        .request
        .as_ref()
        .map(|stored| {
            let mut bonus = SpecificityBonus::default();
            if stored.path.is_some() && stored.path == request.path {
                bonus.path = weights.path_bonus;
                reasons.push("path_exact".to_string());
            }
            if let (Some(stored_body), Some(incoming_body)) = (&stored.body, &request.body) {
                if body_eq(stored_body, incoming_body) {
                    bonus.body = weights.body_bonus;
                    reasons.push("body_exact".to_string());
                }
            }
            // Subset test on keys only: extra stored keys are tolerated.
            if !request.query.is_empty()
                && request.query.keys().all(|key| stored.query.contains_key(key))
            {
                bonus.query = weights.query_bonus;
                reasons.push("query_subset".to_string());
            }
            bonus
        })
        .filter(|bonus| !bonus.is_zero());

    let base = 0.0;
    let total = base
        + priority_score
        + source_bias
        + specificity.map(|b| b.total()).unwrap_or(0.0);

    FixtureScoreBreakdown {
        fixture_id: fixture.id.clone(),
        base,
        priority_score,
        source_bias,
        specificity,
        total,
        reasons,
    }
}
