//! Pluggable heuristic scoring of context vectors.
//!
//! Scores are opaque numbers for callers to display or rank with. Nothing in
//! the core branches on them.

use crate::context::ContextVector;

/// Pure function from a vector to a score, nominally in `[0, 1]`.
pub trait ContextScorer: Send + Sync {
    fn score(&self, vector: &ContextVector) -> f64;
}

impl<F> ContextScorer for F
where
    F: Fn(&ContextVector) -> f64 + Send + Sync,
{
    fn score(&self, vector: &ContextVector) -> f64 {
        self(vector)
    }
}

/// Fraction of the seven core dimensions that are populated.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageScorer;

impl ContextScorer for CoverageScorer {
    fn score(&self, vector: &ContextVector) -> f64 {
        vector.populated_dimensions() as f64 / 7.0
    }
}

/// Run a scorer and force the result into `[0, 1]`; NaN becomes 0.
pub fn bounded_score(scorer: &dyn ContextScorer, vector: &ContextVector) -> f64 {
    let raw = scorer.score(vector);
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}
