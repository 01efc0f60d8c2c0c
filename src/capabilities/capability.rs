//! Capability contract: self-assessed fitness plus execution.
//!
//! A capability is the unit of work the router chooses between. It scores its
//! own fitness for a request via [`Capability::check`] and, if selected,
//! produces the response via [`Capability::execute`]. Implementations are
//! polymorphic trait objects selected at configuration time: pattern
//! matchers, ML-scored handlers, anything satisfying the contract.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::message::{RequestMessage, ResponseMessage};

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Fitness score in `[-1.0, 1.0]`.
///
/// `1.0` is a perfect match, `-1.0` definitely unsuitable. Any score strictly
/// greater than [`Score::ACCEPT_THRESHOLD`] is an immediate-accept signal to
/// the selector. Values outside the range are clamped at construction; NaN
/// collapses to the minimum.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Score(f64);

impl Score {
    /// Definitely unsuitable.
    pub const MIN: Score = Score(-1.0);
    /// Perfect match.
    pub const MAX: Score = Score(1.0);
    /// Scores strictly above this are accepted without arbitration.
    pub const ACCEPT_THRESHOLD: f64 = 0.5;

    /// Build a score, clamping into `[-1.0, 1.0]`.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(-1.0, 1.0))
    }

    /// The raw value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether this score short-circuits the fallback arbitration stage.
    pub fn is_immediate_accept(self) -> bool {
        self.0 > Self::ACCEPT_THRESHOLD
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CheckOutcome
// ---------------------------------------------------------------------------

/// Result of a capability's fitness check.
///
/// Abstaining (a scoring dependency is unavailable, for example) ranks like
/// [`Score::MIN`] but is logged distinctly and excluded from the fallback
/// arbiter's candidate list. It is never a pipeline-fatal error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckOutcome {
    /// The capability assessed the request.
    Score(Score),
    /// The capability could not assess the request.
    Abstain,
}

impl CheckOutcome {
    /// Convenience constructor for a scored outcome.
    pub fn score(value: f64) -> Self {
        Self::Score(Score::new(value))
    }

    /// The score used for ranking; abstentions rank at the minimum.
    pub fn effective_score(self) -> Score {
        match self {
            Self::Score(score) => score,
            Self::Abstain => Score::MIN,
        }
    }

    pub fn is_abstain(self) -> bool {
        matches!(self, Self::Abstain)
    }
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// The contract every registered handler satisfies.
///
/// `check` runs speculatively against every registered capability for every
/// request, bounded by the selector's per-check timeout, so it must be quick
/// and must not observably mutate state shared with other capabilities.
/// `execute` is invoked on the single selected capability only, exactly once
/// per request, and may have side effects.
///
/// Checks are expected to be idempotent: the same immutable request with no
/// intervening state change yields the same score. Capabilities scoring off
/// external time-varying dependencies are exempt and must document the
/// non-determinism.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Registry identifier, unique among registered capabilities.
    fn id(&self) -> &str;

    /// Human/LLM-readable description, used by the fallback arbiter.
    fn description(&self) -> &str;

    /// Assess fitness for `request`.
    async fn check(&self, request: &RequestMessage) -> CheckOutcome;

    /// Produce the response for `request`.
    ///
    /// Failures surface to the caller wrapped with this capability's
    /// identifier; they are never swallowed and never retried implicitly.
    async fn execute(&self, request: &RequestMessage) -> Result<ResponseMessage, anyhow::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_clamps_out_of_range_values() {
        assert_eq!(Score::new(2.5).value(), 1.0);
        assert_eq!(Score::new(-7.0).value(), -1.0);
        assert_eq!(Score::new(0.3).value(), 0.3);
    }

    #[test]
    fn nan_collapses_to_minimum() {
        assert_eq!(Score::new(f64::NAN), Score::MIN);
    }

    #[test]
    fn accept_threshold_is_strict() {
        assert!(!Score::new(0.5).is_immediate_accept());
        assert!(Score::new(0.500001).is_immediate_accept());
    }

    #[test]
    fn abstain_ranks_at_minimum_but_stays_distinguishable() {
        let abstain = CheckOutcome::Abstain;
        assert_eq!(abstain.effective_score(), Score::MIN);
        assert!(abstain.is_abstain());
        assert!(!CheckOutcome::score(-1.0).is_abstain());
    }
}
