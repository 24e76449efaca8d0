//! Statistical Validator
//!
//! Scores a reported match against the reporting player's own history.
//!
//! ## Checks
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  physical     - negative fields, duration, per-minute rates  │
//! │  statistical  - z-score of goals/assists (≥ N samples)       │
//! │  timing       - future date, id reuse, order, cadence        │
//! │  patterns     - repeated scorelines, form reversal           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors invalidate the match; warnings only lower the score. The validator
//! never fails: every problem becomes a [`ValidationIssue`].

pub mod checks;
pub mod policy;
pub mod profile;

use chrono::{DateTime, Utc};
#[cfg(feature = "debug-tracing")]
use tracing::debug;

use crate::record::{MatchRecord, PlayerProfile, Severity, ValidationIssue, ValidationResult};

pub use policy::ValidatorPolicy;
pub use profile::build_player_profile;

/// Base score before penalties.
pub const MAX_SCORE: f64 = 100.0;

/// Stateless match validator.
///
/// Holds only its policy, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct MatchValidator {
    policy: ValidatorPolicy,
}

impl MatchValidator {
    /// Create a validator with the given policy.
    pub fn new(policy: ValidatorPolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    pub fn policy(&self) -> &ValidatorPolicy {
        &self.policy
    }

    /// Validate against the current wall clock.
    pub fn validate(&self, candidate: &MatchRecord, history: &[MatchRecord]) -> ValidationResult {
        self.validate_at(candidate, history, Utc::now())
    }

    /// Validate as of `now`.
    ///
    /// `history` may contain the candidate itself; it is never double-counted.
    pub fn validate_at(
        &self,
        candidate: &MatchRecord,
        history: &[MatchRecord],
        now: DateTime<Utc>,
    ) -> ValidationResult {
        let prior: Vec<&MatchRecord> = history.iter().filter(|m| m.id != candidate.id).collect();

        let mut findings = Vec::new();
        checks::check_physical(candidate, &self.policy, &mut findings);
        checks::check_statistical(candidate, &prior, &self.policy, &mut findings);
        checks::check_timing(candidate, history, &prior, &self.policy, now, &mut findings);
        checks::check_patterns(candidate, &prior, &self.policy, &mut findings);

        trace_findings(candidate, &findings);

        into_result(findings, &self.policy)
    }

    /// Suspicious if the score is below the threshold or any error is present.
    pub fn is_suspicious(&self, result: &ValidationResult) -> bool {
        is_suspicious(result, &self.policy)
    }

    /// Rolling averages over `history`.
    pub fn build_player_profile(&self, history: &[MatchRecord]) -> PlayerProfile {
        build_player_profile(history)
    }
}

#[cfg(feature = "debug-tracing")]
fn trace_findings(candidate: &MatchRecord, findings: &[ValidationIssue]) {
    for finding in findings {
        debug!(match_id = %candidate.id, code = %finding.code, "{}", finding.message);
    }
}

#[cfg(not(feature = "debug-tracing"))]
fn trace_findings(_candidate: &MatchRecord, _findings: &[ValidationIssue]) {}

/// Suspicion predicate for a given policy.
///
/// A score exactly at the threshold is not suspicious on its own.
pub fn is_suspicious(result: &ValidationResult, policy: &ValidatorPolicy) -> bool {
    result.score < policy.suspicion_threshold
        || result.issues.iter().any(|i| i.severity == Severity::Error)
}

/// Score a set of findings: `100 − Σ penalties`, floored at 0.
pub fn score_findings(findings: &[ValidationIssue], policy: &ValidatorPolicy) -> f64 {
    let penalty: f64 = findings
        .iter()
        .map(|f| match f.severity {
            Severity::Error => policy.error_penalty.max(0.0),
            Severity::Warning => policy.warning_penalty.max(0.0),
        })
        .sum();
    (MAX_SCORE - penalty).clamp(0.0, MAX_SCORE)
}

/// Split findings by severity and compute the score.
pub fn into_result(findings: Vec<ValidationIssue>, policy: &ValidatorPolicy) -> ValidationResult {
    let score = score_findings(&findings, policy);
    let (issues, warnings): (Vec<_>, Vec<_>) = findings
        .into_iter()
        .partition(|f| f.severity == Severity::Error);

    ValidationResult {
        is_valid: issues.is_empty(),
        score,
        issues,
        warnings,
    }
}
