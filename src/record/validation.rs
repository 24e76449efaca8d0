//! Validation Output Types
//!
//! Values produced fresh on every validation call. Never persisted on their own.

use serde::{Serialize, Deserialize};

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Invalidates the match.
    Error,
    /// Lowers the score only.
    Warning,
}

/// Stable issue codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// A goal, assist or score field was negative.
    NegativeValue,
    /// Duration outside the configured range.
    DurationOutOfRange,
    /// More goals than the per-minute rate allows.
    ImplausibleGoalRate,
    /// More assists than the per-minute rate allows.
    ImplausibleAssistRate,
    /// Player scored more than their own team.
    GoalsExceedTeamScore,
    /// Goals deviate from the player's history.
    GoalsStatisticalAnomaly,
    /// Assists deviate from the player's history.
    AssistsStatisticalAnomaly,
    /// Kick-off lies in the future.
    FutureDate,
    /// Another history entry already uses this id.
    DuplicateMatchId,
    /// Reported before a match that was played later.
    OutOfSequence,
    /// Overlaps another match in time.
    OverlappingMatch,
    /// Too little time since the previous match.
    ImplausibleCadence,
    /// Identical goal deltas repeated too often.
    RepeatedScoreline,
    /// Sudden win-rate reversal.
    FormReversal,
}

impl IssueCode {
    /// Stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NegativeValue => "NEGATIVE_VALUE",
            Self::DurationOutOfRange => "DURATION_OUT_OF_RANGE",
            Self::ImplausibleGoalRate => "IMPLAUSIBLE_GOAL_RATE",
            Self::ImplausibleAssistRate => "IMPLAUSIBLE_ASSIST_RATE",
            Self::GoalsExceedTeamScore => "GOALS_EXCEED_TEAM_SCORE",
            Self::GoalsStatisticalAnomaly => "GOALS_STATISTICAL_ANOMALY",
            Self::AssistsStatisticalAnomaly => "ASSISTS_STATISTICAL_ANOMALY",
            Self::FutureDate => "FUTURE_DATE",
            Self::DuplicateMatchId => "DUPLICATE_MATCH_ID",
            Self::OutOfSequence => "OUT_OF_SEQUENCE",
            Self::OverlappingMatch => "OVERLAPPING_MATCH",
            Self::ImplausibleCadence => "IMPLAUSIBLE_CADENCE",
            Self::RepeatedScoreline => "REPEATED_SCORELINE",
            Self::FormReversal => "FORM_REVERSAL",
        }
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding about a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Machine-readable code.
    pub code: IssueCode,
    /// Human-readable explanation.
    pub message: String,
    /// Error or warning.
    pub severity: Severity,
}

impl ValidationIssue {
    /// Create an error-severity issue.
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), severity: Severity::Error }
    }

    /// Create a warning-severity issue.
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), severity: Severity::Warning }
    }
}

/// Outcome of validating one match.
///
/// `issues` holds errors only, `warnings` holds warnings only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// False iff at least one error is present.
    pub is_valid: bool,
    /// 0..=100, severity-weighted.
    pub score: f64,
    /// Error-severity issues.
    pub issues: Vec<ValidationIssue>,
    /// Warning-severity issues.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Check whether a given code was raised at any severity.
    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().chain(self.warnings.iter()).any(|i| i.code == code)
    }

    /// Total number of findings.
    pub fn finding_count(&self) -> usize {
        self.issues.len() + self.warnings.len()
    }
}

/// Rolling averages over a player's history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Mean goals per match.
    pub avg_goals_per_match: f64,
    /// Mean assists per match.
    pub avg_assists_per_match: f64,
    /// Mean match duration in minutes.
    pub avg_match_duration: f64,
    /// Number of matches in the history.
    pub total_matches: usize,
}
