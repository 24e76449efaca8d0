//! Validator Policy
//!
//! Tunable limits and penalty weights. None of these numbers are structural:
//! the only contracts are that errors weigh at least as much as warnings and
//! that penalties are non-negative.

use serde::{Serialize, Deserialize};

/// Configuration for the statistical validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorPolicy {
    /// Shortest valid match (minutes, inclusive).
    pub min_duration_minutes: i32,
    /// Longest valid match (minutes, inclusive).
    pub max_duration_minutes: i32,
    /// Goal ceiling per minute played (0.5 = one goal every two minutes).
    pub max_goals_per_minute: f64,
    /// Assist ceiling per minute played.
    pub max_assists_per_minute: f64,
    /// History size below which the z-score check is skipped.
    pub min_history_for_statistics: usize,
    /// Absolute z-score above which a stat is anomalous.
    pub z_score_threshold: f64,
    /// Lower bound for the standard deviation used in z-scores.
    pub std_dev_floor: f64,
    /// Allowed clock skew for kick-off dates (seconds).
    pub future_tolerance_secs: i64,
    /// Minimum gap between the end of one match and the next kick-off.
    pub min_match_interval_minutes: i64,
    /// Number of recent matches (candidate included) examined for patterns.
    pub pattern_window: usize,
    /// Identical goal-delta run length that triggers a warning.
    pub max_identical_delta_run: usize,
    /// Number of most recent matches forming the "current form".
    pub form_window: usize,
    /// Absolute win-rate change that counts as a reversal.
    pub form_reversal_threshold: f64,
    /// Penalty per error.
    pub error_penalty: f64,
    /// Penalty per warning.
    pub warning_penalty: f64,
    /// Scores strictly below this are suspicious.
    pub suspicion_threshold: f64,
}

impl Default for ValidatorPolicy {
    fn default() -> Self {
        Self {
            min_duration_minutes: 1,
            max_duration_minutes: 180,
            max_goals_per_minute: 0.5,
            max_assists_per_minute: 0.5,
            min_history_for_statistics: 5,
            z_score_threshold: 3.0,
            std_dev_floor: 0.5,
            future_tolerance_secs: 0,
            min_match_interval_minutes: 5,
            pattern_window: 10,
            max_identical_delta_run: 5,
            form_window: 5,
            form_reversal_threshold: 0.8,
            error_penalty: 20.0,
            warning_penalty: 8.0,
            suspicion_threshold: 70.0,
        }
    }
}

impl ValidatorPolicy {
    /// Check the structural constraints on the policy.
    pub fn check(&self) -> Result<(), String> {
        if self.min_duration_minutes > self.max_duration_minutes {
            return Err("min_duration_minutes exceeds max_duration_minutes".into());
        }
        if !(self.error_penalty >= 0.0 && self.warning_penalty >= 0.0) {
            return Err("penalties must be non-negative".into());
        }
        if self.error_penalty < self.warning_penalty {
            return Err("error_penalty must be at least warning_penalty".into());
        }
        if self.form_window == 0 || self.pattern_window == 0 {
            return Err("pattern windows must be non-empty".into());
        }
        if self.form_window.saturating_mul(2) > self.pattern_window {
            return Err("pattern_window must hold two form windows".into());
        }
        Ok(())
    }
}
