//! Validation Checks
//!
//! Each check appends its findings to the shared issue list. Checks never
//! fail; malformed values are clamped and reported instead.
//!
//! `prior` is always the de-duplicated history: every entry has an id
//! different from the candidate's.

use chrono::{DateTime, Duration, Utc};

use crate::core::stats::{mean, std_dev, z_score};
use crate::record::{IssueCode, MatchRecord, Outcome, ValidationIssue};
use super::policy::ValidatorPolicy;

// =============================================================================
// PHYSICAL PLAUSIBILITY
// =============================================================================

/// Negative fields, duration range, per-minute rates, team-score consistency.
pub fn check_physical(
    candidate: &MatchRecord,
    policy: &ValidatorPolicy,
    out: &mut Vec<ValidationIssue>,
) {
    let mut signed_fields = vec![
        ("player_goals", candidate.player_goals),
        ("player_assists", candidate.player_assists),
        ("home_score", candidate.home_score),
        ("away_score", candidate.away_score),
    ];
    if let Some(goals) = candidate.top_scorer_goals {
        signed_fields.push(("top_scorer_goals", goals));
    }
    for (field, value) in signed_fields {
        if value < 0 {
            out.push(ValidationIssue::error(
                IssueCode::NegativeValue,
                format!("{} is negative ({}), treated as 0", field, value),
            ));
        }
    }

    let duration = candidate.duration_minutes;
    if duration < policy.min_duration_minutes || duration > policy.max_duration_minutes {
        out.push(ValidationIssue::error(
            IssueCode::DurationOutOfRange,
            format!(
                "duration of {} minutes is outside [{}, {}]",
                duration, policy.min_duration_minutes, policy.max_duration_minutes
            ),
        ));
    } else {
        let goals = candidate.goals();
        let max_goals = max_events(duration, policy.max_goals_per_minute);
        if goals > max_goals {
            out.push(ValidationIssue::error(
                IssueCode::ImplausibleGoalRate,
                format!("{} goals in {} minutes exceeds the limit of {}", goals, duration, max_goals),
            ));
        }

        let assists = candidate.assists();
        let max_assists = max_events(duration, policy.max_assists_per_minute);
        if assists > max_assists {
            out.push(ValidationIssue::error(
                IssueCode::ImplausibleAssistRate,
                format!("{} assists in {} minutes exceeds the limit of {}", assists, duration, max_assists),
            ));
        }
    }

    let (own_score, _) = candidate.own_and_opponent_score();
    if candidate.goals() > own_score {
        out.push(ValidationIssue::error(
            IssueCode::GoalsExceedTeamScore,
            format!("player scored {} but their team only {}", candidate.goals(), own_score),
        ));
    }
}

/// Largest event count a duration allows at a per-minute rate.
fn max_events(duration_minutes: i32, rate_per_minute: f64) -> u32 {
    let limit = (duration_minutes.max(0) as f64 * rate_per_minute).floor();
    if limit.is_finite() && limit > 0.0 {
        limit.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

// =============================================================================
// STATISTICAL ANOMALY
// =============================================================================

/// Z-score of goals and assists against the player's history.
///
/// Skipped entirely below `min_history_for_statistics`.
pub fn check_statistical(
    candidate: &MatchRecord,
    prior: &[&MatchRecord],
    policy: &ValidatorPolicy,
    out: &mut Vec<ValidationIssue>,
) {
    if prior.len() < policy.min_history_for_statistics {
        return;
    }

    let goals: Vec<f64> = prior.iter().map(|m| m.goals() as f64).collect();
    let assists: Vec<f64> = prior.iter().map(|m| m.assists() as f64).collect();

    let series = [
        ("goals", IssueCode::GoalsStatisticalAnomaly, candidate.goals(), &goals),
        ("assists", IssueCode::AssistsStatisticalAnomaly, candidate.assists(), &assists),
    ];

    for (label, code, value, history) in series {
        let m = mean(history);
        let sd = std_dev(history);
        let z = z_score(value as f64, m, sd, policy.std_dev_floor);
        if z.abs() > policy.z_score_threshold {
            out.push(ValidationIssue::warning(
                code,
                format!(
                    "{} {} is {:.1} standard deviations from the historical mean {:.2} (sd {:.2})",
                    value, label, z, m, sd
                ),
            ));
        }
    }
}

// =============================================================================
// TIMING / SEQUENCE
// =============================================================================

/// Upper bound for configured time windows (one year).
const MAX_WINDOW_SECS: i64 = 365 * 24 * 3600;

/// Future dates, id reuse, reporting order, overlap and cadence.
pub fn check_timing(
    candidate: &MatchRecord,
    history: &[MatchRecord],
    prior: &[&MatchRecord],
    policy: &ValidatorPolicy,
    now: DateTime<Utc>,
    out: &mut Vec<ValidationIssue>,
) {
    let horizon = now
        .checked_add_signed(Duration::seconds(policy.future_tolerance_secs.clamp(0, MAX_WINDOW_SECS)))
        .unwrap_or(now);
    if candidate.date > horizon {
        out.push(ValidationIssue::error(
            IssueCode::FutureDate,
            format!("kick-off {} is after validation time {}", candidate.date, now),
        ));
    }

    // An entry with the same id and identical content is the candidate itself.
    if history.iter().any(|h| h.id == candidate.id && h != candidate) {
        out.push(ValidationIssue::error(
            IssueCode::DuplicateMatchId,
            format!("match id '{}' already used by a different record", candidate.id),
        ));
    }

    if let Some(latest) = prior.iter().map(|m| m.date).max() {
        if candidate.date < latest {
            out.push(ValidationIssue::warning(
                IssueCode::OutOfSequence,
                format!("reported after a match played later ({})", latest),
            ));
        }
    }

    let candidate_end = candidate.end_time();
    let overlapping = prior
        .iter()
        .find(|m| candidate.date < m.end_time() && m.date < candidate_end);

    if let Some(other) = overlapping {
        out.push(ValidationIssue::warning(
            IssueCode::OverlappingMatch,
            format!("overlaps match '{}' played at {}", other.id, other.date),
        ));
        return;
    }

    let previous = prior
        .iter()
        .filter(|m| m.date <= candidate.date)
        .max_by_key(|m| m.date);

    if let Some(prev) = previous {
        let gap = candidate.date - prev.end_time();
        let min_gap = Duration::seconds(
            policy.min_match_interval_minutes.saturating_mul(60).clamp(0, MAX_WINDOW_SECS),
        );
        if gap < min_gap {
            out.push(ValidationIssue::warning(
                IssueCode::ImplausibleCadence,
                format!(
                    "kick-off only {} minutes after match '{}' ended",
                    gap.num_minutes(),
                    prev.id
                ),
            ));
        }
    }
}

// =============================================================================
// PATTERN RECOGNITION
// =============================================================================

/// Repeated scorelines and abrupt form reversals in the recent window.
pub fn check_patterns(
    candidate: &MatchRecord,
    prior: &[&MatchRecord],
    policy: &ValidatorPolicy,
    out: &mut Vec<ValidationIssue>,
) {
    let window = recent_window(candidate, prior, policy.pattern_window);

    let last_delta = candidate.goal_delta();
    let run = window
        .iter()
        .rev()
        .take_while(|m| m.goal_delta() == last_delta)
        .count();
    if policy.max_identical_delta_run > 0 && run >= policy.max_identical_delta_run {
        out.push(ValidationIssue::warning(
            IssueCode::RepeatedScoreline,
            format!("goal difference {:+} repeated in {} consecutive matches", last_delta, run),
        ));
    }

    let form = policy.form_window;
    if form == 0 || window.len() < form.saturating_mul(2) {
        return;
    }
    let (earlier, recent) = window.split_at(window.len() - form);
    let earlier_rate = win_rate(earlier);
    let recent_rate = win_rate(recent);
    if (recent_rate - earlier_rate).abs() >= policy.form_reversal_threshold {
        out.push(ValidationIssue::warning(
            IssueCode::FormReversal,
            format!(
                "win rate moved from {:.0}% to {:.0}% over the last {} matches",
                earlier_rate * 100.0,
                recent_rate * 100.0,
                form
            ),
        ));
    }
}

/// Most recent `size` matches by date with the candidate as the newest entry.
fn recent_window<'a>(
    candidate: &'a MatchRecord,
    prior: &[&'a MatchRecord],
    size: usize,
) -> Vec<&'a MatchRecord> {
    let mut ordered: Vec<&MatchRecord> = prior.to_vec();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let keep = size.saturating_sub(1);
    let start = ordered.len().saturating_sub(keep);
    let mut window: Vec<&MatchRecord> = ordered.split_off(start);
    window.push(candidate);
    window
}

fn win_rate(matches: &[&MatchRecord]) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let wins = matches.iter().filter(|m| m.outcome() == Outcome::Win).count();
    wins as f64 / matches.len() as f64
}
