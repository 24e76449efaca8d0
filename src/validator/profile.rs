//! Player Profile
//!
//! Rolling averages recomputed on demand from a history snapshot.

use crate::core::stats::mean;
use crate::record::{MatchRecord, PlayerProfile};

/// Build a profile from a match history.
///
/// Means over the whole set, so the result does not depend on order.
/// Negative values count as 0. An empty history yields all zeros.
pub fn build_player_profile(history: &[MatchRecord]) -> PlayerProfile {
    if history.is_empty() {
        return PlayerProfile::default();
    }

    let goals: Vec<f64> = history.iter().map(|m| m.goals() as f64).collect();
    let assists: Vec<f64> = history.iter().map(|m| m.assists() as f64).collect();
    let durations: Vec<f64> = history.iter().map(|m| m.duration() as f64).collect();

    PlayerProfile {
        avg_goals_per_match: mean(&goals),
        avg_assists_per_match: mean(&assists),
        avg_match_duration: mean(&durations),
        total_matches: history.len(),
    }
}
