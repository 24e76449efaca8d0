//! Match Records
//!
//! The immutable facts about one played match, as reported upstream.
//! Extra box-score fields use BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Deserialize};

/// Match identifier (unique per match per reporting player).
pub type MatchId = String;

// =============================================================================
// SIDE / OUTCOME
// =============================================================================

/// Which team the reporting player played for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Home team
    #[default]
    Home,
    /// Away team
    Away,
}

/// Match outcome from the reporting player's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Player's team scored more
    Win,
    /// Equal scores
    Draw,
    /// Opponent scored more
    Loss,
}

// =============================================================================
// MATCH RECORD
// =============================================================================

/// One reported match.
///
/// Numeric box-score fields are signed so that malformed upstream values
/// survive deserialization; the validator clamps and reports them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Unique match identifier.
    pub id: MatchId,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Kick-off instant.
    pub date: DateTime<Utc>,
    /// Minutes played.
    pub duration_minutes: i32,
    /// Goals scored by the reporting player.
    pub player_goals: i32,
    /// Assists by the reporting player.
    pub player_assists: i32,
    /// Final home score.
    pub home_score: i32,
    /// Final away score.
    pub away_score: i32,
    /// Team the reporting player played for.
    #[serde(default)]
    pub player_side: Side,
    /// Match top scorer, if known.
    #[serde(default)]
    pub top_scorer: Option<String>,
    /// Goals by the top scorer, if known.
    #[serde(default)]
    pub top_scorer_goals: Option<i32>,
    /// Any other box-score fields (shots, saves, ...).
    #[serde(default)]
    pub extra_stats: BTreeMap<String, i64>,
}

impl MatchRecord {
    /// Create a record with the required facts; optional fields empty.
    pub fn new(
        id: impl Into<MatchId>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            date,
            duration_minutes: 90,
            player_goals: 0,
            player_assists: 0,
            home_score: 0,
            away_score: 0,
            player_side: Side::Home,
            top_scorer: None,
            top_scorer_goals: None,
            extra_stats: BTreeMap::new(),
        }
    }

    /// Set the final score.
    pub fn with_score(mut self, home: i32, away: i32) -> Self {
        self.home_score = home;
        self.away_score = away;
        self
    }

    /// Set the reporting player's goals and assists.
    pub fn with_player_stats(mut self, goals: i32, assists: i32) -> Self {
        self.player_goals = goals;
        self.player_assists = assists;
        self
    }

    /// Set the match duration.
    pub fn with_duration(mut self, minutes: i32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Set which side the player played on.
    pub fn with_side(mut self, side: Side) -> Self {
        self.player_side = side;
        self
    }

    /// Set the top scorer.
    pub fn with_top_scorer(mut self, name: impl Into<String>, goals: i32) -> Self {
        self.top_scorer = Some(name.into());
        self.top_scorer_goals = Some(goals);
        self
    }

    /// Goals clamped to zero.
    #[inline]
    pub fn goals(&self) -> u32 {
        self.player_goals.max(0) as u32
    }

    /// Assists clamped to zero.
    #[inline]
    pub fn assists(&self) -> u32 {
        self.player_assists.max(0) as u32
    }

    /// Duration clamped to zero.
    #[inline]
    pub fn duration(&self) -> u32 {
        self.duration_minutes.max(0) as u32
    }

    /// (own score, opponent score), both clamped to zero.
    pub fn own_and_opponent_score(&self) -> (u32, u32) {
        let home = self.home_score.max(0) as u32;
        let away = self.away_score.max(0) as u32;
        match self.player_side {
            Side::Home => (home, away),
            Side::Away => (away, home),
        }
    }

    /// Own score minus opponent score.
    pub fn goal_delta(&self) -> i64 {
        let (own, opp) = self.own_and_opponent_score();
        own as i64 - opp as i64
    }

    /// Outcome for the reporting player.
    pub fn outcome(&self) -> Outcome {
        match self.goal_delta() {
            d if d > 0 => Outcome::Win,
            0 => Outcome::Draw,
            _ => Outcome::Loss,
        }
    }

    /// Instant the match ended (kick-off plus clamped duration).
    pub fn end_time(&self) -> DateTime<Utc> {
        self.date
            .checked_add_signed(Duration::minutes(self.duration() as i64))
            .unwrap_or(self.date)
    }
}
