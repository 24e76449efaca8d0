//! Fairness Rating
//!
//! Composes validation results across a player's history into one
//! human-facing tier. Tier cutoffs live in a [`RatingTable`] so they can be
//! tuned without touching validation logic.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::record::{MatchRecord, ValidationResult};
use crate::validator::{is_suspicious, MatchValidator, ValidatorPolicy};

/// Fairness tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FairnessRating {
    /// Near-perfect history.
    Excellent,
    /// Minor irregularities.
    Good,
    /// Noticeable irregularities.
    Fair,
    /// Frequent or severe irregularities.
    Poor,
    /// No matches to rate.
    Unrated,
}

impl std::fmt::Display for FairnessRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FairnessRating::Excellent => "Excellent",
            FairnessRating::Good => "Good",
            FairnessRating::Fair => "Fair",
            FairnessRating::Poor => "Poor",
            FairnessRating::Unrated => "Unrated",
        };
        write!(f, "{s}")
    }
}

/// One row of the rating table. All conditions must hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingTier {
    /// Tier awarded when the row matches.
    pub rating: FairnessRating,
    /// Minimum average score.
    pub min_average_score: f64,
    /// Maximum share of suspicious matches (0.0..=1.0).
    pub max_suspicious_fraction: f64,
    /// Minimum number of rated matches.
    pub min_matches: usize,
}

/// Ordered tiers; the first matching row wins, otherwise [`FairnessRating::Poor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    /// Rows from best to worst.
    pub tiers: Vec<RatingTier>,
}

impl Default for RatingTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                RatingTier {
                    rating: FairnessRating::Excellent,
                    min_average_score: 95.0,
                    max_suspicious_fraction: 0.0,
                    min_matches: 5,
                },
                RatingTier {
                    rating: FairnessRating::Good,
                    min_average_score: 85.0,
                    max_suspicious_fraction: 0.10,
                    min_matches: 1,
                },
                RatingTier {
                    rating: FairnessRating::Fair,
                    min_average_score: 70.0,
                    max_suspicious_fraction: 0.25,
                    min_matches: 1,
                },
            ],
        }
    }
}

impl RatingTable {
    /// Look up the tier for aggregate figures.
    pub fn rate(&self, average_score: f64, suspicious_count: usize, total_matches: usize) -> FairnessRating {
        if total_matches == 0 {
            return FairnessRating::Unrated;
        }
        let suspicious_fraction = suspicious_count as f64 / total_matches as f64;

        self.tiers
            .iter()
            .find(|tier| {
                average_score >= tier.min_average_score
                    && suspicious_fraction <= tier.max_suspicious_fraction
                    && total_matches >= tier.min_matches
            })
            .map(|tier| tier.rating)
            .unwrap_or(FairnessRating::Poor)
    }
}

/// Aggregate view over a player's validation results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    /// Assigned tier.
    pub rating: FairnessRating,
    /// Mean validation score (0 when empty).
    pub average_score: f64,
    /// Results for which `is_suspicious` holds.
    pub suspicious_count: usize,
    /// Number of results rated.
    pub total_matches: usize,
}

impl FairnessReport {
    /// Build a report from already-computed results.
    pub fn from_results(
        results: &[ValidationResult],
        policy: &ValidatorPolicy,
        table: &RatingTable,
    ) -> Self {
        let total_matches = results.len();
        let suspicious_count = results.iter().filter(|r| is_suspicious(r, policy)).count();
        let average_score = if total_matches == 0 {
            0.0
        } else {
            results.iter().map(|r| r.score).sum::<f64>() / total_matches as f64
        };

        Self {
            rating: table.rate(average_score, suspicious_count, total_matches),
            average_score,
            suspicious_count,
            total_matches,
        }
    }
}

/// Validate each match against the matches that preceded it and rate the lot.
///
/// Matches are replayed in date order; `results[i]` belongs to `history[i]`.
pub fn assess_history(
    validator: &MatchValidator,
    table: &RatingTable,
    history: &[MatchRecord],
    now: DateTime<Utc>,
) -> (Vec<ValidationResult>, FairnessReport) {
    let mut order: Vec<usize> = (0..history.len()).collect();
    order.sort_by(|&a, &b| {
        history[a]
            .date
            .cmp(&history[b].date)
            .then_with(|| history[a].id.cmp(&history[b].id))
    });

    let mut seen: Vec<MatchRecord> = Vec::with_capacity(history.len());
    let mut indexed = Vec::with_capacity(history.len());
    for i in order {
        indexed.push((i, validator.validate_at(&history[i], &seen, now)));
        seen.push(history[i].clone());
    }
    indexed.sort_by_key(|(i, _)| *i);
    let results: Vec<ValidationResult> = indexed.into_iter().map(|(_, r)| r).collect();

    let report = FairnessReport::from_results(&results, validator.policy(), table);
    (results, report)
}
