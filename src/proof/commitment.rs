//! Match Commitment
//!
//! Derives the attested facts from a match record, hashes them canonically,
//! and defines the records kept per committed match.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::hash::{CanonicalHasher, Digest32};
use crate::record::{MatchId, MatchRecord, Side};

/// Payload format version.
pub const PAYLOAD_VERSION: u8 = 1;

/// Chain transaction handle.
pub type TxHash = String;

// =============================================================================
// ATTESTED RESULT
// =============================================================================

/// The minimal fact being attested: who played and how it ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedResult {
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Final home score.
    pub home_score: i32,
    /// Final away score.
    pub away_score: i32,
    /// Top scorer, if known.
    pub top_scorer: Option<String>,
    /// Top scorer goals, if known.
    pub top_scorer_goals: Option<i32>,
}

impl AttestedResult {
    /// Extract the attested fields from a record.
    pub fn from_record(record: &MatchRecord) -> Self {
        Self {
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            home_score: record.home_score,
            away_score: record.away_score,
            top_scorer: record.top_scorer.clone(),
            top_scorer_goals: record.top_scorer_goals,
        }
    }

    /// Canonical result hash.
    ///
    /// Field order is fixed; strings are length-prefixed; optionals carry a
    /// presence byte.
    pub fn hash(&self) -> Digest32 {
        let mut hasher = CanonicalHasher::for_result();
        hasher.update_str(&self.home_team);
        hasher.update_str(&self.away_team);
        hasher.update_i32(self.home_score);
        hasher.update_i32(self.away_score);
        hasher.update_opt_str(self.top_scorer.as_deref());
        hasher.update_opt_i32(self.top_scorer_goals);
        hasher.finalize()
    }
}

/// Result hash of a record.
pub fn compute_result_hash(record: &MatchRecord) -> Digest32 {
    AttestedResult::from_record(record).hash()
}

/// Hash over every field of a record, extra stats in key order.
pub fn compute_match_data_hash(record: &MatchRecord) -> Digest32 {
    let mut hasher = CanonicalHasher::for_match_data();
    hasher.update_str(&record.id);
    hasher.update_str(&record.home_team);
    hasher.update_str(&record.away_team);
    hasher.update_i64(record.date.timestamp());
    hasher.update_u32(record.date.timestamp_subsec_nanos());
    hasher.update_i32(record.duration_minutes);
    hasher.update_i32(record.player_goals);
    hasher.update_i32(record.player_assists);
    hasher.update_i32(record.home_score);
    hasher.update_i32(record.away_score);
    hasher.update_u8(match record.player_side {
        Side::Home => 0,
        Side::Away => 1,
    });
    hasher.update_opt_str(record.top_scorer.as_deref());
    hasher.update_opt_i32(record.top_scorer_goals);

    hasher.update_u32(record.extra_stats.len() as u32);
    for (key, value) in &record.extra_stats {
        hasher.update_str(key);
        hasher.update_i64(*value);
    }

    hasher.finalize()
}

// =============================================================================
// ON-CHAIN RECORDS
// =============================================================================

/// Durable summary stored once per committed match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OnChainMatchSummary {
    /// Committed match.
    pub match_id: MatchId,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Final home score.
    pub home_score: i32,
    /// Final away score.
    pub away_score: i32,
    /// Top scorer, if known.
    pub top_scorer: Option<String>,
    /// Top scorer goals, if known.
    pub top_scorer_goals: Option<i32>,
    /// Commitment time.
    pub timestamp: DateTime<Utc>,
    /// Hash of the attested result.
    pub result_hash: Digest32,
    /// Hash of the full record, when full attestation is enabled.
    pub match_data_hash: Option<Digest32>,
}

impl OnChainMatchSummary {
    /// Build the summary for a record at `timestamp`.
    pub fn from_record(record: &MatchRecord, timestamp: DateTime<Utc>, attest_full_record: bool) -> Self {
        let result = AttestedResult::from_record(record);
        let result_hash = result.hash();
        Self {
            match_id: record.id.clone(),
            home_team: result.home_team,
            away_team: result.away_team,
            home_score: result.home_score,
            away_score: result.away_score,
            top_scorer: result.top_scorer,
            top_scorer_goals: result.top_scorer_goals,
            timestamp,
            result_hash,
            match_data_hash: attest_full_record.then(|| compute_match_data_hash(record)),
        }
    }

    /// The attested facts as stored.
    pub fn attested_result(&self) -> AttestedResult {
        AttestedResult {
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home_score: self.home_score,
            away_score: self.away_score,
            top_scorer: self.top_scorer.clone(),
            top_scorer_goals: self.top_scorer_goals,
        }
    }
}

/// Transaction lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Submitted, awaiting inclusion.
    Pending,
    /// Included in a block.
    Confirmed,
    /// Rejected or dropped.
    Failed,
}

impl TransactionStatus {
    /// Confirmed or failed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Commitment transaction for one match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OnChainTransaction {
    /// Committed match.
    pub match_id: MatchId,
    /// Chain handle. `None` only if the chain refused before issuing one.
    pub tx_hash: Option<TxHash>,
    /// Inclusion block; set only when confirmed.
    pub block_number: Option<u64>,
    /// Current status.
    pub status: TransactionStatus,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Failure reason, if failed.
    pub failure_reason: Option<String>,
}

impl OnChainTransaction {
    /// Fresh pending transaction.
    pub fn pending(match_id: MatchId, tx_hash: TxHash, submitted_at: DateTime<Utc>) -> Self {
        Self {
            match_id,
            tx_hash: Some(tx_hash),
            block_number: None,
            status: TransactionStatus::Pending,
            submitted_at,
            failure_reason: None,
        }
    }

    /// Transaction refused at submission.
    pub fn rejected(match_id: MatchId, reason: String, submitted_at: DateTime<Utc>) -> Self {
        Self {
            match_id,
            tx_hash: None,
            block_number: None,
            status: TransactionStatus::Failed,
            submitted_at,
            failure_reason: Some(reason),
        }
    }
}

// =============================================================================
// CHAIN PAYLOAD
// =============================================================================

/// Bytes handed to the chain client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitmentPayload {
    /// Format version.
    pub version: u8,
    /// Committed match.
    pub match_id: MatchId,
    /// Attested result hash.
    pub result_hash: Digest32,
    /// Full record hash, if computed.
    pub match_data_hash: Option<Digest32>,
}

impl CommitmentPayload {
    /// Payload for a summary.
    pub fn from_summary(summary: &OnChainMatchSummary) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            match_id: summary.match_id.clone(),
            result_hash: summary.result_hash,
            match_data_hash: summary.match_data_hash,
        }
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> MatchRecord {
        MatchRecord::new("m1", "Lions", "Tigers", Utc.with_ymd_and_hms(2026, 4, 2, 19, 0, 0).unwrap())
            .with_score(3, 1)
            .with_player_stats(2, 1)
            .with_top_scorer("Vega", 2)
    }

    #[test]
    fn test_result_hash_determinism() {
        assert_eq!(compute_result_hash(&record()), compute_result_hash(&record()));
    }

    #[test]
    fn test_result_hash_ignores_non_attested_fields() {
        let mut other = record();
        other.id = "different".into();
        other.player_assists = 7;
        other.extra_stats.insert("shots".into(), 9);

        assert_eq!(compute_result_hash(&record()), compute_result_hash(&other));
        assert_ne!(compute_match_data_hash(&record()), compute_match_data_hash(&other));
    }

    #[test]
    fn test_each_attested_field_changes_hash() {
        let base = compute_result_hash(&record());

        let mutations: Vec<Box<dyn Fn(&mut MatchRecord)>> = vec![
            Box::new(|r: &mut MatchRecord| r.home_team.push('s')),
            Box::new(|r: &mut MatchRecord| r.away_team = "Bears".into()),
            Box::new(|r: &mut MatchRecord| r.home_score += 1),
            Box::new(|r: &mut MatchRecord| r.away_score -= 1),
            Box::new(|r: &mut MatchRecord| r.top_scorer = None),
            Box::new(|r: &mut MatchRecord| r.top_scorer_goals = Some(3)),
        ];

        for mutate in mutations {
            let mut r = record();
            mutate(&mut r);
            assert_ne!(compute_result_hash(&r), base);
        }
    }

    #[test]
    fn test_swapped_scores_differ() {
        let swapped = record().with_score(1, 3);
        assert_ne!(compute_result_hash(&record()), compute_result_hash(&swapped));
    }

    #[test]
    fn test_match_data_hash_stable_under_json_key_order() {
        let a: MatchRecord = serde_json::from_str(
            r#"{"id":"x","home_team":"A","away_team":"B","date":"2026-01-01T00:00:00Z",
                "duration_minutes":90,"player_goals":1,"player_assists":0,"home_score":1,"away_score":0,
                "extra_stats":{"shots":4,"saves":2}}"#,
        )
        .unwrap();
        let b: MatchRecord = serde_json::from_str(
            r#"{"extra_stats":{"saves":2,"shots":4},"away_score":0,"home_score":1,"player_assists":0,
                "player_goals":1,"duration_minutes":90,"date":"2026-01-01T00:00:00+00:00",
                "away_team":"B","home_team":"A","id":"x"}"#,
        )
        .unwrap();

        assert_eq!(compute_match_data_hash(&a), compute_match_data_hash(&b));
        assert_eq!(compute_result_hash(&a), compute_result_hash(&b));
    }

    #[test]
    fn test_summary_optional_data_hash() {
        let now = Utc::now();
        let with = OnChainMatchSummary::from_record(&record(), now, true);
        let without = OnChainMatchSummary::from_record(&record(), now, false);

        assert!(with.match_data_hash.is_some());
        assert!(without.match_data_hash.is_none());
        assert_eq!(with.result_hash, without.result_hash);
        assert_eq!(with.attested_result().hash(), with.result_hash);
    }

    #[test]
    fn test_payload_bytes() {
        let summary = OnChainMatchSummary::from_record(&record(), Utc::now(), true);
        let payload = CommitmentPayload::from_summary(&summary);
        let bytes = payload.to_bytes().unwrap();
        assert_eq!(CommitmentPayload::from_bytes(&bytes).unwrap(), payload);
    }
}
