//! Attestation Report
//!
//! Plain-text export of a committed summary. Attested facts are written
//! verbatim, one `Label: value` per line, so a reader holding only the
//! report can recompute the result hash. Backslash, line feed and carriage
//! return inside text values are written as `\\`, `\n` and `\r`.
//!
//! ```text
//! MATCH RESULT ATTESTATION
//! ========================
//! Match ID: m-2026-05-09
//! Home Team: Lions
//! Away Team: Tigers
//! Home Score: 2
//! Away Score: 0
//! Top Scorer: Okafor          (only if known)
//! Top Scorer Goals: 1         (only if known)
//! Timestamp: 2026-05-09T22:01:13Z
//! Result Hash: 5f1c...
//! Data Hash: 09ab...          (only if full attestation is on)
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{from_hex, to_hex, Digest32};
use crate::proof::commitment::{AttestedResult, OnChainMatchSummary};
use crate::record::MatchId;

const TITLE: &str = "MATCH RESULT ATTESTATION";

const MATCH_ID: &str = "Match ID";
const HOME_TEAM: &str = "Home Team";
const AWAY_TEAM: &str = "Away Team";
const HOME_SCORE: &str = "Home Score";
const AWAY_SCORE: &str = "Away Score";
const TOP_SCORER: &str = "Top Scorer";
const TOP_SCORER_GOALS: &str = "Top Scorer Goals";
const TIMESTAMP: &str = "Timestamp";
const RESULT_HASH: &str = "Result Hash";
const DATA_HASH: &str = "Data Hash";

const LABELS: [&str; 10] = [
    MATCH_ID,
    HOME_TEAM,
    AWAY_TEAM,
    HOME_SCORE,
    AWAY_SCORE,
    TOP_SCORER,
    TOP_SCORER_GOALS,
    TIMESTAMP,
    RESULT_HASH,
    DATA_HASH,
];

/// Report parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// A required line is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// A numeric field did not parse.
    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber {
        /// Field label.
        field: &'static str,
        /// Raw value.
        value: String,
    },
    /// A hash field is not 64 hex characters.
    #[error("invalid hash for {field}: {value:?}")]
    InvalidHash {
        /// Field label.
        field: &'static str,
        /// Raw value.
        value: String,
    },
    /// The timestamp is not RFC 3339.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Facts recovered from a report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportFacts {
    /// Committed match.
    pub match_id: MatchId,
    /// Attested result as printed.
    pub result: AttestedResult,
    /// Commitment time.
    pub timestamp: DateTime<Utc>,
    /// Printed result hash.
    pub result_hash: Digest32,
    /// Printed full-record hash, if any.
    pub match_data_hash: Option<Digest32>,
}

impl ReportFacts {
    /// Recompute the result hash from the printed facts.
    pub fn verify(&self) -> bool {
        self.result.hash() == self.result_hash
    }
}

/// Render the plain-text report for a summary.
pub fn render_report(summary: &OnChainMatchSummary) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "{}", "=".repeat(TITLE.len()));
    let _ = writeln!(out, "{MATCH_ID}: {}", escape(&summary.match_id));
    let _ = writeln!(out, "{HOME_TEAM}: {}", escape(&summary.home_team));
    let _ = writeln!(out, "{AWAY_TEAM}: {}", escape(&summary.away_team));
    let _ = writeln!(out, "{HOME_SCORE}: {}", summary.home_score);
    let _ = writeln!(out, "{AWAY_SCORE}: {}", summary.away_score);
    if let Some(scorer) = &summary.top_scorer {
        let _ = writeln!(out, "{TOP_SCORER}: {}", escape(scorer));
    }
    if let Some(goals) = summary.top_scorer_goals {
        let _ = writeln!(out, "{TOP_SCORER_GOALS}: {goals}");
    }
    let _ = writeln!(
        out,
        "{TIMESTAMP}: {}",
        summary.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    );
    let _ = writeln!(out, "{RESULT_HASH}: {}", to_hex(&summary.result_hash));
    if let Some(data_hash) = &summary.match_data_hash {
        let _ = writeln!(out, "{DATA_HASH}: {}", to_hex(data_hash));
    }
    out
}

/// Recover the attested facts from a rendered report.
///
/// Values are taken verbatim after `Label: `; the first occurrence of a
/// label wins and unknown lines are ignored.
pub fn parse_report(text: &str) -> Result<ReportFacts, ReportError> {
    let mut fields: BTreeMap<&'static str, &str> = BTreeMap::new();
    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        for label in LABELS {
            let value = line.strip_prefix(label).and_then(|rest| rest.strip_prefix(": "));
            if let Some(value) = value {
                fields.entry(label).or_insert(value);
                break;
            }
        }
    }

    let required = |label: &'static str| fields.get(label).copied().ok_or(ReportError::MissingField(label));

    let result = AttestedResult {
        home_team: unescape(required(HOME_TEAM)?),
        away_team: unescape(required(AWAY_TEAM)?),
        home_score: parse_number(HOME_SCORE, required(HOME_SCORE)?)?,
        away_score: parse_number(AWAY_SCORE, required(AWAY_SCORE)?)?,
        top_scorer: fields.get(TOP_SCORER).map(|s| unescape(s)),
        top_scorer_goals: fields
            .get(TOP_SCORER_GOALS)
            .map(|v| parse_number(TOP_SCORER_GOALS, v))
            .transpose()?,
    };

    let raw_timestamp = required(TIMESTAMP)?;
    let timestamp = DateTime::parse_from_rfc3339(raw_timestamp)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ReportError::InvalidTimestamp(raw_timestamp.to_string()))?;

    Ok(ReportFacts {
        match_id: unescape(required(MATCH_ID)?),
        result,
        timestamp,
        result_hash: parse_hash(RESULT_HASH, required(RESULT_HASH)?)?,
        match_data_hash: fields.get(DATA_HASH).map(|v| parse_hash(DATA_HASH, v)).transpose()?,
    })
}

/// Keep a text value on one line.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape`]. Unknown escapes are kept as written.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_number(field: &'static str, value: &str) -> Result<i32, ReportError> {
    value.parse().map_err(|_| ReportError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_hash(field: &'static str, value: &str) -> Result<Digest32, ReportError> {
    from_hex(value).ok_or_else(|| ReportError::InvalidHash {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MatchRecord;
    use chrono::TimeZone;

    fn summary(full: bool) -> OnChainMatchSummary {
        let record = MatchRecord::new("m-7", "Real Lions", "Tigers FC", Utc.with_ymd_and_hms(2026, 5, 9, 20, 0, 0).unwrap())
            .with_score(2, 2)
            .with_top_scorer("Ana María", 2);
        OnChainMatchSummary::from_record(&record, Utc.with_ymd_and_hms(2026, 5, 9, 22, 1, 13).unwrap(), full)
    }

    #[test]
    fn test_report_contains_facts_verbatim() {
        let s = summary(true);
        let report = render_report(&s);

        assert!(report.starts_with(TITLE));
        assert!(report.contains("Home Team: Real Lions\n"));
        assert!(report.contains("Away Team: Tigers FC\n"));
        assert!(report.contains("Top Scorer: Ana María\n"));
        assert!(report.contains(&format!("Result Hash: {}\n", to_hex(&s.result_hash))));
        assert!(report.contains("Data Hash: "));
    }

    #[test]
    fn test_parsed_report_rehashes() {
        let s = summary(true);
        let facts = parse_report(&render_report(&s)).unwrap();

        assert!(facts.verify());
        assert_eq!(facts.result, s.attested_result());
        assert_eq!(facts.timestamp, s.timestamp);
        assert_eq!(facts.match_data_hash, s.match_data_hash);
    }

    #[test]
    fn test_edited_report_fails_verification() {
        let report = render_report(&summary(false)).replace("Home Score: 2", "Home Score: 3");
        let facts = parse_report(&report).unwrap();
        assert!(!facts.verify());
    }

    #[test]
    fn test_optional_lines_omitted() {
        let record = MatchRecord::new("m-8", "A", "B", Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let s = OnChainMatchSummary::from_record(&record, Utc::now(), false);
        let report = render_report(&s);

        assert!(!report.contains(TOP_SCORER));
        assert!(!report.contains(DATA_HASH));

        let facts = parse_report(&report).unwrap();
        assert_eq!(facts.result.top_scorer, None);
        assert_eq!(facts.result.top_scorer_goals, None);
        assert!(facts.verify());
    }

    #[test]
    fn test_multiline_names_survive_round_trip() {
        let record = MatchRecord::new("m\\9", "Lions\nReserves", "Tigers\r\nB", Utc.with_ymd_and_hms(2026, 5, 9, 20, 0, 0).unwrap())
            .with_score(1, 0)
            .with_top_scorer("O'Neil \\n Jr", 1);
        let s = OnChainMatchSummary::from_record(&record, Utc.with_ymd_and_hms(2026, 5, 9, 22, 0, 0).unwrap(), true);
        let report = render_report(&s);

        assert!(report.contains("Home Team: Lions\\nReserves\n"));
        let facts = parse_report(&report).unwrap();
        assert_eq!(facts.match_id, "m\\9");
        assert_eq!(facts.result, s.attested_result());
        assert!(facts.verify());
    }

    #[test]
    fn test_escape_round_trip() {
        for value in ["plain", "a\\b", "line\nbreak", "\\n literal", "cr\r", "trailing\\"] {
            assert_eq!(unescape(&escape(value)), value);
            assert!(!escape(value).contains('\n'));
        }
        assert_eq!(unescape("odd\\q"), "odd\\q");
    }

    #[test]
    fn test_crlf_report_parses() {
        let report = render_report(&summary(true)).replace('\n', "\r\n");
        assert!(parse_report(&report).unwrap().verify());
    }

    #[test]
    fn test_parse_errors() {
        let report = render_report(&summary(false));

        let no_hash: String = report.lines().filter(|l| !l.starts_with(RESULT_HASH)).collect::<Vec<_>>().join("\n");
        assert_eq!(parse_report(&no_hash), Err(ReportError::MissingField(RESULT_HASH)));

        let bad_score = report.replace("Away Score: 2", "Away Score: two");
        assert!(matches!(parse_report(&bad_score), Err(ReportError::InvalidNumber { field: AWAY_SCORE, .. })));

        let short_hash = report.replace("Result Hash: ", "Result Hash: ab");
        assert!(matches!(parse_report(&short_hash), Err(ReportError::InvalidHash { .. })));
    }
}
