//! Shared Data Model
//!
//! Match records fed into the pipeline and the values the validator produces.

pub mod match_record;
pub mod validation;

pub use match_record::{MatchId, MatchRecord, Outcome, Side};
pub use validation::{
    IssueCode, PlayerProfile, Severity, ValidationIssue, ValidationResult,
};
