//! # Match Integrity
//!
//! Statistical plausibility checks for reported football-match results, and
//! tamper-evident commitment of those results with later re-verification.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MATCH INTEGRITY                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                │
//! │  ├── hash.rs      - Canonical SHA-256 hashing               │
//! │  └── stats.rs     - Mean, std-dev, z-score                  │
//! │                                                             │
//! │  record/          - Data model                              │
//! │  ├── match_record.rs - Reported match facts                 │
//! │  └── validation.rs   - Issues, results, player profile      │
//! │                                                             │
//! │  validator/       - Statistical validator (stateless)       │
//! │  rating.rs        - Fairness rating aggregation             │
//! │                                                             │
//! │  proof/           - Commitment system (stateful)            │
//! │  ├── commitment.rs - Result hash, on-chain records          │
//! │  ├── chain.rs      - Chain client boundary                  │
//! │  ├── store.rs      - Commitment store                       │
//! │  └── report.rs     - Plain-text attestation report          │
//! │                                                             │
//! │  config.rs        - Defaults, JSON file, env overrides      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! MatchRecord + history ──► MatchValidator ──► ValidationResult ──► FairnessReport
//!        │
//!        └──► CommitmentStore::commit ──► ChainClient ──► OnChainTransaction
//!                      │
//!                      └──► verify(record) ──► Some(true) / Some(false) / None
//! ```
//!
//! Validation and rating are pure and hold no state. The commitment store is
//! constructed explicitly and shared behind an `Arc`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod proof;
pub mod rating;
pub mod record;
pub mod validator;

// Re-export commonly used types
pub use config::{ConfigError, IntegrityConfig};
pub use proof::{
    ChainClient, CommitError, CommitmentStore, OnChainMatchSummary, OnChainTransaction,
    SimulatedChain, StoreConfig, TransactionStatus,
};
pub use rating::{assess_history, FairnessRating, FairnessReport, RatingTable};
pub use record::{MatchId, MatchRecord, PlayerProfile, ValidationIssue, ValidationResult};
pub use validator::{MatchValidator, ValidatorPolicy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
