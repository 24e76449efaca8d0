//! Commitment System
//!
//! Tamper-evident commitment of match results and later re-verification.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    COMMITMENT SYSTEM                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs - Attested facts, canonical hashes, records  │
//! │  chain.rs      - ChainClient boundary + simulated chain     │
//! │  store.rs      - Write-once store, completion, staleness    │
//! │  report.rs     - Plain-text export and re-hash              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! commit ──► submit ──► Pending ──► Confirmed
//!               │           │
//!               │           └─────► Failed ──► commit (retry)
//!               └─► refused ──────► Failed
//! ```

pub mod chain;
pub mod commitment;
pub mod report;
pub mod store;

// Re-export key types
pub use chain::{ChainClient, ChainError, ChainEvent, ChainOutcome, SimulatedChain};
pub use commitment::{
    compute_match_data_hash, compute_result_hash, AttestedResult, CommitmentPayload,
    OnChainMatchSummary, OnChainTransaction, TransactionStatus, TxHash,
};
pub use report::{parse_report, render_report, ReportError, ReportFacts};
pub use store::{CommitError, CommitmentStore, CompletionOutcome, StoreConfig, TransactionView};
