//! Chain Submission Boundary
//!
//! The commitment store never talks to a chain directly; it is handed a
//! [`ChainClient`]. [`SimulatedChain`] is an in-process client with manual
//! block production, used by the demo binary and tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::proof::commitment::{CommitmentPayload, TxHash};

/// Chain client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The chain refused the submission outright.
    #[error("submission rejected: {0}")]
    Rejected(String),
    /// The chain could not be reached.
    #[error("chain unavailable: {0}")]
    Unavailable(String),
    /// Payload could not be encoded.
    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

/// Terminal outcome for a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainOutcome {
    /// Included at `block_number`.
    Confirmed {
        /// Inclusion block.
        block_number: u64,
    },
    /// Dropped or reverted.
    Failed {
        /// Reason reported by the chain.
        reason: String,
    },
}

/// Out-of-band completion notice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    /// Transaction the outcome applies to.
    pub tx_hash: TxHash,
    /// Outcome.
    pub outcome: ChainOutcome,
}

/// Injected chain-submission capability.
pub trait ChainClient: Send + Sync {
    /// Submit a payload, returning a pending handle immediately.
    fn submit(&self, payload: &CommitmentPayload) -> Result<TxHash, ChainError>;

    /// Poll for a terminal outcome. `Ok(None)` while still pending.
    fn poll(&self, _tx_hash: &TxHash) -> Result<Option<ChainOutcome>, ChainError> {
        Ok(None)
    }
}

// =============================================================================
// SIMULATED CHAIN
// =============================================================================

#[derive(Default)]
struct SimulatedState {
    next_block: u64,
    nonce: u64,
    pending: Vec<TxHash>,
    outcomes: BTreeMap<TxHash, ChainOutcome>,
    reject_next: Option<String>,
}

/// In-process chain with explicit block production.
///
/// Transactions stay pending until [`SimulatedChain::mine_block`] includes
/// them or [`SimulatedChain::drop_transaction`] fails them. Outcomes are
/// available via `poll` and, when an event sender is attached, pushed as
/// [`ChainEvent`]s.
pub struct SimulatedChain {
    state: Mutex<SimulatedState>,
    submissions: AtomicUsize,
    events: Option<mpsc::UnboundedSender<ChainEvent>>,
}

impl SimulatedChain {
    /// Create a chain whose next block is `start_block`.
    pub fn new(start_block: u64) -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                next_block: start_block,
                ..Default::default()
            }),
            submissions: AtomicUsize::new(0),
            events: None,
        }
    }

    /// Push outcomes to `sender` as they happen.
    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<ChainEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, events: &[ChainEvent]) {
        if let Some(sender) = &self.events {
            for event in events {
                // Receiver may be gone; outcomes remain pollable.
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Number of accepted or refused `submit` calls.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Handles still awaiting inclusion.
    pub fn pending_transactions(&self) -> Vec<TxHash> {
        self.lock().pending.clone()
    }

    /// Refuse the next submission with `reason`.
    pub fn reject_next_submission(&self, reason: impl Into<String>) {
        self.lock().reject_next = Some(reason.into());
    }

    /// Include every pending transaction in a new block.
    pub fn mine_block(&self) -> Vec<ChainEvent> {
        let events = {
            let mut state = self.lock();
            let block_number = state.next_block;
            state.next_block += 1;

            let included: Vec<TxHash> = state.pending.drain(..).collect();
            let mut events = Vec::with_capacity(included.len());
            for tx_hash in included {
                let outcome = ChainOutcome::Confirmed { block_number };
                state.outcomes.insert(tx_hash.clone(), outcome.clone());
                events.push(ChainEvent { tx_hash, outcome });
            }
            events
        };
        self.emit(&events);
        events
    }

    /// Fail one pending transaction. Returns `None` if it is not pending.
    pub fn drop_transaction(&self, tx_hash: &TxHash, reason: impl Into<String>) -> Option<ChainEvent> {
        let event = {
            let mut state = self.lock();
            let position = state.pending.iter().position(|t| t == tx_hash)?;
            state.pending.remove(position);
            let outcome = ChainOutcome::Failed { reason: reason.into() };
            state.outcomes.insert(tx_hash.clone(), outcome.clone());
            ChainEvent { tx_hash: tx_hash.clone(), outcome }
        };
        self.emit(std::slice::from_ref(&event));
        Some(event)
    }
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ChainClient for SimulatedChain {
    fn submit(&self, payload: &CommitmentPayload) -> Result<TxHash, ChainError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let bytes = payload
            .to_bytes()
            .map_err(|e| ChainError::Encoding(e.to_string()))?;

        let mut state = self.lock();
        if let Some(reason) = state.reject_next.take() {
            return Err(ChainError::Rejected(reason));
        }

        let nonce = state.nonce;
        state.nonce += 1;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hasher.update(nonce.to_le_bytes());
        let tx_hash = format!("0x{}", hex::encode(hasher.finalize()));

        state.pending.push(tx_hash.clone());
        Ok(tx_hash)
    }

    fn poll(&self, tx_hash: &TxHash) -> Result<Option<ChainOutcome>, ChainError> {
        Ok(self.lock().outcomes.get(tx_hash).cloned())
    }
}
