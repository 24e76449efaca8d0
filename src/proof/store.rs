//! Commitment Store
//!
//! Owns the keyed commitment state (`match_id → summary + transaction`).
//!
//! Writers for the same match id are serialized by a per-key mutex. Every
//! mutation builds a complete new record and swaps it in under the state
//! write lock, so readers see either no record or a whole one.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::record::{MatchId, MatchRecord};
use crate::proof::chain::{ChainClient, ChainEvent, ChainOutcome};
use crate::proof::commitment::{
    compute_match_data_hash, compute_result_hash, CommitmentPayload,
    OnChainMatchSummary, OnChainTransaction, TransactionStatus, TxHash,
};
use crate::proof::report::render_report;

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Age after which a pending transaction is reported as stale.
    pub pending_timeout_secs: u64,
    /// Also compute and commit the full match-data hash.
    pub attest_full_record: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pending_timeout_secs: 120,
            attest_full_record: true,
        }
    }
}

impl StoreConfig {
    /// Pending timeout as a duration.
    pub fn pending_timeout(&self) -> Duration {
        Duration::from_secs(self.pending_timeout_secs)
    }
}

/// Contract violations raised by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// Match id is empty or whitespace.
    #[error("match id must not be empty")]
    EmptyMatchId,
    /// No transaction with this handle was ever published.
    #[error("unknown transaction: {0}")]
    UnknownTransaction(TxHash),
}

/// Result of applying a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Transaction moved to its terminal state.
    Applied,
    /// Transaction was already terminal; nothing changed.
    AlreadyFinal,
    /// The match was re-committed under a newer handle; nothing changed.
    Superseded,
}

/// A transaction plus whether it has been pending too long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    /// The transaction.
    pub transaction: OnChainTransaction,
    /// Pending beyond the configured timeout.
    pub stale: bool,
}

/// Published state for one match.
#[derive(Debug, Clone)]
struct CommitRecord {
    summary: OnChainMatchSummary,
    transaction: OnChainTransaction,
}

impl CommitRecord {
    fn is_live(&self) -> bool {
        self.transaction.status != TransactionStatus::Failed
    }
}

/// Completions held for handles not yet published.
const MAX_ORPHANED_COMPLETIONS: usize = 1024;

#[derive(Default)]
struct StoreState {
    records: BTreeMap<MatchId, Arc<CommitRecord>>,
    tx_index: BTreeMap<TxHash, MatchId>,
    /// Outcomes delivered before `commit` published their handle.
    orphaned: BTreeMap<TxHash, ChainOutcome>,
}

impl StoreState {
    /// Apply a terminal outcome to the record owning `tx_hash`.
    fn resolve(&mut self, tx_hash: &TxHash, outcome: ChainOutcome) -> Result<CompletionOutcome, CommitError> {
        let match_id = self
            .tx_index
            .get(tx_hash)
            .cloned()
            .ok_or_else(|| CommitError::UnknownTransaction(tx_hash.clone()))?;

        let current = self
            .records
            .get(&match_id)
            .cloned()
            .ok_or_else(|| CommitError::UnknownTransaction(tx_hash.clone()))?;

        if current.transaction.tx_hash.as_ref() != Some(tx_hash) {
            debug!(match_id = %match_id, "completion for superseded transaction ignored");
            return Ok(CompletionOutcome::Superseded);
        }
        if current.transaction.status.is_terminal() {
            return Ok(CompletionOutcome::AlreadyFinal);
        }

        let mut transaction = current.transaction.clone();
        match outcome {
            ChainOutcome::Confirmed { block_number } => {
                transaction.status = TransactionStatus::Confirmed;
                transaction.block_number = Some(block_number);
                info!(match_id = %match_id, block_number, "commitment confirmed");
            }
            ChainOutcome::Failed { reason } => {
                warn!(match_id = %match_id, "commitment failed: {}", reason);
                transaction.status = TransactionStatus::Failed;
                transaction.failure_reason = Some(reason);
            }
        }

        self.records.insert(
            match_id,
            Arc::new(CommitRecord {
                summary: current.summary.clone(),
                transaction,
            }),
        );

        Ok(CompletionOutcome::Applied)
    }
}

/// Write-once commitment store.
///
/// Construct one per process and share it behind an `Arc`.
pub struct CommitmentStore {
    config: StoreConfig,
    chain: Arc<dyn ChainClient>,
    state: RwLock<StoreState>,
    key_locks: Mutex<BTreeMap<MatchId, Arc<Mutex<()>>>>,
}

impl CommitmentStore {
    /// Create a store submitting through `chain`.
    pub fn new(config: StoreConfig, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            config,
            chain,
            state: RwLock::new(StoreState::default()),
            key_locks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn key_lock(&self, match_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().await;
        locks.entry(match_id.to_string()).or_default().clone()
    }

    /// Drop the per-key mutex once nobody else is waiting on it.
    async fn release_key_lock(&self, match_id: &str, key_lock: Arc<Mutex<()>>) {
        let mut locks = self.key_locks.lock().await;
        // Map entry plus ours: no other writer holds or awaits this key.
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(match_id);
        }
    }

    async fn record(&self, match_id: &str) -> Option<Arc<CommitRecord>> {
        let state = self.state.read().await;
        state.records.get(match_id).cloned()
    }

    /// Commit a match.
    ///
    /// Idempotent per match id: returns the existing transaction unless the
    /// previous attempt failed, in which case the commit is retried.
    #[instrument(skip(self, record), fields(match_id = %record.id))]
    pub async fn commit(&self, record: &MatchRecord) -> Result<OnChainTransaction, CommitError> {
        if record.id.trim().is_empty() {
            return Err(CommitError::EmptyMatchId);
        }

        if let Some(existing) = self.record(&record.id).await {
            if existing.is_live() {
                return Ok(existing.transaction.clone());
            }
        }

        let key_lock = self.key_lock(&record.id).await;
        let transaction = {
            let _guard = key_lock.lock().await;
            self.commit_exclusive(record).await
        };
        self.release_key_lock(&record.id, key_lock).await;

        Ok(transaction)
    }

    /// Submit and publish. Caller holds the key lock for `record.id`.
    async fn commit_exclusive(&self, record: &MatchRecord) -> OnChainTransaction {
        // Re-check: another writer may have published while we waited.
        let previous = self.record(&record.id).await;
        if let Some(existing) = &previous {
            if existing.is_live() {
                debug!("commit raced, returning published transaction");
                return existing.transaction.clone();
            }
        }

        let now = Utc::now();
        let summary = OnChainMatchSummary::from_record(record, now, self.config.attest_full_record);
        let payload = CommitmentPayload::from_summary(&summary);

        let submitted = match self.chain.submit(&payload) {
            Ok(tx_hash) => OnChainTransaction::pending(record.id.clone(), tx_hash, now),
            Err(e) => {
                warn!("chain refused commitment: {}", e);
                OnChainTransaction::rejected(record.id.clone(), e.to_string(), now)
            }
        };

        let transaction = {
            let mut state = self.state.write().await;
            state.records.insert(
                record.id.clone(),
                Arc::new(CommitRecord {
                    summary,
                    transaction: submitted.clone(),
                }),
            );
            if let Some(tx_hash) = &submitted.tx_hash {
                state.tx_index.insert(tx_hash.clone(), record.id.clone());
                // The chain may have reported back before we got here.
                if let Some(outcome) = state.orphaned.remove(tx_hash) {
                    debug!(tx_hash = %tx_hash, "applying early completion");
                    let _ = state.resolve(tx_hash, outcome);
                }
            }
            state
                .records
                .get(&record.id)
                .map(|r| r.transaction.clone())
                .unwrap_or(submitted)
        };

        info!(
            tx_hash = transaction.tx_hash.as_deref().unwrap_or("-"),
            status = %transaction.status,
            retry = previous.is_some(),
            "commitment published"
        );

        transaction
    }

    /// Recompute the result hash of `record` and compare with the commitment.
    ///
    /// `None` if nothing was committed for `match_id`.
    pub async fn verify(&self, match_id: &str, record: &MatchRecord) -> Option<bool> {
        let committed = self.record(match_id).await?;
        Some(compute_result_hash(record) == committed.summary.result_hash)
    }

    /// Compare the full-record hash, when one was committed.
    ///
    /// `None` if nothing was committed or no full-record hash exists.
    pub async fn verify_full(&self, match_id: &str, record: &MatchRecord) -> Option<bool> {
        let committed = self.record(match_id).await?;
        let expected = committed.summary.match_data_hash?;
        Some(compute_match_data_hash(record) == expected)
    }

    /// Mark a transaction confirmed.
    pub async fn confirm(&self, tx_hash: &TxHash, block_number: u64) -> Result<CompletionOutcome, CommitError> {
        self.complete(tx_hash, ChainOutcome::Confirmed { block_number }).await
    }

    /// Mark a transaction failed.
    pub async fn fail(&self, tx_hash: &TxHash, reason: impl Into<String>) -> Result<CompletionOutcome, CommitError> {
        self.complete(tx_hash, ChainOutcome::Failed { reason: reason.into() }).await
    }

    /// Apply a terminal outcome exactly once.
    ///
    /// A handle the store has never published is a contract violation.
    #[instrument(skip(self, outcome))]
    pub async fn complete(&self, tx_hash: &TxHash, outcome: ChainOutcome) -> Result<CompletionOutcome, CommitError> {
        self.state.write().await.resolve(tx_hash, outcome)
    }

    /// Consume completion events until the sender side closes.
    ///
    /// Events for handles not yet published are held and applied when
    /// `commit` publishes them.
    pub async fn run_completions(&self, mut events: mpsc::UnboundedReceiver<ChainEvent>) {
        while let Some(event) = events.recv().await {
            let mut state = self.state.write().await;
            match state.resolve(&event.tx_hash, event.outcome.clone()) {
                Ok(outcome) => debug!(tx_hash = %event.tx_hash, ?outcome, "completion handled"),
                Err(CommitError::UnknownTransaction(_)) if state.orphaned.len() < MAX_ORPHANED_COMPLETIONS => {
                    debug!(tx_hash = %event.tx_hash, "completion for unpublished handle held");
                    state.orphaned.insert(event.tx_hash, event.outcome);
                }
                Err(e) => warn!("completion dropped: {}", e),
            }
        }
    }

    /// Number of completions held for unpublished handles.
    pub async fn orphaned_completions(&self) -> usize {
        self.state.read().await.orphaned.len()
    }

    /// Ask the chain about every pending transaction; returns how many completed.
    pub async fn poll_pending(&self) -> usize {
        let pending: Vec<TxHash> = {
            let state = self.state.read().await;
            state
                .records
                .values()
                .filter(|r| r.transaction.status == TransactionStatus::Pending)
                .filter_map(|r| r.transaction.tx_hash.clone())
                .collect()
        };

        let mut applied = 0;
        for tx_hash in pending {
            match self.chain.poll(&tx_hash) {
                Ok(Some(outcome)) => {
                    if let Ok(CompletionOutcome::Applied) = self.complete(&tx_hash, outcome).await {
                        applied += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(tx_hash = %tx_hash, "poll failed: {}", e),
            }
        }
        applied
    }

    /// Committed summary for a match.
    pub async fn summary(&self, match_id: &str) -> Option<OnChainMatchSummary> {
        self.record(match_id).await.map(|r| r.summary.clone())
    }

    /// Current transaction for a match.
    pub async fn transaction(&self, match_id: &str) -> Option<OnChainTransaction> {
        self.record(match_id).await.map(|r| r.transaction.clone())
    }

    /// Transaction by chain handle (current or superseded match).
    pub async fn transaction_by_hash(&self, tx_hash: &TxHash) -> Option<OnChainTransaction> {
        let state = self.state.read().await;
        let match_id = state.tx_index.get(tx_hash)?;
        state
            .records
            .get(match_id)
            .filter(|r| r.transaction.tx_hash.as_ref() == Some(tx_hash))
            .map(|r| r.transaction.clone())
    }

    /// Transaction with staleness as of now.
    pub async fn transaction_status(&self, match_id: &str) -> Option<TransactionView> {
        self.transaction_status_at(match_id, Utc::now()).await
    }

    /// Transaction with staleness as of `now`.
    pub async fn transaction_status_at(&self, match_id: &str, now: DateTime<Utc>) -> Option<TransactionView> {
        let transaction = self.transaction(match_id).await?;
        let stale = self.is_stale(&transaction, now);
        Some(TransactionView { transaction, stale })
    }

    /// Pending transactions older than the timeout, as of `now`.
    pub async fn stale_transactions_at(&self, now: DateTime<Utc>) -> Vec<OnChainTransaction> {
        let state = self.state.read().await;
        state
            .records
            .values()
            .filter(|r| self.is_stale(&r.transaction, now))
            .map(|r| r.transaction.clone())
            .collect()
    }

    /// Pending transactions older than the timeout.
    pub async fn stale_transactions(&self) -> Vec<OnChainTransaction> {
        self.stale_transactions_at(Utc::now()).await
    }

    fn is_stale(&self, transaction: &OnChainTransaction, now: DateTime<Utc>) -> bool {
        if transaction.status != TransactionStatus::Pending {
            return false;
        }
        let age = now.signed_duration_since(transaction.submitted_at);
        match age.to_std() {
            Ok(age) => age > self.config.pending_timeout(),
            Err(_) => false,
        }
    }

    /// Plain-text report for a committed match.
    pub async fn export_report(&self, match_id: &str) -> Option<String> {
        self.summary(match_id).await.map(|s| render_report(&s))
    }

    /// Number of committed matches (any status).
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// True if nothing has been committed.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::chain::SimulatedChain;
    use crate::proof::report::parse_report;
    use chrono::TimeZone;

    fn record(id: &str) -> MatchRecord {
        MatchRecord::new(id, "Lions", "Tigers", Utc.with_ymd_and_hms(2026, 5, 9, 20, 0, 0).unwrap())
            .with_score(2, 0)
            .with_player_stats(1, 1)
            .with_top_scorer("Okafor", 1)
    }

    fn store() -> (Arc<SimulatedChain>, CommitmentStore) {
        let chain = Arc::new(SimulatedChain::new(500));
        let store = CommitmentStore::new(StoreConfig::default(), chain.clone());
        (chain, store)
    }

    #[tokio::test]
    async fn test_commit_then_verify() {
        let (_, store) = store();
        let r = record("m1");

        let tx = store.commit(&r).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.tx_hash.is_some());
        assert!(tx.block_number.is_none());

        assert_eq!(store.verify("m1", &r).await, Some(true));
        assert_eq!(store.verify_full("m1", &r).await, Some(true));
    }

    #[tokio::test]
    async fn test_tampered_record_fails_verification() {
        let (_, store) = store();
        let r = record("m1");
        store.commit(&r).await.unwrap();

        let mut tampered = r.clone();
        tampered.home_score = 3;
        assert_eq!(store.verify("m1", &tampered).await, Some(false));

        // Non-attested fields only affect the full-record hash
        let mut drifted = r.clone();
        drifted.player_assists = 4;
        assert_eq!(store.verify("m1", &drifted).await, Some(true));
        assert_eq!(store.verify_full("m1", &drifted).await, Some(false));
    }

    #[tokio::test]
    async fn test_verify_before_commit_is_none() {
        let (_, store) = store();
        assert_eq!(store.verify("nope", &record("nope")).await, None);
        assert!(store.summary("nope").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_verify_full_without_data_hash_is_none() {
        let chain = Arc::new(SimulatedChain::default());
        let config = StoreConfig { attest_full_record: false, ..Default::default() };
        let store = CommitmentStore::new(config, chain);
        let r = record("m1");
        store.commit(&r).await.unwrap();

        assert_eq!(store.verify("m1", &r).await, Some(true));
        assert_eq!(store.verify_full("m1", &r).await, None);
    }

    #[tokio::test]
    async fn test_empty_match_id_is_contract_error() {
        let (chain, store) = store();
        assert_eq!(store.commit(&record("  ")).await, Err(CommitError::EmptyMatchId));
        assert_eq!(chain.submission_count(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let (chain, store) = store();
        let first = store.commit(&record("m1")).await.unwrap();

        // Different instance, same logical facts
        let second = store.commit(&record("m1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(chain.submission_count(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_recommit_with_changed_facts_keeps_original() {
        let (_, store) = store();
        let original = record("m1");
        let first = store.commit(&original).await.unwrap();

        let rewritten = record("m1").with_score(0, 5);
        let second = store.commit(&rewritten).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.verify("m1", &original).await, Some(true));
        assert_eq!(store.verify("m1", &rewritten).await, Some(false));
    }

    #[tokio::test]
    async fn test_concurrent_commits_collapse_to_one() {
        let (chain, store) = store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.commit(&record("race")).await })
            })
            .collect();

        let mut hashes = Vec::new();
        for handle in handles {
            let tx = handle.await.unwrap().unwrap();
            hashes.push(tx.tx_hash.unwrap());
        }

        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(chain.submission_count(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_confirm_applies_once() {
        let (_, store) = store();
        let tx = store.commit(&record("m1")).await.unwrap();
        let tx_hash = tx.tx_hash.unwrap();

        assert_eq!(store.confirm(&tx_hash, 42).await, Ok(CompletionOutcome::Applied));
        assert_eq!(store.confirm(&tx_hash, 43).await, Ok(CompletionOutcome::AlreadyFinal));
        assert_eq!(store.fail(&tx_hash, "late").await, Ok(CompletionOutcome::AlreadyFinal));

        let stored = store.transaction("m1").await.unwrap();
        assert_eq!(stored.status, TransactionStatus::Confirmed);
        assert_eq!(stored.block_number, Some(42));
        assert_eq!(store.transaction_by_hash(&tx_hash).await, Some(stored));
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let (_, store) = store();
        let result = store.confirm(&"0xdead".to_string(), 1).await;
        assert_eq!(result, Err(CommitError::UnknownTransaction("0xdead".into())));
    }

    #[tokio::test]
    async fn test_failed_commit_is_retryable() {
        let (chain, store) = store();
        let first = store.commit(&record("m1")).await.unwrap();
        let first_hash = first.tx_hash.unwrap();

        store.fail(&first_hash, "reverted").await.unwrap();
        let failed = store.transaction("m1").await.unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("reverted"));
        assert!(failed.block_number.is_none());

        let retry = store.commit(&record("m1")).await.unwrap();
        assert_eq!(retry.status, TransactionStatus::Pending);
        assert_ne!(retry.tx_hash.as_ref(), Some(&first_hash));
        assert_eq!(chain.submission_count(), 2);

        // Late callback for the old handle must not touch the retry
        assert_eq!(store.confirm(&first_hash, 9).await, Ok(CompletionOutcome::Superseded));
        assert_eq!(store.transaction("m1").await.unwrap().status, TransactionStatus::Pending);
        assert_eq!(store.transaction_by_hash(&first_hash).await, None);
    }

    #[tokio::test]
    async fn test_rejected_submission_is_failed_and_retryable() {
        let (chain, store) = store();
        chain.reject_next_submission("nonce too low");

        let tx = store.commit(&record("m1")).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert!(tx.tx_hash.is_none());
        assert!(tx.failure_reason.unwrap().contains("nonce too low"));

        let retry = store.commit(&record("m1")).await.unwrap();
        assert_eq!(retry.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_poll_pending_applies_outcomes() {
        let (chain, store) = store();
        store.commit(&record("a")).await.unwrap();
        store.commit(&record("b")).await.unwrap();

        assert_eq!(store.poll_pending().await, 0);
        chain.mine_block();
        assert_eq!(store.poll_pending().await, 2);
        assert_eq!(store.poll_pending().await, 0);

        let a = store.transaction("a").await.unwrap();
        assert_eq!(a.status, TransactionStatus::Confirmed);
        assert_eq!(a.block_number, Some(500));
    }

    #[tokio::test]
    async fn test_run_completions_consumes_events() {
        let (_, store) = store();
        let tx = store.commit(&record("m1")).await.unwrap();
        let tx_hash = tx.tx_hash.unwrap();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let confirmed = ChainEvent { tx_hash: tx_hash.clone(), outcome: ChainOutcome::Confirmed { block_number: 7 } };
        events_tx.send(confirmed.clone()).unwrap();
        // Duplicate and unknown deliveries are harmless
        events_tx.send(confirmed).unwrap();
        events_tx
            .send(ChainEvent { tx_hash: "0xunknown".into(), outcome: ChainOutcome::Failed { reason: "x".into() } })
            .unwrap();
        drop(events_tx);

        store.run_completions(events_rx).await;

        let confirmed = store.transaction("m1").await.unwrap();
        assert_eq!(confirmed.status, TransactionStatus::Confirmed);
        assert_eq!(confirmed.block_number, Some(7));
        assert_eq!(store.orphaned_completions().await, 1);
    }

    #[tokio::test]
    async fn test_completion_before_publish_applies_on_commit() {
        let (_, store) = store();
        let r = record("early");

        // Same payload and nonce as the store's first submission
        let summary = OnChainMatchSummary::from_record(&r, Utc::now(), true);
        let twin = SimulatedChain::default();
        let tx_hash = twin.submit(&CommitmentPayload::from_summary(&summary)).unwrap();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        events_tx
            .send(ChainEvent { tx_hash: tx_hash.clone(), outcome: ChainOutcome::Confirmed { block_number: 9 } })
            .unwrap();
        drop(events_tx);
        store.run_completions(events_rx).await;
        assert_eq!(store.orphaned_completions().await, 1);

        let tx = store.commit(&r).await.unwrap();
        assert_eq!(tx.tx_hash.as_ref(), Some(&tx_hash));
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.block_number, Some(9));
        assert_eq!(store.orphaned_completions().await, 0);
        assert_eq!(store.confirm(&tx_hash, 10).await, Ok(CompletionOutcome::AlreadyFinal));
    }

    #[tokio::test]
    async fn test_direct_complete_of_unpublished_handle_is_not_held() {
        let (_, store) = store();
        let result = store.confirm(&"0xabc".to_string(), 1).await;
        assert_eq!(result, Err(CommitError::UnknownTransaction("0xabc".into())));
        assert_eq!(store.orphaned_completions().await, 0);
    }

    /// Reports every submission on the event channel before returning; never polled.
    struct CallbackChain {
        events: mpsc::UnboundedSender<ChainEvent>,
        nonce: std::sync::atomic::AtomicU64,
    }

    impl ChainClient for CallbackChain {
        fn submit(&self, payload: &CommitmentPayload) -> Result<TxHash, crate::proof::chain::ChainError> {
            let n = self.nonce.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let tx_hash = format!("0x{}-{}", payload.match_id, n);
            let _ = self.events.send(ChainEvent {
                tx_hash: tx_hash.clone(),
                outcome: ChainOutcome::Confirmed { block_number: 9 },
            });
            Ok(tx_hash)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_callback_only_chain_confirms_every_commit() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let chain = Arc::new(CallbackChain { events: events_tx, nonce: Default::default() });
        let store = Arc::new(CommitmentStore::new(StoreConfig::default(), chain));

        let worker = store.clone();
        let handle = tokio::spawn(async move { worker.run_completions(events_rx).await });

        let ids: Vec<String> = (0..20).map(|i| format!("cb{}", i)).collect();
        for id in &ids {
            store.commit(&record(id)).await.unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let mut confirmed = 0;
                for id in &ids {
                    if store.transaction(id).await.unwrap().status == TransactionStatus::Confirmed {
                        confirmed += 1;
                    }
                }
                if confirmed == ids.len() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        handle.abort();

        assert_eq!(store.poll_pending().await, 0);
        assert_eq!(store.orphaned_completions().await, 0);
        assert_eq!(store.transaction("cb3").await.unwrap().block_number, Some(9));
    }

    #[tokio::test]
    async fn test_key_locks_released_after_commit() {
        let (_, store) = store();
        let store = Arc::new(store);

        store.commit(&record("a")).await.unwrap();
        let commits: Vec<_> = (0..6).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.commit(&record("b")).await })
        }).collect();
        for handle in commits {
            handle.await.unwrap().unwrap();
        }

        assert!(store.key_locks.lock().await.is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_run_completions_with_chain_events() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let chain = Arc::new(SimulatedChain::new(11).with_event_sender(events_tx));
        let store = Arc::new(CommitmentStore::new(StoreConfig::default(), chain.clone()));

        let worker = store.clone();
        let handle = tokio::spawn(async move { worker.run_completions(events_rx).await });

        store.commit(&record("m1")).await.unwrap();
        chain.mine_block();

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if store.transaction("m1").await.unwrap().status == TransactionStatus::Confirmed {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        handle.abort();

        assert_eq!(store.transaction("m1").await.unwrap().block_number, Some(11));
    }

    #[tokio::test]
    async fn test_stale_pending_is_surfaced_not_failed() {
        let chain = Arc::new(SimulatedChain::default());
        let config = StoreConfig { pending_timeout_secs: 60, ..Default::default() };
        let store = CommitmentStore::new(config, chain);
        let tx = store.commit(&record("m1")).await.unwrap();

        let soon = tx.submitted_at + chrono::Duration::seconds(30);
        let later = tx.submitted_at + chrono::Duration::seconds(61);

        assert!(!store.transaction_status_at("m1", soon).await.unwrap().stale);
        let view = store.transaction_status_at("m1", later).await.unwrap();
        assert!(view.stale);
        assert_eq!(view.transaction.status, TransactionStatus::Pending);
        assert_eq!(store.stale_transactions_at(later).await.len(), 1);

        store.confirm(&tx.tx_hash.unwrap(), 3).await.unwrap();
        assert!(!store.transaction_status_at("m1", later).await.unwrap().stale);
        assert!(store.stale_transactions_at(later).await.is_empty());
    }

    #[tokio::test]
    async fn test_export_report_is_rehashable() {
        let (_, store) = store();
        store.commit(&record("m1")).await.unwrap();

        let report = store.export_report("m1").await.unwrap();
        let facts = parse_report(&report).unwrap();
        assert!(facts.verify());
        assert_eq!(facts.match_id, "m1");
        assert!(store.export_report("missing").await.is_none());
    }
}
