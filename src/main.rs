//! Match Integrity Demo
//!
//! Validates a generated match history, rates it, commits the results
//! through a simulated chain and re-verifies them.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use match_integrity::{
    assess_history,
    proof::{parse_report, render_report},
    CommitmentStore, IntegrityConfig, MatchRecord, MatchValidator, SimulatedChain, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = IntegrityConfig::from_env().context("loading configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    info!("Match Integrity v{}", VERSION);
    info!(
        "Suspicion threshold: {}, error penalty: {}, warning penalty: {}",
        config.validator.suspicion_threshold, config.validator.error_penalty, config.validator.warning_penalty
    );

    let history = demo_history();
    let validator = MatchValidator::new(config.validator.clone());

    demo_validation(&validator, &config, &history);
    demo_commitment(&config, &history).await?;

    Ok(())
}

/// Twelve daily matches with an ordinary spread of goals and results.
fn demo_history() -> Vec<MatchRecord> {
    const GOALS: [i32; 12] = [1, 0, 2, 1, 1, 0, 1, 2, 1, 0, 1, 1];
    const ASSISTS: [i32; 12] = [0, 1, 0, 1, 0, 0, 2, 0, 1, 0, 1, 0];
    const OPPONENTS: [&str; 4] = ["Tigers", "Bears", "Wolves", "Hawks"];

    let start = Utc::now() - Duration::days(30);
    (0..GOALS.len())
        .map(|i| {
            let home_score = GOALS[i] + (i % 3) as i32;
            let away_score = ((i * 7) % 4) as i32;
            MatchRecord::new(
                format!("match-{}", Uuid::new_v4()),
                "Lions",
                OPPONENTS[i % OPPONENTS.len()],
                start + Duration::days(i as i64),
            )
            .with_score(home_score, away_score)
            .with_player_stats(GOALS[i], ASSISTS[i])
            .with_top_scorer("Okafor", GOALS[i].max(1))
        })
        .collect()
}

fn demo_validation(validator: &MatchValidator, config: &IntegrityConfig, history: &[MatchRecord]) {
    info!("=== Validation ===");

    let profile = validator.build_player_profile(history);
    info!(
        "Profile: {} matches, {:.2} goals/match, {:.2} assists/match, {:.1} min/match",
        profile.total_matches, profile.avg_goals_per_match, profile.avg_assists_per_match, profile.avg_match_duration
    );

    let (results, report) = assess_history(validator, &config.rating, history, Utc::now());
    for (record, result) in history.iter().zip(&results) {
        if result.finding_count() > 0 {
            info!("{}: score {:.0}, {} finding(s)", record.id, result.score, result.finding_count());
        }
    }
    info!(
        "Fairness: {} (average {:.1}, {} of {} suspicious)",
        report.rating, report.average_score, report.suspicious_count, report.total_matches
    );

    // A 4-goal match against a one-goal average
    let last = history.iter().map(|r| r.date).max().unwrap_or_else(Utc::now);
    let outlier = MatchRecord::new(format!("match-{}", Uuid::new_v4()), "Lions", "Tigers", last + Duration::days(1))
        .with_score(5, 1)
        .with_player_stats(4, 0);
    let result = validator.validate(&outlier, history);
    info!(
        "Outlier: valid={}, score={:.0}, suspicious={}",
        result.is_valid,
        result.score,
        validator.is_suspicious(&result)
    );
    for issue in result.issues.iter().chain(&result.warnings) {
        info!("  [{}] {}", issue.code, issue.message);
    }
}

async fn demo_commitment(config: &IntegrityConfig, history: &[MatchRecord]) -> anyhow::Result<()> {
    info!("=== Commitment ===");

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let chain = Arc::new(SimulatedChain::new(1_000).with_event_sender(events_tx));
    let store = Arc::new(CommitmentStore::new(config.store.clone(), chain.clone()));

    let worker = store.clone();
    let completions = tokio::spawn(async move { worker.run_completions(events_rx).await });

    // Commit the last three matches, the newest one twice concurrently
    let recent = &history[history.len().saturating_sub(3)..];
    let newest = recent.last().context("empty history")?;
    let commits = recent.iter().chain(std::iter::once(newest)).map(|r| store.commit(r));
    for (record, tx) in recent.iter().chain(std::iter::once(newest)).zip(join_all(commits).await) {
        let tx = tx?;
        info!(
            "Committed {} -> {} ({})",
            record.id,
            tx.tx_hash.as_deref().unwrap_or("-"),
            tx.status
        );
    }
    info!("Chain submissions: {}", chain.submission_count());

    let mined = chain.mine_block();
    info!("Mined block with {} transaction(s)", mined.len());
    // Events may still be in flight; polling applies anything missed
    store.poll_pending().await;

    for record in recent {
        if let Some(view) = store.transaction_status(&record.id).await {
            info!(
                "{}: {} at block {:?}{}",
                record.id,
                view.transaction.status,
                view.transaction.block_number,
                if view.stale { " (stale)" } else { "" }
            );
        }
    }

    info!("=== Verification ===");

    match store.verify(&newest.id, newest).await {
        Some(true) => info!("{}: result matches commitment", newest.id),
        Some(false) => bail!("{}: committed result does not verify", newest.id),
        None => bail!("{}: no commitment found", newest.id),
    }

    let mut tampered = newest.clone();
    tampered.home_score += 1;
    match store.verify(&newest.id, &tampered).await {
        Some(false) => info!("{}: tampered score detected", newest.id),
        other => warn!("{}: tampered record not detected ({:?})", newest.id, other),
    }

    let summary = store.summary(&newest.id).await.context("missing summary")?;
    let report = render_report(&summary);
    println!("\n{}", report);

    let facts = parse_report(&report)?;
    info!("Report re-hash: {}", if facts.verify() { "ok" } else { "MISMATCH" });

    let stale = store.stale_transactions().await;
    if !stale.is_empty() {
        warn!("{} transaction(s) pending beyond timeout", stale.len());
    }

    drop(chain);
    completions.abort();
    Ok(())
}
