// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-store rotation loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use keywarden_core::{KeywardenError, SecretStore, StoredSecret};
use keywarden_vault::{verify_secret, RecordCodec};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::job::StageReport;
use crate::progress::{ProgressFeed, ProgressMessage, ProgressStats};

/// Job-wide counters shared with status snapshots.
#[derive(Debug, Default)]
pub struct JobCounters {
    processed: AtomicUsize,
    total: AtomicUsize,
}

impl JobCounters {
    pub fn new(total: usize) -> Self {
        Self {
            processed: AtomicUsize::new(0),
            total: AtomicUsize::new(total),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    fn advance(&self) {
        self.processed.fetch_add(1, Ordering::AcqRel);
    }
}

/// What a historical record's stamp says about the passphrase it is under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StampVerdict {
    /// Stamped under the old passphrase; rotate it.
    Current,
    /// Stamped under the new passphrase by an earlier, unfinished job.
    AlreadyRotated,
    Foreign,
}

/// Stamp verdicts for one job, so each distinct stamp costs one Argon2 check.
///
/// Every job mints a freshly salted hash, so stamps left behind by a failed
/// or cancelled job never equal the vault hash byte for byte.
#[derive(Debug, Default)]
pub struct StampCache {
    verdicts: DashMap<String, StampVerdict>,
}

impl StampCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn verdict(
        &self,
        stamp: &str,
        ctx: &PipelineContext<'_>,
    ) -> Result<StampVerdict, KeywardenError> {
        if stamp == ctx.expected_hash {
            return Ok(StampVerdict::Current);
        }
        if stamp == ctx.new_hash {
            return Ok(StampVerdict::AlreadyRotated);
        }
        if let Some(known) = self.verdicts.get(stamp) {
            return Ok(*known);
        }

        let old = Arc::clone(ctx.old_passphrase);
        let new = Arc::clone(ctx.new_passphrase);
        let phc = stamp.to_string();
        let verdict = tokio::task::spawn_blocking(move || {
            if verify_secret(&old, &phc) {
                StampVerdict::Current
            } else if verify_secret(&new, &phc) {
                StampVerdict::AlreadyRotated
            } else {
                StampVerdict::Foreign
            }
        })
        .await
        .map_err(|e| KeywardenError::Internal(format!("stamp check worker failed: {e}")))?;
        self.verdicts.insert(stamp.to_string(), verdict);
        Ok(verdict)
    }
}

/// One store and the records selected for it.
pub struct StagePlan {
    pub store: Arc<dyn SecretStore>,
    pub records: Vec<StoredSecret>,
}

/// Everything a stage needs that is fixed for the whole job.
pub struct PipelineContext<'a> {
    pub codec: &'a RecordCodec,
    pub old_passphrase: &'a Arc<SecretString>,
    pub new_passphrase: &'a Arc<SecretString>,
    /// Vault hash at job start. Other stamps are verified against the passphrases.
    pub expected_hash: &'a str,
    /// Stamp written onto rotated historical records.
    pub new_hash: &'a str,
    pub stamps: &'a StampCache,
    pub demo_mode: bool,
    pub progress_interval: usize,
    pub feed: &'a ProgressFeed,
    pub cancel: &'a CancellationToken,
    pub counters: &'a JobCounters,
}

/// How a stage ended.
#[derive(Debug)]
pub enum StageOutcome {
    Finished(StageReport),
    /// Cancelled before the next record; the report covers what ran.
    Cancelled(StageReport),
}

/// Rotate every record of one store.
///
/// Record-scoped failures are appended to the report and the loop moves on.
/// Only a failing randomness source aborts the stage.
pub async fn rotate_stage(
    plan: StagePlan,
    ctx: &PipelineContext<'_>,
) -> Result<StageOutcome, KeywardenError> {
    let kind = plan.store.kind();
    let task = kind.to_string();
    let total = plan.records.len();
    let mut report = StageReport::new(kind, total);

    if total == 0 {
        info!(store = %kind, "no records to rotate");
        ctx.feed
            .publish(ProgressMessage::new(&task, "no records to rotate", 100).with_stage(report.clone()))
            .await;
        return Ok(StageOutcome::Finished(report));
    }

    info!(store = %kind, total, demo = ctx.demo_mode, "rotation stage started");
    ctx.feed
        .publish(ProgressMessage::new(&task, format!("rotating {total} records"), 0))
        .await;

    let interval = ctx.progress_interval.max(1);
    let started = Instant::now();

    for (index, secret) in plan.records.into_iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            info!(store = %kind, processed = index, total, "rotation stage cancelled");
            return Ok(StageOutcome::Cancelled(report));
        }

        let id = secret.id;
        match rotate_record(plan.store.as_ref(), &secret, ctx).await {
            Ok(()) => {
                debug!(store = %kind, record_id = %id, "record rotated");
                report.record_ok(id);
            }
            Err(e) if e.is_record_scoped() => {
                warn!(store = %kind, record_id = %id, error = %e, "record rotation failed");
                report.record_error(id, format!("record {id} ({}): {e}", secret.name));
            }
            Err(e) => return Err(e),
        }
        ctx.counters.advance();

        let processed = index + 1;
        if processed % interval == 0 || processed == total {
            let stats = stats(processed, total, started.elapsed());
            debug!(store = %kind, processed, total, eta = stats.eta, "rotation progress");
            ctx.feed
                .publish(
                    ProgressMessage::new(
                        &task,
                        format!("{processed}/{total} records processed"),
                        stats.percentage,
                    )
                    .with_stats(stats),
                )
                .await;
        }
    }

    info!(
        store = %kind,
        ok = report.ok_ids.len(),
        errors = report.error_count,
        "rotation stage finished"
    );
    ctx.feed
        .publish(
            ProgressMessage::new(
                &task,
                format!(
                    "{} rotated, {} errors",
                    report.ok_ids.len(),
                    report.error_count
                ),
                100,
            )
            .with_stage(report.clone()),
        )
        .await;
    Ok(StageOutcome::Finished(report))
}

async fn rotate_record(
    store: &dyn SecretStore,
    secret: &StoredSecret,
    ctx: &PipelineContext<'_>,
) -> Result<(), KeywardenError> {
    if ctx.demo_mode {
        return Ok(());
    }

    if let Some(stamp) = &secret.passphrase_hash {
        match ctx.stamps.verdict(stamp, ctx).await? {
            StampVerdict::Current => {}
            StampVerdict::AlreadyRotated => {
                if stamp == ctx.new_hash {
                    return Ok(());
                }
                return store
                    .update_secret(secret.id, &secret.record, ctx.new_hash)
                    .await;
            }
            StampVerdict::Foreign => {
                return Err(KeywardenError::PassphraseMismatch {
                    record: secret.id.to_string(),
                });
            }
        }
    }

    let codec = ctx.codec.clone();
    let old = Arc::clone(ctx.old_passphrase);
    let new = Arc::clone(ctx.new_passphrase);
    let record = secret.record.clone();
    let rotated = tokio::task::spawn_blocking(move || codec.reencrypt(&record, &old, &new))
        .await
        .map_err(|e| KeywardenError::Internal(format!("rotation worker failed: {e}")))??;

    store.update_secret(secret.id, &rotated, ctx.new_hash).await
}

/// Progress counters with a linear ETA extrapolated from the elapsed time.
fn stats(processed: usize, total: usize, elapsed: Duration) -> ProgressStats {
    let remaining = total.saturating_sub(processed);
    let eta = if processed == 0 {
        0
    } else {
        (elapsed.as_secs_f64() / processed as f64 * remaining as f64).round() as u64
    };
    let percentage = if total == 0 {
        100
    } else {
        (processed * 100 / total) as u8
    };
    ProgressStats {
        processed,
        total,
        percentage,
        eta,
    }
}
