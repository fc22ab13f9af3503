// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job registry: start, observe, inspect and cancel rotations.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use keywarden_config::RotationConfig;
use keywarden_core::{KeywardenError, PassphraseHashStore, RecordId, SecretStore, StoreKind};
use keywarden_vault::{hash_secret, verify_secret, RecordCodec};
use secrecy::SecretString;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::job::{JobId, JobState, JobStatus, RotationRequest, RotationSummary, StageReport};
use crate::pipeline::{
    rotate_stage, JobCounters, PipelineContext, StageOutcome, StagePlan, StampCache,
};
use crate::progress::{FeedSubscription, ProgressFeed, ProgressMessage};

struct JobRecord {
    state: JobState,
    finished_at: Option<String>,
    summary: Option<RotationSummary>,
}

struct JobEntry {
    id: JobId,
    /// Start order; jobs never overlap, so this is also finish order.
    seq: u64,
    retry_of: Option<JobId>,
    started_at: String,
    old_hash: String,
    new_hash: String,
    record: RwLock<JobRecord>,
    counters: JobCounters,
    feed: ProgressFeed,
    cancel: CancellationToken,
}

impl JobEntry {
    async fn status(&self) -> JobStatus {
        let record = self.record.read().await;
        JobStatus {
            job_id: self.id,
            state: record.state.clone(),
            processed: self.counters.processed(),
            total: self.counters.total(),
            started_at: self.started_at.clone(),
            finished_at: record.finished_at.clone(),
            retry_of: self.retry_of,
            summary: record.summary.clone(),
        }
    }
}

struct ManagerInner {
    codec: RecordCodec,
    config: RotationConfig,
    stores: Vec<Arc<dyn SecretStore>>,
    hash_store: Arc<dyn PassphraseHashStore>,
    jobs: DashMap<JobId, Arc<JobEntry>>,
    next_seq: AtomicU64,
    busy: AtomicBool,
}

/// Releases the single running-job slot when dropped.
struct BusyGuard(Arc<ManagerInner>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

/// Runs rotation jobs in the background and keeps their state for observers.
///
/// Stores are rotated in the order given: live accounts first, then history
/// snapshots, then token vaults. At most one job runs at a time.
#[derive(Clone)]
pub struct RotationManager {
    inner: Arc<ManagerInner>,
}

impl RotationManager {
    pub fn new(
        codec: RecordCodec,
        config: RotationConfig,
        stores: Vec<Arc<dyn SecretStore>>,
        hash_store: Arc<dyn PassphraseHashStore>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                codec,
                config,
                stores,
                hash_store,
                jobs: DashMap::new(),
                next_seq: AtomicU64::new(0),
                busy: AtomicBool::new(false),
            }),
        }
    }

    /// Validate the request, select candidate records and spawn the job.
    ///
    /// Fails without registering a job when another job is running, the
    /// passphrase does not verify, or there is nothing to rotate.
    pub async fn start_rotation(&self, request: RotationRequest) -> Result<JobId, KeywardenError> {
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(KeywardenError::RotationInProgress);
        }
        let guard = BusyGuard(Arc::clone(&self.inner));

        let old_passphrase = Arc::new(request.old_passphrase);
        let new_passphrase = Arc::new(request.new_passphrase);

        let (old_hash, new_hash, retry_ids) = match request.retry_of {
            Some(previous) => self.retry_setup(previous, &old_passphrase, &new_passphrase).await?,
            None => {
                let (old_hash, new_hash) =
                    self.full_setup(&old_passphrase, &new_passphrase).await?;
                (old_hash, new_hash, None)
            }
        };

        let plans = self.plan_stages(retry_ids.as_ref()).await?;
        match &retry_ids {
            None if plans.first().is_none_or(|p| p.records.is_empty()) => {
                return Err(KeywardenError::RotationSetup(
                    "no accounts found to rotate".to_string(),
                ));
            }
            Some(_) if plans.iter().all(|p| p.records.is_empty()) => {
                return Err(KeywardenError::RotationSetup(
                    "no failed records left to retry".to_string(),
                ));
            }
            _ => {}
        }

        let total = plans.iter().map(|p| p.records.len()).sum();
        self.evict_finished().await;
        let entry = Arc::new(JobEntry {
            id: JobId::new(),
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
            retry_of: request.retry_of,
            started_at: chrono::Utc::now().to_rfc3339(),
            old_hash,
            new_hash,
            record: RwLock::new(JobRecord {
                state: JobState::Idle,
                finished_at: None,
                summary: None,
            }),
            counters: JobCounters::new(total),
            feed: ProgressFeed::new(self.inner.config.feed_capacity),
            cancel: CancellationToken::new(),
        });
        let job_id = entry.id;
        self.inner.jobs.insert(job_id, Arc::clone(&entry));

        entry.record.write().await.state = JobState::Running;
        entry
            .feed
            .publish(ProgressMessage::new(
                "rotation",
                format!("rotation started: {total} records"),
                0,
            ))
            .await;
        info!(job_id = %job_id, total, retry_of = ?request.retry_of, "rotation job started");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_job(inner, entry, plans, old_passphrase, new_passphrase, guard));

        Ok(job_id)
    }

    /// Replay and follow a job's progress feed.
    pub async fn subscribe(&self, job_id: JobId) -> Result<FeedSubscription, KeywardenError> {
        Ok(self.entry(job_id)?.feed.subscribe().await)
    }

    pub async fn status(&self, job_id: JobId) -> Result<JobStatus, KeywardenError> {
        Ok(self.entry(job_id)?.status().await)
    }

    /// Ask a running job to stop before its next record.
    ///
    /// Records already rotated stay rotated. Returns the state at the time
    /// of the request.
    pub async fn cancel(&self, job_id: JobId) -> Result<JobState, KeywardenError> {
        let entry = self.entry(job_id)?;
        let state = entry.record.read().await.state.clone();
        if !state.is_finished() {
            info!(job_id = %job_id, "rotation cancellation requested");
            entry.cancel.cancel();
        }
        Ok(state)
    }

    /// Whether a job is currently running.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    fn entry(&self, job_id: JobId) -> Result<Arc<JobEntry>, KeywardenError> {
        self.inner
            .jobs
            .get(&job_id)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| KeywardenError::NotFound {
                kind: "rotation job",
                id: job_id.to_string(),
            })
    }

    /// Forget all but the newest `retained_jobs` finished jobs.
    async fn evict_finished(&self) {
        let entries: Vec<Arc<JobEntry>> = self
            .inner
            .jobs
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect();
        let mut finished = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.record.read().await.state.is_finished() {
                finished.push((entry.seq, entry.id));
            }
        }

        let keep = self.inner.config.retained_jobs;
        if finished.len() <= keep {
            return;
        }
        finished.sort_unstable_by_key(|(seq, _)| std::cmp::Reverse(*seq));
        for (_, job_id) in finished.into_iter().skip(keep) {
            self.inner.jobs.remove(&job_id);
            debug!(job_id = %job_id, "finished rotation job evicted");
        }
    }

    async fn full_setup(
        &self,
        old_passphrase: &Arc<SecretString>,
        new_passphrase: &Arc<SecretString>,
    ) -> Result<(String, String), KeywardenError> {
        let current = self.inner.hash_store.current_hash().await?.ok_or_else(|| {
            KeywardenError::RotationSetup("master passphrase is not initialized".to_string())
        })?;

        let old = Arc::clone(old_passphrase);
        let new = Arc::clone(new_passphrase);
        let stored = current.clone();
        let vault_config = self.inner.codec.config().clone();
        let new_hash = tokio::task::spawn_blocking(move || -> Result<Option<String>, KeywardenError> {
            if !verify_secret(&old, &stored) {
                return Ok(None);
            }
            hash_secret(&new, &vault_config).map(Some)
        })
        .await
        .map_err(|e| KeywardenError::Internal(format!("hashing worker failed: {e}")))??;

        let Some(new_hash) = new_hash else {
            warn!("rotation refused: old passphrase does not match");
            return Err(KeywardenError::InvalidPassphrase);
        };
        Ok((current, new_hash))
    }

    async fn retry_setup(
        &self,
        previous: JobId,
        old_passphrase: &Arc<SecretString>,
        new_passphrase: &Arc<SecretString>,
    ) -> Result<(String, String, Option<HashMap<StoreKind, HashSet<RecordId>>>), KeywardenError>
    {
        let entry = self.entry(previous)?;
        let record = entry.record.read().await;
        if !record.state.is_finished() {
            return Err(KeywardenError::RotationSetup(format!(
                "job {previous} has not finished"
            )));
        }
        let failed: HashMap<StoreKind, HashSet<RecordId>> = record
            .summary
            .iter()
            .flat_map(|s| s.stages.iter())
            .map(|stage| (stage.task, stage.failed_ids.iter().copied().collect()))
            .collect();
        drop(record);

        let old = Arc::clone(old_passphrase);
        let new = Arc::clone(new_passphrase);
        let old_hash = entry.old_hash.clone();
        let new_hash = entry.new_hash.clone();
        let verified = tokio::task::spawn_blocking(move || {
            verify_secret(&old, &old_hash) && verify_secret(&new, &new_hash)
        })
        .await
        .map_err(|e| KeywardenError::Internal(format!("hashing worker failed: {e}")))?;
        if !verified {
            warn!(retry_of = %previous, "rotation retry refused: passphrases do not match");
            return Err(KeywardenError::InvalidPassphrase);
        }

        Ok((entry.old_hash.clone(), entry.new_hash.clone(), Some(failed)))
    }

    async fn plan_stages(
        &self,
        retry_ids: Option<&HashMap<StoreKind, HashSet<RecordId>>>,
    ) -> Result<Vec<StagePlan>, KeywardenError> {
        let mut plans = Vec::with_capacity(self.inner.stores.len());
        for store in &self.inner.stores {
            let mut records = store.fetch_secrets().await?;
            if let Some(retry_ids) = retry_ids {
                let wanted = retry_ids.get(&store.kind());
                records.retain(|r| wanted.is_some_and(|ids| ids.contains(&r.id)));
            }
            plans.push(StagePlan {
                store: Arc::clone(store),
                records,
            });
        }
        Ok(plans)
    }
}

async fn run_job(
    inner: Arc<ManagerInner>,
    entry: Arc<JobEntry>,
    plans: Vec<StagePlan>,
    old_passphrase: Arc<SecretString>,
    new_passphrase: Arc<SecretString>,
    guard: BusyGuard,
) {
    let stamps = StampCache::new();
    let ctx = PipelineContext {
        codec: &inner.codec,
        old_passphrase: &old_passphrase,
        new_passphrase: &new_passphrase,
        expected_hash: &entry.old_hash,
        new_hash: &entry.new_hash,
        stamps: &stamps,
        demo_mode: inner.config.demo_mode,
        progress_interval: inner.config.progress_interval,
        feed: &entry.feed,
        cancel: &entry.cancel,
        counters: &entry.counters,
    };

    let mut reports: Vec<StageReport> = Vec::new();
    let mut state = JobState::Completed;
    for plan in plans {
        match rotate_stage(plan, &ctx).await {
            Ok(StageOutcome::Finished(report)) => reports.push(report),
            Ok(StageOutcome::Cancelled(report)) => {
                reports.push(report);
                state = JobState::Failed("cancelled".to_string());
                break;
            }
            Err(e) => {
                error!(job_id = %entry.id, error = %e, "rotation job aborted");
                state = JobState::Failed(e.to_string());
                break;
            }
        }
    }

    if state == JobState::Completed && entry.retry_of.is_none() && !inner.config.demo_mode {
        if let Err(e) = inner.hash_store.set_current_hash(&entry.new_hash).await {
            error!(job_id = %entry.id, error = %e, "could not store new passphrase hash");
            state = JobState::Failed(format!("could not store new passphrase hash: {e}"));
        }
    }

    let summary = RotationSummary::from_stages(reports);
    let message = match &state {
        JobState::Completed => format!(
            "rotation completed: {} rotated, {} errors",
            summary.ok_count, summary.error_count
        ),
        JobState::Failed(reason) => format!("rotation failed: {reason}"),
        JobState::Idle | JobState::Running => "rotation stopped".to_string(),
    };
    info!(
        job_id = %entry.id,
        ok = summary.ok_count,
        errors = summary.error_count,
        state = ?state,
        "rotation job finished"
    );

    {
        let mut record = entry.record.write().await;
        record.state = state;
        record.finished_at = Some(chrono::Utc::now().to_rfc3339());
        record.summary = Some(summary.clone());
    }
    // Free the slot before the terminal message so observers can start the next job.
    drop(guard);
    entry
        .feed
        .publish(ProgressMessage::terminal(message, summary))
        .await;
}
