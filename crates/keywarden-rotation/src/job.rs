// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rotation job identity, lifecycle states and reports.

use std::str::FromStr;

use keywarden_core::{RecordId, StoreKind};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle of one rotation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle of a job. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Failed(String),
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed(_))
    }
}

/// Outcome of one store's pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub task: StoreKind,
    pub total: usize,
    pub ok_ids: Vec<RecordId>,
    pub failed_ids: Vec<RecordId>,
    pub error_count: usize,
    pub errors: Vec<String>,
}

impl StageReport {
    pub fn new(task: StoreKind, total: usize) -> Self {
        Self {
            task,
            total,
            ok_ids: Vec::new(),
            failed_ids: Vec::new(),
            error_count: 0,
            errors: Vec::new(),
        }
    }

    pub(crate) fn record_ok(&mut self, id: RecordId) {
        self.ok_ids.push(id);
    }

    pub(crate) fn record_error(&mut self, id: RecordId, message: String) {
        self.failed_ids.push(id);
        self.errors.push(message);
        self.error_count += 1;
    }
}

/// Terminal summary of a job across all stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSummary {
    pub ok_count: usize,
    pub error_count: usize,
    pub stages: Vec<StageReport>,
}

impl RotationSummary {
    pub fn from_stages(stages: Vec<StageReport>) -> Self {
        Self {
            ok_count: stages.iter().map(|s| s.ok_ids.len()).sum(),
            error_count: stages.iter().map(|s| s.error_count).sum(),
            stages,
        }
    }

    /// The report of one store, if that stage ran.
    pub fn stage(&self, task: StoreKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.task == task)
    }
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job_id: JobId,
    #[serde(flatten)]
    pub state: JobState,
    pub processed: usize,
    pub total: usize,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub retry_of: Option<JobId>,
    pub summary: Option<RotationSummary>,
}

/// Input to [`RotationManager::start_rotation`](crate::RotationManager::start_rotation).
pub struct RotationRequest {
    pub old_passphrase: SecretString,
    pub new_passphrase: SecretString,
    /// Restrict the job to the records that failed in this earlier job.
    pub retry_of: Option<JobId>,
}

impl std::fmt::Debug for RotationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationRequest")
            .field("old_passphrase", &"[REDACTED]")
            .field("new_passphrase", &"[REDACTED]")
            .field("retry_of", &self.retry_of)
            .finish()
    }
}
