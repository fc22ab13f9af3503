// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress messages and the append-only feed observers replay and follow.
//!
//! The JSON shape of [`ProgressMessage`] is parsed directly by UI clients:
//! `task`, `message`, `time` and `progress` are always present and `end` is
//! `1` only on the last message of a job.

use std::collections::VecDeque;

use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::warn;

use crate::job::{RotationSummary, StageReport};

/// Counters attached to periodic progress messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub processed: usize,
    pub total: usize,
    pub percentage: u8,
    /// Estimated seconds until the current stage finishes.
    pub eta: u64,
}

/// One event of a job's progress feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub task: String,
    pub message: String,
    /// Unix timestamp in seconds.
    pub time: i64,
    /// Percentage of the current task, 0 to 100.
    pub progress: u8,
    pub end: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ProgressStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RotationSummary>,
}

impl ProgressMessage {
    pub fn new(task: impl Into<String>, message: impl Into<String>, progress: u8) -> Self {
        Self {
            task: task.into(),
            message: message.into(),
            time: chrono::Utc::now().timestamp(),
            progress: progress.min(100),
            end: 0,
            stats: None,
            stage: None,
            summary: None,
        }
    }

    pub fn with_stats(mut self, stats: ProgressStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_stage(mut self, report: StageReport) -> Self {
        self.stage = Some(report);
        self
    }

    /// The last message of a job.
    pub fn terminal(message: impl Into<String>, summary: RotationSummary) -> Self {
        let mut msg = Self::new("rotation", message, 100);
        msg.end = 1;
        msg.summary = Some(summary);
        msg
    }

    pub fn is_end(&self) -> bool {
        self.end == 1
    }
}

struct FeedLog {
    messages: Vec<ProgressMessage>,
    closed: bool,
}

/// Append-only log of a job's messages plus a live broadcast of new ones.
pub struct ProgressFeed {
    log: Mutex<FeedLog>,
    tx: broadcast::Sender<ProgressMessage>,
}

impl ProgressFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            log: Mutex::new(FeedLog {
                messages: Vec::new(),
                closed: false,
            }),
            tx,
        }
    }

    /// Append a message. Messages after the terminal one are dropped.
    pub async fn publish(&self, message: ProgressMessage) {
        let mut log = self.log.lock().await;
        if log.closed {
            return;
        }
        log.closed = message.is_end();
        log.messages.push(message.clone());
        // No live subscribers is fine; the log keeps the message.
        let _ = self.tx.send(message);
    }

    /// Everything published so far, then live messages until the terminal one.
    pub async fn subscribe(&self) -> FeedSubscription {
        let log = self.log.lock().await;
        FeedSubscription {
            backlog: log.messages.iter().cloned().collect(),
            rx: (!log.closed).then(|| self.tx.subscribe()),
            done: false,
        }
    }

    /// A copy of the log.
    pub async fn snapshot(&self) -> Vec<ProgressMessage> {
        self.log.lock().await.messages.clone()
    }
}

/// An observer's cursor over a [`ProgressFeed`].
pub struct FeedSubscription {
    backlog: VecDeque<ProgressMessage>,
    rx: Option<broadcast::Receiver<ProgressMessage>>,
    done: bool,
}

impl FeedSubscription {
    /// The next message, or `None` once the terminal message was returned.
    pub async fn next(&mut self) -> Option<ProgressMessage> {
        if self.done {
            return None;
        }
        if let Some(message) = self.backlog.pop_front() {
            self.done = message.is_end();
            return Some(message);
        }
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(message) => {
                    self.done = message.is_end();
                    return Some(message);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "progress observer lagged; messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.done = true;
                    return None;
                }
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ProgressMessage> + Send {
        stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|message| (message, sub))
        })
    }
}
