// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keywarden rotate`: run a rotation job in-process with a terminal progress bar.

use std::sync::Arc;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use keywarden_config::model::KeywardenConfig;
use keywarden_core::{KeywardenError, SecretStore};
use keywarden_rotation::{JobId, JobState, ProgressMessage, RotationManager, RotationRequest};
use keywarden_storage::{
    AccountSecrets, Database, HistorySecrets, SqliteHashStore, TokenVaultSecrets,
};
use keywarden_vault::RecordCodec;
use tracing::warn;

use crate::{prompt, serve};

/// Rotation manager over the SQLite stores, in rotation order.
pub fn build_manager(db: &Database, config: &KeywardenConfig) -> RotationManager {
    let stores: Vec<Arc<dyn SecretStore>> = vec![
        Arc::new(AccountSecrets::new(db.clone())),
        Arc::new(HistorySecrets::new(db.clone())),
        Arc::new(TokenVaultSecrets::new(db.clone())),
    ];
    RotationManager::new(
        RecordCodec::new(config.vault.clone()),
        config.rotation.clone(),
        stores,
        Arc::new(SqliteHashStore::new(db.clone())),
    )
}

pub async fn run_rotate(
    config: KeywardenConfig,
    retry_of: Option<JobId>,
) -> Result<(), KeywardenError> {
    let old_passphrase = prompt::master_passphrase()?;
    let new_passphrase = prompt::replacement_passphrase()?;

    let db = Database::open_with(&config.storage).await?;
    let manager = build_manager(&db, &config);
    let job_id = manager
        .start_rotation(RotationRequest {
            old_passphrase,
            new_passphrase,
            retry_of,
        })
        .await?;
    eprintln!("{} rotation job {job_id}", "started".green());

    let shutdown = serve::install_signal_handler();
    let mut feed = manager.subscribe(job_id).await?;
    let mut renderer = StageRenderer::default();
    let mut cancel_sent = false;
    loop {
        tokio::select! {
            message = feed.next() => match message {
                Some(message) => renderer.show(&message),
                None => break,
            },
            _ = shutdown.cancelled(), if !cancel_sent => {
                warn!(job_id = %job_id, "interrupt received, cancelling rotation");
                manager.cancel(job_id).await?;
                cancel_sent = true;
            }
        }
    }
    renderer.finish();

    let status = manager.status(job_id).await?;
    db.close().await?;

    if let Some(summary) = &status.summary {
        for stage in &summary.stages {
            for error in &stage.errors {
                eprintln!("  {} {}: {error}", "failed".red(), stage.task);
            }
        }
    }

    match status.state {
        JobState::Failed(reason) => Err(KeywardenError::Internal(format!(
            "rotation job {job_id} failed: {reason}"
        ))),
        _ => {
            let failed = status.summary.as_ref().map_or(0, |s| s.error_count);
            if failed > 0 {
                return Err(KeywardenError::Internal(format!(
                    "{failed} record(s) were not rotated; fix them and run \
                     `keywarden rotate --retry-of {job_id}`"
                )));
            }
            println!("{} {} records rotated", "done:".green(), status.processed);
            Ok(())
        }
    }
}

/// One progress bar per store, replaced when the task changes.
#[derive(Default)]
struct StageRenderer {
    task: Option<String>,
    bar: Option<ProgressBar>,
}

impl StageRenderer {
    fn show(&mut self, message: &ProgressMessage) {
        if message.is_end() {
            self.finish();
            eprintln!("{}", message.message);
            return;
        }
        if self.task.as_deref() != Some(message.task.as_str()) {
            self.finish();
            self.task = Some(message.task.clone());
        }
        let Some(stats) = &message.stats else {
            if let Some(bar) = &self.bar {
                bar.set_message(message.message.clone());
            } else {
                eprintln!("{}: {}", message.task, message.message);
            }
            return;
        };
        let bar = self
            .bar
            .get_or_insert_with(|| stage_bar(&message.task, stats.total as u64));
        bar.set_length(stats.total as u64);
        bar.set_position(stats.processed as u64);
        bar.set_message(format!("eta {}s", stats.eta));
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
        self.task = None;
    }
}

fn stage_bar(task: &str, total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{prefix:>16} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.set_prefix(task.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use keywarden_rotation::ProgressStats;

    fn tick(task: &str, processed: usize, total: usize) -> ProgressMessage {
        ProgressMessage::new(task, format!("{processed}/{total}"), 0).with_stats(ProgressStats {
            processed,
            total,
            percentage: 0,
            eta: 1,
        })
    }

    #[test]
    fn renderer_opens_one_bar_per_task() {
        let mut renderer = StageRenderer::default();
        renderer.show(&tick("accounts", 1, 2));
        renderer.show(&tick("accounts", 2, 2));
        assert_eq!(renderer.bar.as_ref().map(|b| b.position()), Some(2));

        renderer.show(&tick("account_history", 1, 5));
        assert_eq!(renderer.task.as_deref(), Some("account_history"));
        assert_eq!(renderer.bar.as_ref().and_then(|b| b.length()), Some(5));

        renderer.finish();
        assert!(renderer.bar.is_none());
    }

    #[tokio::test]
    async fn manager_rotates_sqlite_stores() {
        use keywarden_storage::queries::{accounts, meta};
        use keywarden_test_utils::{fast_vault_config, pass};

        let mut config = KeywardenConfig::default();
        config.vault = fast_vault_config();
        config.rotation.progress_interval = 1;

        let db = Database::open_in_memory().await.unwrap();
        crate::commands::init_vault(&db, &config.vault, &pass("alpha")).await.unwrap();
        let id = crate::commands::protect_account(
            &db,
            &config.vault,
            &pass("alpha"),
            "mail",
            "",
            &pass("hunter2"),
        )
        .await
        .unwrap();

        let manager = build_manager(&db, &config);
        let job = manager
            .start_rotation(RotationRequest {
                old_passphrase: pass("alpha"),
                new_passphrase: pass("beta"),
                retry_of: None,
            })
            .await
            .unwrap();
        let mut feed = manager.subscribe(job).await.unwrap();
        while feed.next().await.is_some() {}

        assert_eq!(manager.status(job).await.unwrap().state, JobState::Completed);
        let account = accounts::get_account(&db, id).await.unwrap().unwrap();
        let secret = RecordCodec::new(config.vault.clone())
            .reveal(&account.record, &pass("beta"))
            .unwrap();
        assert_eq!(secrecy::ExposeSecret::expose_secret(&secret), "hunter2");

        let hash = meta::get_meta(&db, meta::MASTER_PASS_HASH).await.unwrap().unwrap();
        assert!(keywarden_vault::verify_secret(&pass("beta"), &hash));
    }
}
