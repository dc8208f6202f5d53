//! Load-and-upsert cycle shared by startup and the on-demand trigger.

use std::{sync::Arc, time::Instant};

use metrics::counter;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::application::{
    content::{ContentLoader, LoadError},
    repos::{DocumentsWriteRepo, RepoError},
};

const METRIC_RELOAD_TOTAL: &str = "notebook_reload_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    /// Documents written to the store.
    pub loaded: usize,
    /// Files skipped because they could not be transformed.
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error("content walk aborted: {0}")]
    Join(String),
}

/// Runs one full load-and-upsert pass at a time.
#[derive(Clone)]
pub struct ReloadService {
    loader: ContentLoader,
    writer: Arc<dyn DocumentsWriteRepo>,
    gate: Arc<Mutex<()>>,
}

impl ReloadService {
    pub fn new(loader: ContentLoader, writer: Arc<dyn DocumentsWriteRepo>) -> Self {
        Self {
            loader,
            writer,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    /// Re-read the content root and upsert the result as one batch.
    pub async fn reload(&self) -> Result<ReloadSummary, ReloadError> {
        let _guard = self.gate.lock().await;
        let started_at = Instant::now();

        let result = self.run_cycle().await;
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        match &result {
            Ok(summary) => {
                counter!(METRIC_RELOAD_TOTAL, "outcome" => "ok").increment(1);
                info!(
                    target = "application::reload",
                    loaded = summary.loaded,
                    failed = summary.failed,
                    elapsed_ms,
                    "reload complete"
                );
            }
            Err(err) => {
                counter!(METRIC_RELOAD_TOTAL, "outcome" => "error").increment(1);
                error!(
                    target = "application::reload",
                    error = %err,
                    elapsed_ms,
                    "reload failed"
                );
            }
        }

        result
    }

    async fn run_cycle(&self) -> Result<ReloadSummary, ReloadError> {
        let loader = self.loader.clone();
        let report = tokio::task::spawn_blocking(move || loader.load_all())
            .await
            .map_err(|err| ReloadError::Join(err.to_string()))??;

        let loaded = self.writer.upsert_documents(&report.documents).await?;

        Ok(ReloadSummary {
            loaded,
            failed: report.failures.len(),
        })
    }
}
