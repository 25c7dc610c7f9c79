use std::path::{Path, PathBuf};

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{Database, StoreError, Table};
use crate::models::{Application, Assessment, Job, Submission};
use crate::state::AppState;

/// On-disk layout of the store: one array per table.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotDoc {
    #[serde(default)]
    jobs: Vec<Job>,
    #[serde(default)]
    applications: Vec<Application>,
    #[serde(default)]
    assessments: Vec<Assessment>,
    #[serde(default)]
    submissions: Vec<Submission>,
}

impl Database {
    /// Opens the store. With a path, rows are loaded from the snapshot when it
    /// exists and every later `flush` rewrites it.
    pub async fn open(path: Option<PathBuf>) -> Result<Self, StoreError> {
        let Some(path) = path else {
            info!("Local store is in-memory only (STORE_PATH unset)");
            return Ok(Database::in_memory());
        };

        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<SnapshotDoc>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No snapshot at {}, starting empty", path.display());
                SnapshotDoc::default()
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            jobs = doc.jobs.len(),
            applications = doc.applications.len(),
            assessments = doc.assessments.len(),
            submissions = doc.submissions.len(),
            "Loaded local store from {}",
            path.display()
        );

        Ok(Database {
            jobs: Table::from_rows(doc.jobs)?,
            applications: Table::from_rows(doc.applications)?,
            assessments: Table::from_rows(doc.assessments)?,
            submissions: Table::from_rows(doc.submissions)?,
            snapshot_path: Some(path),
            flush_lock: Mutex::new(()),
        })
    }

    /// Writes the whole store to the snapshot file. No-op when in-memory.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().await;

        let doc = SnapshotDoc {
            jobs: self.jobs.all().await,
            applications: self.applications.all().await,
            assessments: self.assessments.all().await,
            submissions: self.submissions.all().await,
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        write_atomically(path, &bytes).await?;
        debug!(bytes = bytes.len(), "Flushed local store to {}", path.display());
        Ok(())
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Middleware: persist the store after every successful mutating request.
///
/// The mutation is already applied in memory when the flush runs, so a failed
/// write is logged and the handler's response is still returned. The snapshot
/// then lags the store until the next successful flush.
pub async fn flush_after_mutation(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let mutating = req.method() != Method::GET;
    let response = next.run(req).await;
    if mutating && response.status().is_success() {
        if let Err(e) = state.db.flush().await {
            error!(error = %e, "Snapshot flush failed, store and file have diverged");
        }
    }
    response
}
