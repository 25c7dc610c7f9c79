// Local store: one document table per entity, optionally backed by a JSON snapshot.
// Tables relate only through the advisory `job_id` field; nothing cascades.

pub mod bootstrap;
pub mod snapshot;
pub mod table;

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{Application, Assessment, Job, Submission};

pub use table::{IndexSpec, Record, Table};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} record '{id}' already exists")]
    Duplicate { table: &'static str, id: String },

    #[error("{table} record '{id}' not found")]
    NotFound { table: &'static str, id: String },

    #[error("{table} record '{id}' clashes with '{existing}' on {index}")]
    Clash {
        table: &'static str,
        id: String,
        existing: String,
        index: String,
    },

    #[error("{table} has no index named '{index}'")]
    UnknownIndex { table: &'static str, index: String },

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    pub fn duplicate<T: Record>(id: &str) -> Self {
        StoreError::Duplicate {
            table: T::TABLE,
            id: id.to_string(),
        }
    }

    pub fn not_found<T: Record>(id: &str) -> Self {
        StoreError::NotFound {
            table: T::TABLE,
            id: id.to_string(),
        }
    }
}

/// The explicit repository handed to every handler through `AppState`.
pub struct Database {
    pub jobs: Table<Job>,
    pub applications: Table<Application>,
    pub assessments: Table<Assessment>,
    pub submissions: Table<Submission>,
    snapshot_path: Option<PathBuf>,
    flush_lock: Mutex<()>,
}

impl Database {
    /// An empty, purely in-memory database.
    pub fn in_memory() -> Self {
        Database {
            jobs: Table::new(),
            applications: Table::new(),
            assessments: Table::new(),
            submissions: Table::new(),
            snapshot_path: None,
            flush_lock: Mutex::new(()),
        }
    }
}
