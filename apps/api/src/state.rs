use std::sync::Arc;

use crate::dashboard::SyntheticCounters;
use crate::db::Database;
use crate::network::FaultInjector;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// Latency and failure injection. Swap for `NoFaults` or `FailNext` in tests.
    pub faults: Arc<dyn FaultInjector>,
    /// Stand-in generator for dashboard numbers that have no backing entity.
    pub synthetic: Arc<SyntheticCounters>,
}

impl AppState {
    pub fn new(db: Arc<Database>, faults: Arc<dyn FaultInjector>) -> Self {
        AppState {
            db,
            faults,
            synthetic: Arc::new(SyntheticCounters::from_os_rng()),
        }
    }
}
