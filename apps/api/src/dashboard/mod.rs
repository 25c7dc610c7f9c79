//! Cross-entity counters for the HR dashboard landing page.

use std::sync::Mutex;

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{ApplicationStatus, JobStatus};
use crate::state::AppState;

/// Applications newer than this count as new candidates.
const NEW_CANDIDATE_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_candidates: usize,
    pub new_candidates: usize,
    pub hired_candidates: usize,
    pub total_assessments: usize,
    pub completed_assessments: usize,
    pub interviews_scheduled: u32,
    pub offers_pending: u32,
}

/// Placeholder numbers for interviews and offers, which have no backing
/// entity yet. Values are drawn fresh on every request.
pub struct SyntheticCounters {
    rng: Mutex<StdRng>,
}

impl SyntheticCounters {
    pub fn from_os_rng() -> Self {
        SyntheticCounters {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        SyntheticCounters {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Returns `(interviews_scheduled, offers_pending)`: 5..=14 and 1..=5.
    pub fn draw(&self) -> (u32, u32) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        (rng.random_range(5..=14), rng.random_range(1..=5))
    }
}

/// GET /dashboard/statistics
pub async fn handle_dashboard_statistics(
    State(state): State<AppState>,
) -> Result<Json<DashboardStatistics>, AppError> {
    let db = &state.db;
    let job_counts = db.jobs.count_by("status").await?;
    let status_counts = db.applications.count_by("status").await?;

    let since = Utc::now() - Duration::days(NEW_CANDIDATE_WINDOW_DAYS);
    let new_candidates = db
        .applications
        .all()
        .await
        .iter()
        .filter(|app| app.applied_at >= since)
        .count();

    let (interviews_scheduled, offers_pending) = state.synthetic.draw();

    Ok(Json(DashboardStatistics {
        total_jobs: job_counts.values().sum(),
        active_jobs: job_counts
            .get(JobStatus::Active.as_str())
            .copied()
            .unwrap_or(0),
        total_candidates: status_counts.values().sum(),
        new_candidates,
        hired_candidates: status_counts
            .get(ApplicationStatus::Hired.as_str())
            .copied()
            .unwrap_or(0),
        total_assessments: db.assessments.count().await,
        completed_assessments: db.submissions.count().await,
        interviews_scheduled,
        offers_pending,
    }))
}
