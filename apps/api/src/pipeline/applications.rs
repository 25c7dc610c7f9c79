use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{insert_application, patch_application};
use crate::errors::AppError;
use crate::extract::{Body, Params};
use crate::models::{Application, ApplicationPatch, NewApplication, StatusUpdate};
use crate::query::{ListParams, Page, Query};
use crate::state::AppState;

/// Filters accepted by `GET /applications`. `job` is an alias for `jobId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    pub job_id: Option<String>,
    pub job: Option<String>,
    pub status: Option<String>,
}

impl ApplicationFilter {
    fn job(&self) -> Option<&str> {
        self.job_id
            .as_deref()
            .or(self.job.as_deref())
            .map(str::trim)
            .filter(|j| !j.is_empty())
    }
}

/// Response of `GET /applications/statistics`: one count per status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatistics {
    pub total_applications: usize,
    pub applied: usize,
    pub screening: usize,
    pub interview: usize,
    pub offer: usize,
    pub rejected: usize,
    pub hired: usize,
}

impl ApplicationStatistics {
    fn from_counts(counts: &BTreeMap<String, usize>) -> Self {
        let count = |status: &str| counts.get(status).copied().unwrap_or(0);
        ApplicationStatistics {
            total_applications: counts.values().sum(),
            applied: count("applied"),
            screening: count("screening"),
            interview: count("interview"),
            offer: count("offer"),
            rejected: count("rejected"),
            hired: count("hired"),
        }
    }
}

/// GET /applications
/// Unpaged unless `page` or `pageSize` is given.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Params(filter): Params<ApplicationFilter>,
    Params(list): Params<ListParams>,
) -> Result<Json<Page<Application>>, AppError> {
    let rows = match filter.job() {
        Some(job_id) => state.db.applications.find_by("jobId", job_id).await?,
        None => state.db.applications.all().await,
    };
    let page = Query::<Application>::new()
        .matching(filter.status.as_deref(), |a| a.status.as_str())
        .list(&list, None)
        .run(rows)?;
    Ok(Json(page))
}

/// GET /applications/job-counts
pub async fn handle_job_counts(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, usize>>, AppError> {
    Ok(Json(state.db.applications.count_by("jobId").await?))
}

/// GET /applications/statistics
pub async fn handle_application_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApplicationStatistics>, AppError> {
    let counts = state.db.applications.count_by("status").await?;
    Ok(Json(ApplicationStatistics::from_counts(&counts)))
}

/// POST /applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    Body(req): Body<NewApplication>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let app = insert_application(&state, req).await?;
    info!(application_id = %app.id, job_id = %app.job_id, "Created application");
    Ok((StatusCode::CREATED, Json(app)))
}

/// PATCH /applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(req): Body<StatusUpdate>,
) -> Result<Json<Application>, AppError> {
    let now = Utc::now();
    let app = state
        .db
        .applications
        .update(&id, |app| app.transition(req.status, now))
        .await?;
    info!(application_id = %id, status = %req.status, "Application status changed");
    Ok(Json(app))
}

/// PATCH /applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(patch): Body<ApplicationPatch>,
) -> Result<Json<Application>, AppError> {
    let app = patch_application(&state, &id, patch).await?;
    Ok(Json(app))
}

/// DELETE /applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.db.applications.delete(&id).await?;
    info!(application_id = %id, "Deleted application");
    Ok(StatusCode::NO_CONTENT)
}
