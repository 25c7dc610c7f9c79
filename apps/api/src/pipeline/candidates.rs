use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{insert_application, patch_application};
use crate::errors::AppError;
use crate::extract::{Body, Params};
use crate::models::{
    Application, ApplicationPatch, Candidate, CandidatePatch, NewApplication, NewCandidate,
    PipelineStage, TimelineEntry,
};
use crate::query::{ListParams, Page, Query};
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Filters accepted by `GET /candidates`. `stage` uses the legacy names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilter {
    pub search: Option<String>,
    pub stage: Option<String>,
    pub job_id: Option<String>,
}

fn name_and_email(app: &Application) -> Vec<&str> {
    vec![app.candidate_name.as_str(), app.candidate_email.as_str()]
}

/// GET /candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Params(filter): Params<CandidateFilter>,
    Params(list): Params<ListParams>,
) -> Result<Json<Page<Candidate>>, AppError> {
    let rows = match filter.job_id.as_deref().map(str::trim) {
        Some(job_id) if !job_id.is_empty() => {
            state.db.applications.find_by("jobId", job_id).await?
        }
        _ => state.db.applications.all().await,
    };

    let mut query =
        Query::<Application>::new().search(filter.search.as_deref(), name_and_email);
    if let Some(stage) = filter.stage.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        // An unrecognised stage is a filter that matches nothing, not an error.
        let status = PipelineStage::from_str(stage).ok().map(PipelineStage::status);
        query = query.filter(move |app: &Application| Some(app.status) == status);
    }

    let page = query.list(&list, Some(DEFAULT_PAGE_SIZE)).run(rows)?;
    Ok(Json(page.map(Candidate::from)))
}

/// GET /candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Candidate>, AppError> {
    let app = state.db.applications.require(&id).await?;
    Ok(Json(Candidate::from(app)))
}

/// GET /candidates/:id/timeline
pub async fn handle_candidate_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TimelineEntry>>, AppError> {
    let app = state.db.applications.require(&id).await?;
    Ok(Json(app.history.iter().map(TimelineEntry::from).collect()))
}

/// PATCH /candidates/:id
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(patch): Body<CandidatePatch>,
) -> Result<Json<Candidate>, AppError> {
    let stage = patch.stage;
    let app = patch_application(&state, &id, ApplicationPatch::from(patch)).await?;
    if let Some(stage) = stage {
        info!(candidate_id = %id, stage = stage.as_str(), "Candidate stage changed");
    }
    Ok(Json(Candidate::from(app)))
}

/// POST /candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Body(req): Body<NewCandidate>,
) -> Result<(StatusCode, Json<Candidate>), AppError> {
    let app = insert_application(&state, NewApplication::from(req)).await?;
    info!(candidate_id = %app.id, job_id = %app.job_id, "Created candidate");
    Ok((StatusCode::CREATED, Json(Candidate::from(app))))
}
