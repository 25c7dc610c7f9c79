use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::validation::validate_answers;
use crate::errors::AppError;
use crate::extract::{Body, Params};
use crate::models::{Assessment, AssessmentDraft, Submission, SubmissionRequest};
use crate::query::{ListParams, Page, Query};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentFilter {
    pub job_id: Option<String>,
}

async fn assessment_for_job(state: &AppState, job_id: &str) -> Result<Assessment, AppError> {
    state
        .db
        .assessments
        .find_by("jobId", job_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("No assessment for job '{job_id}'")))
}

/// GET /assessments
pub async fn handle_list_assessments(
    State(state): State<AppState>,
    Params(filter): Params<AssessmentFilter>,
    Params(list): Params<ListParams>,
) -> Result<Json<Page<Assessment>>, AppError> {
    let page = Query::<Assessment>::new()
        .matching(filter.job_id.as_deref(), |a| a.job_id.as_str())
        .list(&list, None)
        .run(state.db.assessments.all().await)?;
    Ok(Json(page))
}

/// GET /assessments/:jobId
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Assessment>, AppError> {
    Ok(Json(assessment_for_job(&state, &job_id).await?))
}

/// PUT /assessments/:jobId
/// Creates the job's assessment or replaces it, keeping the original `createdAt`.
pub async fn handle_put_assessment(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Body(draft): Body<AssessmentDraft>,
) -> Result<Json<Assessment>, AppError> {
    let mut ids = HashSet::new();
    if let Some(dup) = draft
        .sections
        .iter()
        .flat_map(|s| &s.questions)
        .find(|q| !ids.insert(q.id.as_str()))
    {
        return Err(AppError::Validation(format!(
            "Question id '{}' is used more than once",
            dup.id
        )));
    }

    let now = Utc::now();
    let id = Assessment::id_for_job(&job_id);
    let created_at = state
        .db
        .assessments
        .get(&id)
        .await
        .map(|existing| existing.created_at)
        .unwrap_or(now);

    let assessment = Assessment {
        title: draft
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Assessment for {job_id}")),
        id,
        job_id,
        sections: draft.sections,
        created_at,
        updated_at: now,
    };
    let replaced = state.db.assessments.upsert(assessment.clone()).await;
    info!(
        assessment_id = %assessment.id,
        questions = assessment.question_count(),
        replaced = replaced.is_some(),
        "Saved assessment"
    );
    Ok(Json(assessment))
}

/// DELETE /assessments/:jobId
pub async fn handle_delete_assessment(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .db
        .assessments
        .delete(&Assessment::id_for_job(&job_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /assessments/:jobId/submit
pub async fn handle_submit_assessment(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Body(req): Body<SubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let assessment = assessment_for_job(&state, &job_id).await?;
    state.db.applications.require(&req.candidate_id).await?;

    if let Err(errors) = validate_answers(&assessment, &req.answers) {
        warn!(
            assessment_id = %assessment.id,
            candidate_id = %req.candidate_id,
            violations = errors.len(),
            "Rejected assessment submission"
        );
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Validation(message));
    }

    let submission = Submission {
        id: format!("submission-{}", Uuid::new_v4().simple()),
        assessment_id: assessment.id,
        job_id,
        candidate_id: req.candidate_id,
        answers: req.answers,
        submitted_at: Utc::now(),
    };
    let submission = state.db.submissions.add(submission).await?;
    info!(submission_id = %submission.id, "Recorded assessment submission");
    Ok((StatusCode::CREATED, Json(submission)))
}
