//! Hiring pipeline: the canonical `/applications` resource and the legacy
//! `/candidates` view over the same table.

pub mod applications;
pub mod candidates;

use chrono::Utc;
use uuid::Uuid;

use crate::db::StoreError;
use crate::errors::AppError;
use crate::models::{Application, ApplicationPatch, NewApplication};
use crate::state::AppState;

pub use applications::{ApplicationFilter, ApplicationStatistics};
pub use candidates::{CandidateFilter, DEFAULT_PAGE_SIZE};

/// Ids are shared by both views, so new records use the candidate prefix.
fn new_candidate_id() -> String {
    format!("candidate-{}", Uuid::new_v4().simple())
}

/// Checks the fields a creation request must carry.
fn check_new_application(req: &NewApplication) -> Result<(), AppError> {
    if req.job_id.trim().is_empty() {
        return Err(AppError::Validation("jobId is required".to_string()));
    }
    if req.candidate_name.trim().is_empty() {
        return Err(AppError::Validation("Candidate name is required".to_string()));
    }
    check_email(&req.candidate_email)
}

fn check_email(email: &str) -> Result<(), AppError> {
    if email.trim().contains('@') {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'{email}' is not a valid email address"
        )))
    }
}

/// Two applications clash when they share an email (the index key) and a job.
fn same_job(a: &Application, b: &Application) -> bool {
    a.job_id == b.job_id
}

fn already_applied(err: StoreError) -> AppError {
    match err {
        StoreError::Clash { existing, .. } => AppError::Conflict(format!(
            "This email has already applied to the job as '{existing}'"
        )),
        other => other.into(),
    }
}

/// Validates and stores a new application. The duplicate check and the insert
/// happen under the same table lock.
async fn insert_application(
    state: &AppState,
    req: NewApplication,
) -> Result<Application, AppError> {
    check_new_application(&req)?;
    let app = req.into_application(new_candidate_id(), Utc::now());
    state
        .db
        .applications
        .add_unique(app, "email", same_job)
        .await
        .map_err(already_applied)
}

/// Applies `patch` to application `id`, rejecting a change of email or job
/// that would duplicate another application.
async fn patch_application(
    state: &AppState,
    id: &str,
    patch: ApplicationPatch,
) -> Result<Application, AppError> {
    if let Some(email) = &patch.candidate_email {
        check_email(email)?;
    }
    if patch.job_id.as_deref().is_some_and(|j| j.trim().is_empty()) {
        return Err(AppError::Validation("jobId may not be blank".to_string()));
    }
    let now = Utc::now();
    state
        .db
        .applications
        .update_unique(id, |app| patch.apply(app, now), "email", same_job)
        .await
        .map_err(already_applied)
}
