use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::ordering::apply_reorder;
use crate::db::StoreError;
use crate::errors::AppError;
use crate::extract::{Body, Params};
use crate::models::job::slugify;
use crate::models::{Job, JobPatch, JobStatus, NewJob, ReorderRequest};
use crate::query::{ListParams, Page, Query};
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Filters accepted by `GET /jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub job_type: Option<String>,
    pub company: Option<String>,
}

fn title_and_tags(job: &Job) -> Vec<&str> {
    std::iter::once(job.title.as_str())
        .chain(job.tags.iter().map(String::as_str))
        .collect()
}

/// GET /jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Params(filter): Params<JobFilter>,
    Params(list): Params<ListParams>,
) -> Result<Json<Page<Job>>, AppError> {
    let rows = match filter.status.as_deref().map(str::trim) {
        Some(status) if !status.is_empty() => state.db.jobs.find_by("status", status).await?,
        _ => state.db.jobs.all().await,
    };

    let page = Query::<Job>::new()
        .search(filter.search.as_deref(), title_and_tags)
        .matching(filter.job_type.as_deref(), |j| j.job_type.as_str())
        .matching(filter.company.as_deref(), |j| j.company.as_deref().unwrap_or(""))
        .list(&list, Some(DEFAULT_PAGE_SIZE))
        .run(rows)?;
    Ok(Json(page))
}

/// GET /jobs/companies
pub async fn handle_list_companies(State(state): State<AppState>) -> Json<Vec<String>> {
    let companies: BTreeSet<String> = state
        .db
        .jobs
        .all()
        .await
        .into_iter()
        .filter_map(|job| job.company)
        .filter(|company| !company.trim().is_empty())
        .collect();
    Json(companies.into_iter().collect())
}

/// GET /jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(state.db.jobs.require(&id).await?))
}

/// POST /jobs
/// New jobs go to the end of the board.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Body(req): Body<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Job title must not be empty".to_string()));
    }

    let next_order = state
        .db
        .jobs
        .all()
        .await
        .iter()
        .map(|j| j.order + 1)
        .max()
        .unwrap_or(0);

    let requested_slug = req.slug.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let derived = requested_slug.is_none();
    let job = Job {
        id: format!("job-{}", Uuid::new_v4().simple()),
        slug: requested_slug.unwrap_or_else(|| slugify(&title)),
        title,
        status: req.status.unwrap_or(JobStatus::Active),
        tags: req.tags,
        order: next_order,
        description: req.description,
        requirements: req.requirements,
        salary: req.salary,
        location: req.location,
        job_type: req.job_type,
        company: req.company,
        created_at: Utc::now(),
    };
    let job = insert_with_free_slug(&state, job, derived).await?;
    info!(job_id = %job.id, slug = %job.slug, order = job.order, "Created job");
    Ok((StatusCode::CREATED, Json(job)))
}

fn slug_taken(slug: &str) -> AppError {
    AppError::Conflict(format!("Slug '{slug}' is already in use"))
}

/// Stores `job`, keeping slugs unique. A slug derived from the title gets a
/// numeric suffix on collision; a caller-chosen one is a conflict.
async fn insert_with_free_slug(
    state: &AppState,
    mut job: Job,
    derived: bool,
) -> Result<Job, AppError> {
    let base = job.slug.clone();
    let mut attempt = 1;
    loop {
        match state.db.jobs.add_unique(job.clone(), "slug", |_, _| true).await {
            Err(StoreError::Clash { .. }) if derived => {
                attempt += 1;
                job.slug = format!("{base}-{attempt}");
            }
            Err(StoreError::Clash { .. }) => return Err(slug_taken(&job.slug)),
            result => return Ok(result?),
        }
    }
}

/// PATCH /jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(patch): Body<JobPatch>,
) -> Result<Json<Job>, AppError> {
    if matches!(patch.title.as_deref(), Some(t) if t.trim().is_empty()) {
        return Err(AppError::Validation("Job title must not be empty".to_string()));
    }
    let slug = patch.slug.clone();
    let renames = slug.is_some();
    let job = state
        .db
        .jobs
        .update_unique(&id, |job| patch.apply(job), "slug", |_, _| renames)
        .await
        .map_err(|e| match e {
            StoreError::Clash { .. } => slug_taken(slug.as_deref().unwrap_or_default()),
            e => e.into(),
        })?;
    Ok(Json(job))
}

/// PATCH /jobs/:id/reorder
pub async fn handle_reorder_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(req): Body<ReorderRequest>,
) -> Result<Json<Job>, AppError> {
    let last = state
        .db
        .jobs
        .all()
        .await
        .iter()
        .map(|j| j.order)
        .max()
        .unwrap_or(0);
    if !(0..=last).contains(&req.to_order) {
        return Err(AppError::Validation(format!(
            "toOrder {} is outside the board (0..={last})",
            req.to_order
        )));
    }

    let moved = state
        .db
        .jobs
        .mutate(|rows| apply_reorder(rows, &id, req.to_order))
        .await?;
    debug!(
        job_id = %id,
        from = req.from_order,
        to = req.to_order,
        "Reordered job"
    );
    Ok(Json(moved))
}

/// DELETE /jobs/:id
/// Applications and assessments pointing at the job are left in place.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.db.jobs.delete(&id).await?;
    info!(job_id = %id, "Deleted job");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::client::testing::seeded_client;
    use crate::client::ClientError;
    use crate::models::{JobPatch, JobStatus, JobType, NewJob};
    use crate::query::{ListParams, SortDirection};

    use super::JobFilter;

    #[tokio::test]
    async fn test_list_defaults_to_first_page_of_ten() {
        let (client, _) = seeded_client().await;
        let page = client
            .list_jobs(&JobFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.page, Some(1));
        assert_eq!(page.page_size, Some(10));
    }

    #[tokio::test]
    async fn test_status_filter_uses_index() {
        let (client, state) = seeded_client().await;
        let archived = state.db.jobs.find_by("status", "archived").await.unwrap();
        let page = client
            .list_jobs(
                &JobFilter {
                    status: Some("archived".to_string()),
                    ..JobFilter::default()
                },
                &ListParams {
                    page_size: Some(100),
                    ..ListParams::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, archived.len());
        assert!(page.data.iter().all(|j| j.status == JobStatus::Archived));
    }

    #[tokio::test]
    async fn test_sort_by_order_ascending() {
        let (client, _) = seeded_client().await;
        let page = client
            .list_jobs(
                &JobFilter::default(),
                &ListParams {
                    sort: Some("order".to_string()),
                    direction: Some(SortDirection::Asc),
                    page_size: Some(100),
                    ..ListParams::default()
                },
            )
            .await
            .unwrap();
        let orders: Vec<i64> = page.data.iter().map(|j| j.order).collect();
        assert_eq!(orders, (0..25).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_unknown_sort_is_bad_request() {
        let (client, _) = seeded_client().await;
        let err = client
            .list_jobs(
                &JobFilter::default(),
                &ListParams {
                    sort: Some("salary".to_string()),
                    ..ListParams::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_companies_are_sorted_and_distinct() {
        let (client, _) = seeded_client().await;
        let companies = client.list_companies().await.unwrap();
        assert!(!companies.is_empty());
        assert!(companies.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_create_appends_to_board() {
        let (client, _) = seeded_client().await;
        let job = client
            .create_job(&NewJob {
                title: "Platform Engineer".to_string(),
                slug: None,
                status: None,
                tags: vec!["Rust".to_string()],
                description: String::new(),
                requirements: vec![],
                salary: String::new(),
                location: "Remote".to_string(),
                job_type: JobType::Remote,
                company: None,
            })
            .await
            .unwrap();
        assert_eq!(job.order, 25);
        assert_eq!(job.slug, "platform-engineer");
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(client.get_job(&job.id).await.unwrap(), job);
    }

    fn titled(title: &str, slug: Option<&str>) -> NewJob {
        NewJob {
            title: title.to_string(),
            slug: slug.map(str::to_string),
            status: None,
            tags: vec![],
            description: String::new(),
            requirements: vec![],
            salary: String::new(),
            location: "Remote".to_string(),
            job_type: JobType::Remote,
            company: None,
        }
    }

    #[tokio::test]
    async fn test_same_title_gets_distinct_slugs() {
        let (client, state) = seeded_client().await;
        let first = client.create_job(&titled("Data Engineer", None)).await.unwrap();
        let second = client.create_job(&titled("Data Engineer", None)).await.unwrap();
        assert_eq!(first.slug, "data-engineer");
        assert_eq!(second.slug, "data-engineer-2");
        for slug in [&first.slug, &second.slug] {
            assert_eq!(state.db.jobs.find_by("slug", slug).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_taken_slug_is_conflict() {
        let (client, state) = seeded_client().await;
        let existing = state.db.jobs.require("job-2").await.unwrap();

        let err = client
            .create_job(&titled("Anything", Some(&existing.slug)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 409, .. }));

        let patch = JobPatch {
            slug: Some(existing.slug.clone()),
            ..JobPatch::default()
        };
        let err = client.update_job("job-1", &patch).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 409, .. }));
        assert_ne!(state.db.jobs.require("job-1").await.unwrap().slug, existing.slug);
    }

    #[tokio::test]
    async fn test_archive_toggle_round_trip() {
        let (client, _) = seeded_client().await;
        let before = client.get_job("job-1").await.unwrap();
        let patch = JobPatch {
            status: Some(before.status.toggled()),
            ..JobPatch::default()
        };
        let after = client.update_job("job-1", &patch).await.unwrap();
        assert_eq!(after.status, before.status.toggled());
        assert_eq!(after.title, before.title);
    }

    #[tokio::test]
    async fn test_missing_job_is_404() {
        let (client, _) = seeded_client().await;
        let err = client.get_job("job-missing").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
        let err = client
            .update_job("job-missing", &JobPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_reorder_rejects_positions_off_the_board() {
        let (client, _) = seeded_client().await;
        let err = client.reorder_job("job-1", 0, 25).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_delete_does_not_cascade() {
        let (client, state) = seeded_client().await;
        let before = state.db.applications.find_by("jobId", "job-1").await.unwrap();
        client.delete_job("job-1").await.unwrap();
        let after = state.db.applications.find_by("jobId", "job-1").await.unwrap();
        assert_eq!(before.len(), after.len());
        assert!(client.get_job("job-1").await.is_err());
    }
}
