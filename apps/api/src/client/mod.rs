//! In-process client for the mock API.
//!
//! Requests are dispatched straight into the `Router` with
//! `tower::ServiceExt::oneshot`, so they pass through exactly the same
//! latency, failure and persistence layers as TCP traffic without opening a
//! socket.

pub mod board;

use std::collections::BTreeMap;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower::ServiceExt;

use crate::assessments::AssessmentFilter;
use crate::dashboard::DashboardStatistics;
use crate::jobs::JobFilter;
use crate::models::{
    Application, ApplicationPatch, ApplicationStatus, Assessment, AssessmentDraft, Candidate,
    CandidatePatch, Job, JobPatch, NewApplication, NewCandidate, NewJob, ReorderRequest,
    StatusUpdate, Submission, SubmissionRequest, TimelineEntry,
};
use crate::pipeline::{ApplicationFilter, ApplicationStatistics, CandidateFilter};
use crate::query::{ListParams, Page};
use crate::routes::build_router;
use crate::state::AppState;

pub use board::{JobBoard, PipelineBoard};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a non-success status.
    #[error("{status} {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No local record '{0}'")]
    UnknownRecord(String),
}

impl ClientError {
    /// True for the transient failures injected by the network simulation.
    pub fn is_simulated_failure(&self) -> bool {
        matches!(self, ClientError::Status { code, .. } if code == "SIMULATED_FAILURE")
    }
}

#[derive(Clone)]
pub struct ApiClient {
    router: Router,
}

impl ApiClient {
    pub fn new(router: Router) -> Self {
        ApiClient { router }
    }

    pub fn from_state(state: AppState) -> Self {
        ApiClient::new(build_router(state))
    }

    /// Sends one request and returns the raw body of a 2xx response.
    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ClientError> {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if status.is_success() {
            return Ok(bytes.to_vec());
        }
        let (code, message) = error_parts(&bytes);
        Err(ClientError::Status {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, uri: &str) -> Result<T, ClientError> {
        let bytes = self.send(Method::GET, uri, None).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_json<B, T>(&self, method: Method, uri: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .send(method, uri, Some(serde_json::to_vec(body)?))
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn delete(&self, uri: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, uri, None).await.map(|_| ())
    }

    // Jobs

    pub async fn list_jobs(
        &self,
        filter: &JobFilter,
        list: &ListParams,
    ) -> Result<Page<Job>, ClientError> {
        self.get(&with_query("/jobs", &[to_params(filter)?, to_params(list)?]))
            .await
    }

    pub async fn list_companies(&self) -> Result<Vec<String>, ClientError> {
        self.get("/jobs/companies").await
    }

    pub async fn get_job(&self, id: &str) -> Result<Job, ClientError> {
        self.get(&format!("/jobs/{}", segment(id))).await
    }

    pub async fn create_job(&self, job: &NewJob) -> Result<Job, ClientError> {
        self.send_json(Method::POST, "/jobs", job).await
    }

    pub async fn update_job(&self, id: &str, patch: &JobPatch) -> Result<Job, ClientError> {
        self.send_json(Method::PATCH, &format!("/jobs/{}", segment(id)), patch)
            .await
    }

    pub async fn reorder_job(
        &self,
        id: &str,
        from_order: i64,
        to_order: i64,
    ) -> Result<Job, ClientError> {
        self.send_json(
            Method::PATCH,
            &format!("/jobs/{}/reorder", segment(id)),
            &ReorderRequest {
                from_order,
                to_order,
            },
        )
        .await
    }

    pub async fn delete_job(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/jobs/{}", segment(id))).await
    }

    // Candidates

    pub async fn list_candidates(
        &self,
        filter: &CandidateFilter,
        list: &ListParams,
    ) -> Result<Page<Candidate>, ClientError> {
        self.get(&with_query(
            "/candidates",
            &[to_params(filter)?, to_params(list)?],
        ))
        .await
    }

    pub async fn get_candidate(&self, id: &str) -> Result<Candidate, ClientError> {
        self.get(&format!("/candidates/{}", segment(id))).await
    }

    pub async fn candidate_timeline(&self, id: &str) -> Result<Vec<TimelineEntry>, ClientError> {
        self.get(&format!("/candidates/{}/timeline", segment(id)))
            .await
    }

    pub async fn update_candidate(
        &self,
        id: &str,
        patch: &CandidatePatch,
    ) -> Result<Candidate, ClientError> {
        self.send_json(Method::PATCH, &format!("/candidates/{}", segment(id)), patch)
            .await
    }

    pub async fn create_candidate(
        &self,
        candidate: &NewCandidate,
    ) -> Result<Candidate, ClientError> {
        self.send_json(Method::POST, "/candidates", candidate).await
    }

    // Applications

    pub async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        list: &ListParams,
    ) -> Result<Page<Application>, ClientError> {
        self.get(&with_query(
            "/applications",
            &[to_params(filter)?, to_params(list)?],
        ))
        .await
    }

    pub async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<Application, ClientError> {
        self.send_json(Method::POST, "/applications", application)
            .await
    }

    pub async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, ClientError> {
        self.send_json(
            Method::PATCH,
            &format!("/applications/{}/status", segment(id)),
            &StatusUpdate { status },
        )
        .await
    }

    pub async fn update_application(
        &self,
        id: &str,
        patch: &ApplicationPatch,
    ) -> Result<Application, ClientError> {
        self.send_json(
            Method::PATCH,
            &format!("/applications/{}", segment(id)),
            patch,
        )
        .await
    }

    pub async fn delete_application(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/applications/{}", segment(id))).await
    }

    pub async fn job_counts(&self) -> Result<BTreeMap<String, usize>, ClientError> {
        self.get("/applications/job-counts").await
    }

    pub async fn application_statistics(&self) -> Result<ApplicationStatistics, ClientError> {
        self.get("/applications/statistics").await
    }

    // Assessments

    pub async fn list_assessments(
        &self,
        filter: &AssessmentFilter,
        list: &ListParams,
    ) -> Result<Page<Assessment>, ClientError> {
        self.get(&with_query(
            "/assessments",
            &[to_params(filter)?, to_params(list)?],
        ))
        .await
    }

    pub async fn get_assessment(&self, job_id: &str) -> Result<Assessment, ClientError> {
        self.get(&format!("/assessments/{}", segment(job_id))).await
    }

    pub async fn put_assessment(
        &self,
        job_id: &str,
        draft: &AssessmentDraft,
    ) -> Result<Assessment, ClientError> {
        self.send_json(
            Method::PUT,
            &format!("/assessments/{}", segment(job_id)),
            draft,
        )
        .await
    }

    pub async fn delete_assessment(&self, job_id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/assessments/{}", segment(job_id)))
            .await
    }

    pub async fn submit_assessment(
        &self,
        job_id: &str,
        submission: &SubmissionRequest,
    ) -> Result<Submission, ClientError> {
        self.send_json(
            Method::POST,
            &format!("/assessments/{}/submit", segment(job_id)),
            submission,
        )
        .await
    }

    // Dashboard

    pub async fn dashboard_statistics(&self) -> Result<DashboardStatistics, ClientError> {
        self.get("/dashboard/statistics").await
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.get("/health").await
    }

    /// PATCH with an arbitrary JSON body, for payloads the typed methods
    /// cannot express.
    pub async fn raw_patch(&self, uri: &str, body: &Value) -> Result<Value, ClientError> {
        self.send_json(Method::PATCH, uri, body).await
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Flattens a serializable parameter struct into `(key, value)` pairs,
/// dropping absent fields.
fn to_params<T: Serialize>(params: &T) -> Result<Vec<(String, String)>, ClientError> {
    let Value::Object(fields) = serde_json::to_value(params)? else {
        return Ok(Vec::new());
    };
    Ok(fields
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

fn with_query(path: &str, groups: &[Vec<(String, String)>]) -> String {
    let pairs: Vec<String> = groups
        .iter()
        .flatten()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect();
    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", pairs.join("&"))
    }
}

fn error_parts(body: &[u8]) -> (String, String) {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let field = |name: &str| {
        error
            .and_then(|e| e.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    (
        field("code").unwrap_or_else(|| "UNKNOWN".to_string()),
        field("message").unwrap_or_else(|| String::from_utf8_lossy(body).into_owned()),
    )
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::testing::{client_with, seeded_client};
    use super::*;
    use crate::network::{FailNext, RandomFaults};
    use crate::query::SortDirection;
    use crate::seed::SeedConfig;

    #[test]
    fn test_query_string_skips_absent_and_encodes() {
        let filter = JobFilter {
            search: Some("front end & ui".to_string()),
            ..JobFilter::default()
        };
        let list = ListParams {
            direction: Some(SortDirection::Asc),
            page: Some(2),
            ..ListParams::default()
        };
        let uri = with_query(
            "/jobs",
            &[to_params(&filter).unwrap(), to_params(&list).unwrap()],
        );
        assert_eq!(
            uri,
            "/jobs?search=front%20end%20%26%20ui&direction=asc&page=2"
        );
    }

    #[test]
    fn test_error_parts_falls_back_to_raw_body() {
        let (code, message) = error_parts(b"not json");
        assert_eq!(code, "UNKNOWN");
        assert_eq!(message, "not json");
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_bypasses_fault_layer() {
        let slow = Arc::new(RandomFaults::new(10_000..=10_000, 0.0, Some(1)));
        let (client, _) = client_with(&SeedConfig::fixed(), slow).await;

        let started = tokio::time::Instant::now();
        let body = client.health().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert!(started.elapsed() < Duration::from_secs(1));

        client.get_job("job-1").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_simulated_failure_leaves_store_untouched() {
        let faults = Arc::new(FailNext::new(1));
        let (client, state) = client_with(&SeedConfig::fixed(), faults.clone()).await;
        let before = state.db.jobs.require("job-1").await.unwrap();

        let err = client
            .update_job(
                "job-1",
                &JobPatch {
                    title: Some("Changed".to_string()),
                    ..JobPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_simulated_failure());
        assert!(matches!(err, ClientError::Status { status: 500, .. }));
        assert_eq!(state.db.jobs.require("job-1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_reads_are_never_failed() {
        let (client, _) = client_with(&SeedConfig::fixed(), Arc::new(FailNext::new(5))).await;
        for _ in 0..5 {
            client.get_job("job-1").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_malformed_page_is_validation_error() {
        let (client, _) = seeded_client().await;
        let err = client.get::<Value>("/jobs?page=first").await.unwrap_err();
        match err {
            ClientError::Status { status, code, .. } => {
                assert_eq!(status, 400);
                assert_eq!(code, "VALIDATION_ERROR");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_negative_or_empty_page_is_clamped() {
        let (client, _) = seeded_client().await;
        let page: Page<Job> = client.get("/jobs?page=-1&pageSize=").await.unwrap();
        assert_eq!(page.page, Some(1));
        assert_eq!(page.page_size, Some(10));

        let page: Page<Job> = client.get("/jobs?page=0&pageSize=-5").await.unwrap();
        assert_eq!(page.page_size, Some(1));
        assert_eq!(page.data.len(), 1);
    }
}
