//! Client-side boards that apply changes optimistically.
//!
//! Every mutation updates local state first and then calls the API. On
//! success the server's record replaces the local one. On failure the whole
//! collection is refetched; local edits are never partially undone.

use tracing::{debug, warn};

use super::{ApiClient, ClientError};
use crate::jobs::{ordering::move_item, JobFilter};
use crate::models::{Candidate, CandidatePatch, Job, JobPatch, PipelineStage};
use crate::pipeline::CandidateFilter;
use crate::query::{ListParams, SortDirection, MAX_PAGE_SIZE};

/// Fetches every page of a listing.
macro_rules! fetch_all {
    ($client:expr, $method:ident, $filter:expr, $sort:expr) => {{
        let mut rows = Vec::new();
        let mut page = 1;
        loop {
            let list = ListParams {
                sort: $sort,
                direction: Some(SortDirection::Asc),
                page: Some(page),
                page_size: Some(MAX_PAGE_SIZE as i64),
            };
            let batch = $client.$method($filter, &list).await?;
            let done = batch.data.is_empty() || rows.len() + batch.data.len() >= batch.total;
            rows.extend(batch.data);
            if done {
                break;
            }
            page += 1;
        }
        rows
    }};
}

/// The drag-ordered job board.
pub struct JobBoard {
    client: ApiClient,
    jobs: Vec<Job>,
}

impl JobBoard {
    pub fn new(client: ApiClient) -> Self {
        JobBoard {
            client,
            jobs: Vec::new(),
        }
    }

    /// Jobs in board order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn ids(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.id.as_str()).collect()
    }

    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.jobs = fetch_all!(
            self.client,
            list_jobs,
            &JobFilter::default(),
            Some("order".to_string())
        );
        debug!(jobs = self.jobs.len(), "Refreshed job board");
        Ok(())
    }

    /// Moves the job at board index `from` to index `to`.
    ///
    /// The local list is reordered immediately; only the moved job's old and
    /// new `order` values are sent. A failed request triggers a full refetch
    /// and the request's error is returned.
    pub async fn reorder(&mut self, from: usize, to: usize) -> Result<(), ClientError> {
        if from == to || from >= self.jobs.len() || to >= self.jobs.len() {
            return Ok(());
        }
        let id = self.jobs[from].id.clone();
        let from_order = self.jobs[from].order;
        let to_order = self.jobs[to].order;

        let orders: Vec<i64> = self.jobs.iter().map(|j| j.order).collect();
        move_item(&mut self.jobs, from, to);
        for (job, order) in self.jobs.iter_mut().zip(orders) {
            job.order = order;
        }

        match self.client.reorder_job(&id, from_order, to_order).await {
            Ok(_) => Ok(()),
            Err(err) => Err(self.roll_back(err).await),
        }
    }

    /// Flips the job at `index` between active and archived.
    pub async fn toggle_archive(&mut self, index: usize) -> Result<Job, ClientError> {
        let job = self
            .jobs
            .get_mut(index)
            .ok_or_else(|| ClientError::UnknownRecord(format!("board index {index}")))?;
        job.status = job.status.toggled();
        let id = job.id.clone();
        let patch = JobPatch {
            status: Some(job.status),
            ..JobPatch::default()
        };

        match self.client.update_job(&id, &patch).await {
            Ok(saved) => {
                if let Some(slot) = self.jobs.iter_mut().find(|j| j.id == saved.id) {
                    *slot = saved.clone();
                }
                Ok(saved)
            }
            Err(err) => Err(self.roll_back(err).await),
        }
    }

    async fn roll_back(&mut self, err: ClientError) -> ClientError {
        warn!(error = %err, "Job board update failed, refetching");
        if let Err(refresh_err) = self.refresh().await {
            warn!(error = %refresh_err, "Job board refetch failed");
        }
        err
    }
}

/// Candidates of one job (or all jobs) grouped by pipeline stage.
pub struct PipelineBoard {
    client: ApiClient,
    job_id: Option<String>,
    candidates: Vec<Candidate>,
}

impl PipelineBoard {
    pub fn new(client: ApiClient, job_id: Option<String>) -> Self {
        PipelineBoard {
            client,
            job_id,
            candidates: Vec::new(),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn in_stage(&self, stage: PipelineStage) -> Vec<&Candidate> {
        self.candidates.iter().filter(|c| c.stage == stage).collect()
    }

    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let filter = CandidateFilter {
            job_id: self.job_id.clone(),
            ..CandidateFilter::default()
        };
        self.candidates = fetch_all!(
            self.client,
            list_candidates,
            &filter,
            Some("appliedAt".to_string())
        );
        debug!(candidates = self.candidates.len(), "Refreshed pipeline board");
        Ok(())
    }

    /// Moves candidate `id` to `stage`, optimistically.
    pub async fn move_to(
        &mut self,
        id: &str,
        stage: PipelineStage,
    ) -> Result<Candidate, ClientError> {
        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::UnknownRecord(id.to_string()))?;
        candidate.stage = stage;

        let patch = CandidatePatch {
            stage: Some(stage),
            ..CandidatePatch::default()
        };
        match self.client.update_candidate(id, &patch).await {
            Ok(saved) => {
                if let Some(slot) = self.candidates.iter_mut().find(|c| c.id == saved.id) {
                    *slot = saved.clone();
                }
                Ok(saved)
            }
            Err(err) => {
                warn!(candidate_id = %id, error = %err, "Stage change failed, refetching");
                if let Err(refresh_err) = self.refresh().await {
                    warn!(error = %refresh_err, "Pipeline refetch failed");
                }
                Err(err)
            }
        }
    }
}
