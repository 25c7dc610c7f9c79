// Deterministic fixture generation.
// Every generator owns its own seeded RNG, so output depends only on the
// `SeedConfig` (seeds, sizes and the anchor timestamp), never on wall-clock
// time or on the order generators run in.

pub mod applications;
pub mod assessments;
pub mod candidates;
pub mod jobs;
pub mod words;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{Application, Assessment, Job};

pub const JOB_SEED: u64 = 12345;
pub const CANDIDATE_SEED: u64 = 67890;
pub const APPLICATION_SEED: u64 = 54321;
pub const ASSESSMENT_SEED: u64 = 24680;

#[derive(Debug, Clone, PartialEq)]
pub struct SeedConfig {
    pub job_seed: u64,
    pub candidate_seed: u64,
    pub application_seed: u64,
    pub assessment_seed: u64,
    pub job_count: usize,
    pub candidate_count: usize,
    pub assessment_count: usize,
    /// Generated timestamps fall before this instant.
    pub anchor: DateTime<Utc>,
}

impl SeedConfig {
    pub fn anchored(anchor: DateTime<Utc>) -> Self {
        SeedConfig {
            job_seed: JOB_SEED,
            candidate_seed: CANDIDATE_SEED,
            application_seed: APPLICATION_SEED,
            assessment_seed: ASSESSMENT_SEED,
            job_count: 25,
            candidate_count: 1000,
            assessment_count: 3,
            anchor,
        }
    }

    /// Anchored at 2025-01-06T00:00:00Z; used wherever output must be stable.
    pub fn fixed() -> Self {
        Self::anchored(DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_094))
    }
}

/// The full fixture set for every table.
#[derive(Debug, Clone, Serialize)]
pub struct Fixtures {
    pub jobs: Vec<Job>,
    pub applications: Vec<Application>,
    pub assessments: Vec<Assessment>,
}

pub fn generate_all(config: &SeedConfig) -> Fixtures {
    let jobs = jobs::generate(config);
    let job_ids: Vec<String> = jobs.iter().map(|j| j.id.clone()).collect();
    let candidates = candidates::generate(config, &job_ids);
    let applications = applications::derive(&candidates, config.application_seed);
    let assessments = assessments::generate(config, &jobs);
    Fixtures {
        jobs,
        applications,
        assessments,
    }
}
