use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use super::words::{self, pick};
use super::SeedConfig;
use crate::models::PipelineStage;

const APPLIED_WITHIN_DAYS: i64 = 90;

/// A candidate as the legacy pipeline described it, before derivation into
/// an [`Application`](crate::models::Application).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFixture {
    pub id: String,
    pub job_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume: String,
    pub stage: PipelineStage,
    pub notes: Vec<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stage weights: most candidates sit early in the funnel.
const STAGE_WEIGHTS: [(PipelineStage, u32); 6] = [
    (PipelineStage::Applied, 35),
    (PipelineStage::Screen, 20),
    (PipelineStage::Tech, 15),
    (PipelineStage::Offer, 8),
    (PipelineStage::Hired, 7),
    (PipelineStage::Rejected, 15),
];

/// Generates `config.candidate_count` candidates spread over `job_ids`.
/// Returns an empty list when there are no jobs to apply to.
pub fn generate(config: &SeedConfig, job_ids: &[String]) -> Vec<CandidateFixture> {
    if job_ids.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(config.candidate_seed);
    (0..config.candidate_count)
        .map(|index| generate_candidate(&mut rng, config, job_ids, index))
        .collect()
}

fn generate_candidate(
    rng: &mut StdRng,
    config: &SeedConfig,
    job_ids: &[String],
    index: usize,
) -> CandidateFixture {
    let id = format!("candidate-{}", index + 1);
    let first = pick(rng, words::FIRST_NAMES);
    let last = pick(rng, words::LAST_NAMES);
    let email = format!(
        "{}.{}{}@example.com",
        first.to_lowercase(),
        last.to_lowercase(),
        index + 1
    );
    let phone = format!("+91 9{:09}", rng.random_range(0..1_000_000_000u64));
    let stage = weighted_stage(rng);
    let notes = (0..rng.random_range(0..=2))
        .map(|_| words::sentence(rng))
        .collect();

    let applied_at = config.anchor
        - Duration::minutes(rng.random_range(0..APPLIED_WITHIN_DAYS * 24 * 60));
    let updated_at = if stage == PipelineStage::Applied {
        applied_at
    } else {
        let elapsed = (config.anchor - applied_at).num_minutes();
        applied_at + Duration::minutes(rng.random_range(0..=elapsed))
    };

    CandidateFixture {
        job_id: pick(rng, job_ids).clone(),
        resume: format!("https://resumes.example.com/{id}.pdf"),
        id,
        name: format!("{first} {last}"),
        email,
        phone,
        stage,
        notes,
        applied_at,
        updated_at,
    }
}

fn weighted_stage(rng: &mut StdRng) -> PipelineStage {
    let total: u32 = STAGE_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (stage, weight) in STAGE_WEIGHTS {
        if roll < weight {
            return stage;
        }
        roll -= weight;
    }
    PipelineStage::Applied
}
