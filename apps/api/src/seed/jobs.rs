use chrono::Duration;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::words::{self, pick, pick_many};
use super::SeedConfig;
use crate::models::job::slugify;
use crate::models::{Job, JobStatus, JobType};

const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Generates `config.job_count` jobs, ordered 0..n on the board.
pub fn generate(config: &SeedConfig) -> Vec<Job> {
    let mut rng = StdRng::seed_from_u64(config.job_seed);
    (0..config.job_count)
        .map(|index| generate_job(&mut rng, config, index))
        .collect()
}

fn generate_job(rng: &mut StdRng, config: &SeedConfig, index: usize) -> Job {
    let title = pick(rng, words::JOB_TITLES).to_string();
    let slug = format!("{}-{}", slugify(&title), words::alphanumeric(rng, 4));
    // Three in four seeded jobs are active.
    let status = if rng.random_range(0..4) < 3 {
        JobStatus::Active
    } else {
        JobStatus::Archived
    };
    let tags = pick_many(rng, words::TECH_TAGS, 2, 5);
    let description = format!("{}\n\n{}", words::paragraph(rng), words::paragraph(rng));
    let requirements = (0..rng.random_range(3..=6))
        .map(|_| words::sentence(rng))
        .collect();

    // Salary band in INR lakhs per annum.
    let min = rng.random_range(4..=20);
    let max = min + rng.random_range(2..=10);
    let salary = format!("₹{min}–₹{max} LPA");

    let location = pick(rng, words::CITIES).to_string();
    let job_type = *pick(rng, &JobType::ALL);
    let company = Some(pick(rng, words::COMPANIES).to_string());
    let created_at = config.anchor - Duration::seconds(rng.random_range(0..SECONDS_PER_YEAR));

    Job {
        id: format!("job-{}", index + 1),
        title,
        slug,
        status,
        tags,
        order: index as i64,
        description,
        requirements,
        salary,
        location,
        job_type,
        company,
        created_at,
    }
}
