use rand::{rngs::StdRng, Rng, SeedableRng};

use super::candidates::CandidateFixture;
use super::words::{self, pick, pick_many};
use crate::models::{Application, ApplicationStatus, StageChange};

/// Derives exactly one application per candidate, in candidate order.
///
/// Status comes from the stage map; skills, experience, cover letter and
/// education are drawn from an RNG seeded with `seed`, so the result is a pure
/// function of `(candidates, seed)`.
pub fn derive(candidates: &[CandidateFixture], seed: u64) -> Vec<Application> {
    let mut rng = StdRng::seed_from_u64(seed);
    candidates
        .iter()
        .map(|candidate| derive_one(&mut rng, candidate))
        .collect()
}

fn derive_one(rng: &mut StdRng, candidate: &CandidateFixture) -> Application {
    let skills = pick_many(rng, words::SKILLS, 2, 6);
    let years = rng.random_range(1..=8);
    let experience = format!(
        "Experienced developer with {years} years of experience in software development. \
         Proficient in {}. Strong background in building scalable applications and working \
         in agile environments.",
        skills.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
    );
    let cover_letter = format!(
        "Dear Hiring Manager,\n\nI am writing to express my interest in the position. \
         With my background in {}, I am confident that I would be a valuable addition to \
         your team.\n\n{}\n\nI am excited about the opportunity to contribute to your \
         organization and would welcome the chance to discuss my qualifications further.\n\n\
         Best regards,\n{}",
        skills.iter().take(2).cloned().collect::<Vec<_>>().join(" and "),
        words::paragraph(rng),
        candidate.name
    );
    let education = pick(rng, words::EDUCATION).to_string();

    let status = candidate.stage.status();
    let mut history = vec![StageChange::submitted(candidate.applied_at)];
    if status != ApplicationStatus::Applied {
        history.push(StageChange::moved(status, candidate.updated_at));
    }

    Application {
        id: candidate.id.clone(),
        job_id: candidate.job_id.clone(),
        candidate_name: candidate.name.clone(),
        candidate_email: candidate.email.clone(),
        candidate_phone: candidate.phone.clone(),
        resume_url: Some(candidate.resume.clone()),
        cover_letter: Some(cover_letter),
        status,
        applied_at: candidate.applied_at,
        updated_at: candidate.updated_at,
        notes: candidate.notes.clone(),
        experience,
        skills,
        education: Some(education),
        history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PipelineStage;
    use crate::seed::{candidates, SeedConfig};

    fn candidates() -> Vec<CandidateFixture> {
        let job_ids: Vec<String> = (1..=25).map(|i| format!("job-{i}")).collect();
        candidates::generate(&SeedConfig::fixed(), &job_ids)
    }

    #[test]
    fn test_one_application_per_candidate() {
        let candidates = candidates();
        let applications = derive(&candidates, 54321);
        assert_eq!(applications.len(), candidates.len());
        for (candidate, app) in candidates.iter().zip(&applications) {
            assert_eq!(app.id, candidate.id);
            assert_eq!(app.job_id, candidate.job_id);
            assert_eq!(app.candidate_email, candidate.email);
        }
    }

    #[test]
    fn test_status_follows_stage_map() {
        let candidates = candidates();
        for (candidate, app) in candidates.iter().zip(derive(&candidates, 54321)) {
            assert_eq!(app.status, candidate.stage.status());
            if candidate.stage == PipelineStage::Tech {
                assert_eq!(app.status, ApplicationStatus::Interview);
            }
        }
    }

    #[test]
    fn test_history_ends_in_current_status() {
        for app in derive(&candidates(), 54321) {
            let last = app.history.last().unwrap();
            assert_eq!(last.status, app.status);
            assert_eq!(app.history[0].note, "Application submitted");
        }
    }

    #[test]
    fn test_derivation_is_pure() {
        let candidates = candidates();
        assert_eq!(derive(&candidates, 7), derive(&candidates, 7));
    }

    #[test]
    fn test_cover_letter_is_signed_by_candidate() {
        let candidates = candidates();
        let app = &derive(&candidates, 54321)[0];
        let letter = app.cover_letter.as_deref().unwrap();
        assert!(letter.ends_with(&candidates[0].name));
    }
}
