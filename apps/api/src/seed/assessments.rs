use chrono::Duration;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::words::{self, pick, pick_many};
use super::SeedConfig;
use crate::models::{
    Assessment, Job, JobStatus, JobType, Question, QuestionKind, Section, ShowWhen,
    ValidationRules,
};

const LONG_ANSWER_PROMPTS: &[&str] = &[
    "Describe a challenging bug you tracked down and how you fixed it.",
    "Walk us through a system you designed from scratch.",
    "Tell us about a time you had to learn a new technology quickly.",
];

/// Builds one assessment for each of the first `config.assessment_count`
/// active jobs in board order.
pub fn generate(config: &SeedConfig, jobs: &[Job]) -> Vec<Assessment> {
    let mut rng = StdRng::seed_from_u64(config.assessment_seed);
    let mut active: Vec<&Job> = jobs.iter().filter(|j| j.status == JobStatus::Active).collect();
    active.sort_by_key(|j| j.order);

    active
        .into_iter()
        .take(config.assessment_count)
        .map(|job| {
            let created_at = config.anchor - Duration::hours(rng.random_range(24..24 * 60));
            Assessment {
                id: Assessment::id_for_job(&job.id),
                job_id: job.id.clone(),
                title: format!("{} Assessment", job.title),
                sections: sections_for(&mut rng, job),
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

fn sections_for(rng: &mut StdRng, job: &Job) -> Vec<Section> {
    let q = |n: usize| format!("{}-q{n}", job.id);
    let focus = if job.tags.is_empty() {
        "your primary stack".to_string()
    } else {
        pick(rng, job.tags.as_slice()).clone()
    };
    let tools = pick_many(rng, words::TECH_TAGS, 4, 6);

    vec![
        Section {
            id: format!("{}-s1", job.id),
            title: "Technical Fundamentals".to_string(),
            questions: vec![
                question(
                    q(1),
                    QuestionKind::SingleChoice,
                    "Which of these have you used in production most recently?",
                    job.tags.clone(),
                    required(),
                ),
                question(
                    q(2),
                    QuestionKind::MultiChoice,
                    "Select every tool you are comfortable working with.",
                    tools,
                    required(),
                ),
                question(
                    q(3),
                    QuestionKind::Numeric,
                    &format!("Years of professional experience with {focus}?"),
                    vec![],
                    ValidationRules {
                        required: true,
                        min: Some(0.0),
                        max: Some(30.0),
                        max_length: None,
                    },
                ),
                question(
                    q(4),
                    QuestionKind::LongText,
                    *pick(rng, LONG_ANSWER_PROMPTS),
                    vec![],
                    max_length(1000),
                ),
            ],
        },
        Section {
            id: format!("{}-s2", job.id),
            title: "Experience".to_string(),
            questions: vec![
                question(
                    q(5),
                    QuestionKind::SingleChoice,
                    "Have you led a team before?",
                    vec!["Yes".to_string(), "No".to_string()],
                    required(),
                ),
                Question {
                    show_when: Some(ShowWhen {
                        question_id: q(5),
                        equals: "Yes".to_string(),
                    }),
                    ..question(
                        q(6),
                        QuestionKind::Numeric,
                        "How many people reported to you?",
                        vec![],
                        ValidationRules {
                            required: true,
                            min: Some(1.0),
                            max: Some(100.0),
                            max_length: None,
                        },
                    )
                },
                question(
                    q(7),
                    QuestionKind::ShortText,
                    "What is your most recent job title?",
                    vec![],
                    ValidationRules {
                        required: true,
                        max_length: Some(100),
                        ..ValidationRules::default()
                    },
                ),
                question(
                    q(8),
                    QuestionKind::LongText,
                    "What piece of work are you proudest of?",
                    vec![],
                    max_length(1500),
                ),
            ],
        },
        Section {
            id: format!("{}-s3", job.id),
            title: "Logistics".to_string(),
            questions: vec![
                question(
                    q(9),
                    QuestionKind::SingleChoice,
                    "Preferred work arrangement",
                    JobType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
                    ValidationRules::default(),
                ),
                question(
                    q(10),
                    QuestionKind::Numeric,
                    "Notice period in days",
                    vec![],
                    ValidationRules {
                        required: true,
                        min: Some(0.0),
                        max: Some(180.0),
                        max_length: None,
                    },
                ),
                question(
                    q(11),
                    QuestionKind::ShortText,
                    "Expected salary (LPA)",
                    vec![],
                    max_length(20),
                ),
                question(
                    q(12),
                    QuestionKind::FileUpload,
                    "Upload a portfolio or code sample",
                    vec![],
                    ValidationRules::default(),
                ),
            ],
        },
    ]
}

fn question(
    id: String,
    kind: QuestionKind,
    prompt: &str,
    options: Vec<String>,
    validation: ValidationRules,
) -> Question {
    Question {
        id,
        kind,
        prompt: prompt.to_string(),
        options,
        validation,
        show_when: None,
    }
}

fn required() -> ValidationRules {
    ValidationRules {
        required: true,
        ..ValidationRules::default()
    }
}

fn max_length(limit: usize) -> ValidationRules {
    ValidationRules {
        max_length: Some(limit),
        ..ValidationRules::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::jobs;

    #[test]
    fn test_assessments_target_active_jobs() {
        let config = SeedConfig::fixed();
        let jobs = jobs::generate(&config);
        for assessment in generate(&config, &jobs) {
            let job = jobs.iter().find(|j| j.id == assessment.job_id).unwrap();
            assert_eq!(job.status, JobStatus::Active);
            assert_eq!(assessment.id, Assessment::id_for_job(&job.id));
        }
    }

    #[test]
    fn test_each_assessment_has_at_least_ten_questions() {
        let config = SeedConfig::fixed();
        for assessment in generate(&config, &jobs::generate(&config)) {
            assert!(assessment.question_count() >= 10);
        }
    }

    #[test]
    fn test_conditional_question_points_backwards() {
        let config = SeedConfig::fixed();
        for assessment in generate(&config, &jobs::generate(&config)) {
            let ids: Vec<&str> = assessment.questions().map(|q| q.id.as_str()).collect();
            for (position, question) in assessment.questions().enumerate() {
                if let Some(rule) = &question.show_when {
                    let target = ids.iter().position(|id| *id == rule.question_id).unwrap();
                    assert!(target < position);
                }
            }
        }
    }
}
