use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{IndexSpec, Record};
use crate::query::{SortValue, Sortable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    ShortText,
    LongText,
    Numeric,
    FileUpload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Shows a question only when another question's answer equals `equals`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowWhen {
    pub question_id: String,
    pub equals: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: ValidationRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<ShowWhen>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// The assessment attached to a job. At most one per job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub job_id: String,
    pub title: String,
    pub sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    /// Assessments are keyed by job so that a job never has two.
    pub fn id_for_job(job_id: &str) -> String {
        format!("assessment-{job_id}")
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}

impl Record for Assessment {
    const TABLE: &'static str = "assessments";
    const INDEXES: &'static [IndexSpec<Self>] = &[IndexSpec {
        name: "jobId",
        key: |a| a.job_id.clone(),
    }];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sortable for Assessment {
    const DEFAULT_SORT: &'static str = "updatedAt";
    const SORT_FIELDS: &'static [&'static str] = &["createdAt", "updatedAt", "jobId"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "createdAt" => Some(SortValue::Time(self.created_at)),
            "updatedAt" => Some(SortValue::Time(self.updated_at)),
            "jobId" => Some(SortValue::Text(self.job_id.clone())),
            _ => None,
        }
    }
}

/// Body of `PUT /assessments/:jobId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDraft {
    #[serde(default)]
    pub title: Option<String>,
    pub sections: Vec<Section>,
}

/// A candidate's recorded response to an assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub assessment_id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub answers: BTreeMap<String, Value>,
    pub submitted_at: DateTime<Utc>,
}

impl Record for Submission {
    const TABLE: &'static str = "submissions";
    const INDEXES: &'static [IndexSpec<Self>] = &[
        IndexSpec {
            name: "jobId",
            key: |s| s.job_id.clone(),
        },
        IndexSpec {
            name: "candidateId",
            key: |s| s.candidate_id.clone(),
        },
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

/// Body of `POST /assessments/:jobId/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub candidate_id: String,
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,
}
