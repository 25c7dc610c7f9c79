//! Legacy candidate shape served by `/candidates`.
//!
//! Candidates are not stored separately: every view is derived from the
//! canonical [`Application`] record and every write is translated back into an
//! [`ApplicationPatch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::application::{Application, ApplicationPatch, NewApplication, PipelineStage, StageChange};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub job_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    pub stage: PipelineStage,
    pub notes: Vec<String>,
    pub skills: Vec<String>,
    pub experience: String,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Application> for Candidate {
    fn from(app: Application) -> Self {
        Candidate {
            id: app.id,
            job_id: app.job_id,
            name: app.candidate_name,
            email: app.candidate_email,
            phone: app.candidate_phone,
            resume: app.resume_url,
            stage: app.status.stage(),
            notes: app.notes,
            skills: app.skills,
            experience: app.experience,
            applied_at: app.applied_at,
            updated_at: app.updated_at,
        }
    }
}

/// Body of `POST /candidates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidate {
    pub job_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub stage: Option<PipelineStage>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: String,
}

impl From<NewCandidate> for NewApplication {
    fn from(c: NewCandidate) -> Self {
        NewApplication {
            job_id: c.job_id,
            candidate_name: c.name,
            candidate_email: c.email,
            candidate_phone: c.phone,
            resume_url: c.resume,
            cover_letter: None,
            status: c.stage.map(PipelineStage::status),
            notes: c.notes,
            experience: c.experience,
            skills: c.skills,
            education: None,
        }
    }
}

/// Body of `PATCH /candidates/:id`, including stage changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
}

impl From<CandidatePatch> for ApplicationPatch {
    fn from(p: CandidatePatch) -> Self {
        ApplicationPatch {
            job_id: p.job_id,
            candidate_name: p.name,
            candidate_email: p.email,
            candidate_phone: p.phone,
            resume_url: p.resume,
            status: p.stage.map(PipelineStage::status),
            notes: p.notes,
            skills: p.skills,
            experience: p.experience,
            ..ApplicationPatch::default()
        }
    }
}

/// One row of `GET /candidates/:id/timeline`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub stage: PipelineStage,
    pub date: DateTime<Utc>,
    pub note: String,
}

impl From<&StageChange> for TimelineEntry {
    fn from(change: &StageChange) -> Self {
        TimelineEntry {
            stage: change.status.stage(),
            date: change.at,
            note: change.note.clone(),
        }
    }
}
