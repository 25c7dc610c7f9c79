use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{IndexSpec, Record};
use crate::query::{SortValue, Sortable};

/// Pipeline position of an application. The single canonical enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Screening,
    Interview,
    Offer,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Screening,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Screening => "screening",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }

    /// Legacy stage name for the candidate view.
    pub fn stage(self) -> PipelineStage {
        match self {
            ApplicationStatus::Applied => PipelineStage::Applied,
            ApplicationStatus::Screening => PipelineStage::Screen,
            ApplicationStatus::Interview => PipelineStage::Tech,
            ApplicationStatus::Offer => PipelineStage::Offer,
            ApplicationStatus::Hired => PipelineStage::Hired,
            ApplicationStatus::Rejected => PipelineStage::Rejected,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown application status '{s}'"))
    }
}

/// Legacy candidate stage names, kept for the `/candidates` view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Applied,
    Screen,
    Tech,
    Offer,
    Hired,
    Rejected,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Applied,
        PipelineStage::Screen,
        PipelineStage::Tech,
        PipelineStage::Offer,
        PipelineStage::Hired,
        PipelineStage::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Applied => "applied",
            PipelineStage::Screen => "screen",
            PipelineStage::Tech => "tech",
            PipelineStage::Offer => "offer",
            PipelineStage::Hired => "hired",
            PipelineStage::Rejected => "rejected",
        }
    }

    /// The stage → status map. Total by construction.
    pub fn status(self) -> ApplicationStatus {
        match self {
            PipelineStage::Applied => ApplicationStatus::Applied,
            PipelineStage::Screen => ApplicationStatus::Screening,
            PipelineStage::Tech => ApplicationStatus::Interview,
            PipelineStage::Offer => ApplicationStatus::Offer,
            PipelineStage::Hired => ApplicationStatus::Hired,
            PipelineStage::Rejected => ApplicationStatus::Rejected,
        }
    }
}

impl FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown pipeline stage '{s}'"))
    }
}

/// One entry of an application's stage history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageChange {
    pub status: ApplicationStatus,
    pub at: DateTime<Utc>,
    pub note: String,
}

impl StageChange {
    pub fn submitted(at: DateTime<Utc>) -> Self {
        StageChange {
            status: ApplicationStatus::Applied,
            at,
            note: "Application submitted".to_string(),
        }
    }

    pub fn moved(status: ApplicationStatus, at: DateTime<Utc>) -> Self {
        StageChange {
            status,
            at,
            note: format!("Moved to {status}"),
        }
    }
}

/// A candidate's application to a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default)]
    pub history: Vec<StageChange>,
}

impl Application {
    /// Moves the application to `status`, recording the change when it differs.
    pub fn transition(&mut self, status: ApplicationStatus, at: DateTime<Utc>) {
        if self.status != status {
            self.status = status;
            self.history.push(StageChange::moved(status, at));
        }
        self.updated_at = at;
    }
}

impl Record for Application {
    const TABLE: &'static str = "applications";
    const INDEXES: &'static [IndexSpec<Self>] = &[
        IndexSpec {
            name: "jobId",
            key: |a| a.job_id.clone(),
        },
        IndexSpec {
            name: "status",
            key: |a| a.status.as_str().to_string(),
        },
        IndexSpec {
            name: "email",
            key: |a| a.candidate_email.trim().to_lowercase(),
        },
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sortable for Application {
    const DEFAULT_SORT: &'static str = "appliedAt";
    const SORT_FIELDS: &'static [&'static str] =
        &["appliedAt", "updatedAt", "name", "candidateName"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "appliedAt" => Some(SortValue::Time(self.applied_at)),
            "updatedAt" => Some(SortValue::Time(self.updated_at)),
            "name" | "candidateName" => Some(SortValue::Text(self.candidate_name.to_lowercase())),
            _ => None,
        }
    }
}

/// Body of `POST /applications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub job_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    #[serde(default)]
    pub candidate_phone: String,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Option<String>,
}

impl NewApplication {
    pub fn into_application(self, id: String, now: DateTime<Utc>) -> Application {
        let status = self.status.unwrap_or(ApplicationStatus::Applied);
        let mut history = vec![StageChange::submitted(now)];
        if status != ApplicationStatus::Applied {
            history.push(StageChange::moved(status, now));
        }
        Application {
            id,
            job_id: self.job_id,
            candidate_name: self.candidate_name,
            candidate_email: self.candidate_email,
            candidate_phone: self.candidate_phone,
            resume_url: self.resume_url,
            cover_letter: self.cover_letter,
            status,
            applied_at: now,
            updated_at: now,
            notes: self.notes,
            experience: self.experience,
            skills: self.skills,
            education: self.education,
            history,
        }
    }
}

/// Body of `PATCH /applications/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
}

impl ApplicationPatch {
    /// Applies the patch and stamps `updated_at`.
    pub fn apply(self, app: &mut Application, now: DateTime<Utc>) {
        if let Some(job_id) = self.job_id {
            app.job_id = job_id;
        }
        if let Some(name) = self.candidate_name {
            app.candidate_name = name;
        }
        if let Some(email) = self.candidate_email {
            app.candidate_email = email;
        }
        if let Some(phone) = self.candidate_phone {
            app.candidate_phone = phone;
        }
        if let Some(resume_url) = self.resume_url {
            app.resume_url = Some(resume_url);
        }
        if let Some(cover_letter) = self.cover_letter {
            app.cover_letter = Some(cover_letter);
        }
        if let Some(notes) = self.notes {
            app.notes = notes;
        }
        if let Some(experience) = self.experience {
            app.experience = experience;
        }
        if let Some(skills) = self.skills {
            app.skills = skills;
        }
        if let Some(education) = self.education {
            app.education = Some(education);
        }
        match self.status {
            Some(status) => app.transition(status, now),
            None => app.updated_at = now,
        }
    }
}

/// Body of `PATCH /applications/:id/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_stage_map_is_total_and_injective() {
        let statuses: HashSet<_> = PipelineStage::ALL.iter().map(|s| s.status()).collect();
        assert_eq!(statuses.len(), PipelineStage::ALL.len());
        assert_eq!(statuses.len(), ApplicationStatus::ALL.len());
    }

    #[test]
    fn test_stage_map_matches_legacy_names() {
        assert_eq!(PipelineStage::Screen.status(), ApplicationStatus::Screening);
        assert_eq!(PipelineStage::Tech.status(), ApplicationStatus::Interview);
        assert_eq!(PipelineStage::Hired.status(), ApplicationStatus::Hired);
    }

    #[test]
    fn test_stage_round_trips_through_status() {
        for stage in PipelineStage::ALL {
            assert_eq!(stage.status().stage(), stage);
        }
    }

    #[test]
    fn test_status_parses_wire_names_only() {
        assert_eq!(
            "interview".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::Interview)
        );
        assert!("tech".parse::<ApplicationStatus>().is_err());
        assert_eq!("tech".parse::<PipelineStage>(), Ok(PipelineStage::Tech));
    }

    #[test]
    fn test_transition_records_history_only_on_change() {
        let t0 = Utc::now();
        let mut app = NewApplication {
            job_id: "job-1".to_string(),
            candidate_name: "Asha Rao".to_string(),
            candidate_email: "asha@example.com".to_string(),
            candidate_phone: String::new(),
            resume_url: None,
            cover_letter: None,
            status: None,
            notes: vec![],
            experience: String::new(),
            skills: vec![],
            education: None,
        }
        .into_application("app-1".to_string(), t0);
        assert_eq!(app.history.len(), 1);

        let t1 = t0 + chrono::Duration::seconds(5);
        app.transition(ApplicationStatus::Applied, t1);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.updated_at, t1);

        app.transition(ApplicationStatus::Offer, t1);
        assert_eq!(app.history.len(), 2);
        assert_eq!(app.history[1].note, "Moved to offer");
    }
}
