use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{IndexSpec, Record};
use crate::query::{SortValue, Sortable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Archived,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Archived => "archived",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            JobStatus::Active => JobStatus::Archived,
            JobStatus::Archived => JobStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    Remote,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::FullTime,
        JobType::Remote,
        JobType::PartTime,
        JobType::Contract,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::Remote => "Remote",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: JobStatus,
    pub tags: Vec<String>,
    /// Position on the drag-ordered board.
    pub order: i64,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: String,
    pub location: String,
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Job {
    const TABLE: &'static str = "jobs";
    const INDEXES: &'static [IndexSpec<Self>] = &[
        IndexSpec {
            name: "status",
            key: |j| j.status.as_str().to_string(),
        },
        IndexSpec {
            name: "slug",
            key: |j| j.slug.clone(),
        },
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sortable for Job {
    const DEFAULT_SORT: &'static str = "createdAt";
    const SORT_FIELDS: &'static [&'static str] = &["createdAt", "order", "title"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "createdAt" => Some(SortValue::Time(self.created_at)),
            "order" => Some(SortValue::Int(self.order)),
            "title" => Some(SortValue::Text(self.title.to_lowercase())),
            _ => None,
        }
    }
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub company: Option<String>,
}

/// Body of `PATCH /jobs/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl JobPatch {
    pub fn apply(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(slug) = self.slug {
            job.slug = slug;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(tags) = self.tags {
            job.tags = tags;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements;
        }
        if let Some(salary) = self.salary {
            job.salary = salary;
        }
        if let Some(location) = self.location {
            job.location = location;
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(company) = self.company {
            job.company = Some(company);
        }
    }
}

/// Body of `PATCH /jobs/:id/reorder`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub from_order: i64,
    pub to_order: i64,
}

/// Lowercased, dash-separated form of a title.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_type_uses_display_names_on_the_wire() {
        assert_eq!(json!(JobType::FullTime), json!("Full-time"));
        assert_eq!(json!(JobType::PartTime), json!("Part-time"));
        let parsed: JobType = serde_json::from_value(json!("Contract")).unwrap();
        assert_eq!(parsed, JobType::Contract);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("UI/UX Designer"), "ui-ux-designer");
        assert_eq!(slugify("  Full Stack   Developer "), "full-stack-developer");
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut job = Job {
            id: "job-1".to_string(),
            title: "QA Engineer".to_string(),
            slug: "qa-engineer".to_string(),
            status: JobStatus::Active,
            tags: vec!["Rust".to_string()],
            order: 0,
            description: String::new(),
            requirements: vec![],
            salary: String::new(),
            location: "Pune, Maharashtra".to_string(),
            job_type: JobType::Remote,
            company: None,
            created_at: Utc::now(),
        };
        let patch: JobPatch = serde_json::from_value(json!({ "status": "archived" })).unwrap();
        patch.apply(&mut job);
        assert_eq!(job.status, JobStatus::Archived);
        assert_eq!(job.title, "QA Engineer");
        assert_eq!(job.job_type, JobType::Remote);
    }
}
