//! Job listings, applications and the client-side job filter.
//!
//! The API returns jobs in its own wire shape ([`JobRecord`]); the client
//! works with the flattened [`Job`] view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Job as serialized by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    #[serde(rename = "experienceLevel")]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub category: String,
    pub experience_level: ExperienceLevel,
    pub salary: Salary,
    pub description: String,
    pub requirements: Vec<String>,
    pub employment_type: EmploymentType,
    pub posted_at: Option<DateTime<Utc>>,
    pub featured: bool,
}

impl From<JobRecord> for Job {
    fn from(record: JobRecord) -> Self {
        let requirements = record
            .requirements
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(|r| r.split('\n').map(str::to_string).collect())
            .unwrap_or_default();

        Job {
            id: record.id.to_string(),
            title: record.title,
            company: record.company,
            location: record.location,
            category: record
                .category
                .map(|c| c.name)
                .unwrap_or_else(|| "Uncategorized".to_string()),
            experience_level: record.experience_level,
            salary: Salary {
                min: record.salary_min,
                max: record.salary_max,
                currency: record
                    .currency
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| "USD".to_string()),
            },
            description: record.description,
            requirements,
            employment_type: record.employment_type,
            posted_at: record.posted_at,
            featured: record.is_active,
        }
    }
}

/// Body of `POST /jobs/`.
#[derive(Debug, Clone, Serialize)]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    pub currency: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    #[serde(rename = "experienceLevel")]
    pub experience_level: ExperienceLevel,
    pub category_id: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `PATCH /applications/{id}/`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub job_details: Option<JobRecord>,
}

impl Application {
    pub fn job_title(&self) -> &str {
        self.job_details
            .as_ref()
            .map(|job| job.title.as_str())
            .unwrap_or("(unknown job)")
    }
}

/// Body of `POST /applications/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub job_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_link: Option<String>,
}

/// Admin dashboard counters (`GET /stats/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub jobs: u64,
    pub applications: u64,
    pub users: u64,
    #[serde(rename = "conversionRate")]
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilters {
    pub search: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub employment_type: Option<EmploymentType>,
}

impl JobFilters {
    pub fn matches(&self, job: &Job) -> bool {
        let matches_search = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            job.title.to_lowercase().contains(&needle)
                || job.company.to_lowercase().contains(&needle)
                || job.description.to_lowercase().contains(&needle)
        };

        matches_search
            && self.category.as_ref().map_or(true, |c| &job.category == c)
            && self.location.as_ref().map_or(true, |l| &job.location == l)
            && self
                .experience_level
                .map_or(true, |level| job.experience_level == level)
            && self
                .employment_type
                .map_or(true, |ty| job.employment_type == ty)
    }

    pub fn apply<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        jobs.iter().filter(|job| self.matches(job)).collect()
    }

    /// Fields set in `update` replace the current ones; the rest are kept.
    pub fn merge(&mut self, update: JobFilters) {
        if !update.search.is_empty() {
            self.search = update.search;
        }
        if update.category.is_some() {
            self.category = update.category;
        }
        if update.location.is_some() {
            self.location = update.location;
        }
        if update.experience_level.is_some() {
            self.experience_level = update.experience_level;
        }
        if update.employment_type.is_some() {
            self.employment_type = update.employment_type;
        }
    }

    pub fn clear(&mut self) {
        *self = JobFilters::default();
    }
}
