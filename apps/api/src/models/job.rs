use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
    Internship,
    Freelance,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Temporary => "temporary",
            JobType::Internship => "internship",
            JobType::Freelance => "freelance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full_time" => Some(JobType::FullTime),
            "part_time" => Some(JobType::PartTime),
            "contract" => Some(JobType::Contract),
            "temporary" => Some(JobType::Temporary),
            "internship" => Some(JobType::Internship),
            "freelance" => Some(JobType::Freelance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Published,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Published => "published",
            JobStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(JobStatus::Draft),
            "published" => Some(JobStatus::Published),
            "closed" => Some(JobStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub job_type: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_parse_matches_as_str() {
        for jt in [
            JobType::FullTime,
            JobType::PartTime,
            JobType::Contract,
            JobType::Temporary,
            JobType::Internship,
            JobType::Freelance,
        ] {
            assert_eq!(JobType::parse(jt.as_str()), Some(jt));
        }
        assert_eq!(JobType::parse("fulltime"), None);
    }

    #[test]
    fn test_job_status_rejects_unknown() {
        assert_eq!(JobStatus::parse("published"), Some(JobStatus::Published));
        assert_eq!(JobStatus::parse("archived"), None);
    }
}
