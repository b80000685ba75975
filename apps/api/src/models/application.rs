use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Pipeline stage of an application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    New,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::New,
        ApplicationStatus::Screening,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Screening => "screening",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_key: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub consent_given: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application joined with its job title, used by listings and the CSV export.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationListRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrips_every_variant() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_is_case_sensitive() {
        assert_eq!(ApplicationStatus::parse("Hired"), None);
        assert_eq!(ApplicationStatus::parse(""), None);
    }
}
