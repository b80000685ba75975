use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Pending,
    Completed,
    Rejected,
}

impl DeletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionStatus::Pending => "pending",
            DeletionStatus::Completed => "completed",
            DeletionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(DeletionStatus::Pending),
            "completed" => Some(DeletionStatus::Completed),
            "rejected" => Some(DeletionStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeletionRequestRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub candidate_email: String,
    pub reason: Option<String>,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub deleted_applications: i32,
}
