use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongYes,
    Yes,
    Maybe,
    No,
    StrongNo,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongYes => "strong_yes",
            Recommendation::Yes => "yes",
            Recommendation::Maybe => "maybe",
            Recommendation::No => "no",
            Recommendation::StrongNo => "strong_no",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub user_id: Uuid,
    pub scorecard_id: Option<Uuid>,
    pub rating: i16,
    /// Criterion key -> score (1..=5).
    pub scores: Json<BTreeMap<String, i16>>,
    pub recommendation: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
