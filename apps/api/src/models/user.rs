use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A staff user. `external_id` is the subject issued by the session provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
