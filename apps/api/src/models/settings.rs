//! Per-company settings records. Each table is keyed by `company_id`, so a
//! company has at most one row of each.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BrandingRow {
    pub company_id: Uuid,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub font_family: Option<String>,
    pub careers_headline: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvTemplateRow {
    pub company_id: Uuid,
    pub template_key: String,
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
    pub sections: Json<Vec<String>>,
    pub show_photo: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LandingPageRow {
    pub company_id: Uuid,
    pub locale: String,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub body_html: Option<String>,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConsentConfigRow {
    pub company_id: Uuid,
    pub privacy_policy_url: Option<String>,
    pub consent_text: Option<String>,
    pub retention_days: i32,
    pub require_explicit_consent: bool,
    pub updated_at: DateTime<Utc>,
}
