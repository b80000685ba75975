//! GET/PUT handlers for per-company settings. PUT is a partial upsert:
//! fields left out of the body keep their stored (or default) value.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::activity::{log_activity, ActivityEntry};
use crate::auth::{require_company, Session};
use crate::errors::AppError;
use crate::extract::ValidJson;
use crate::models::settings::{BrandingRow, ConsentConfigRow, CvTemplateRow, LandingPageRow};
use crate::settings::html::normalize_html;
use crate::settings::{
    normalize_locale, validate_color, validate_http_url, validate_retention_days,
    validate_sections, validate_template_key, DEFAULT_CONSENT_TEXT, DEFAULT_CV_SECTIONS,
    DEFAULT_LOCALE, DEFAULT_RETENTION_DAYS,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse<T> {
    /// False when no row exists yet and `settings` holds defaults.
    pub configured: bool,
    pub settings: T,
}

impl<T> SettingsResponse<T> {
    fn configured(settings: T) -> Self {
        Self {
            configured: true,
            settings,
        }
    }

    fn from_row(row: Option<T>, defaults: impl FnOnce() -> T) -> Self {
        match row {
            Some(settings) => Self::configured(settings),
            None => Self {
                configured: false,
                settings: defaults(),
            },
        }
    }
}

pub fn default_branding(company_id: Uuid) -> BrandingRow {
    BrandingRow {
        company_id,
        primary_color: None,
        secondary_color: None,
        logo_url: None,
        font_family: None,
        careers_headline: None,
        updated_at: Utc::now(),
    }
}

pub fn default_cv_template(company_id: Uuid) -> CvTemplateRow {
    CvTemplateRow {
        company_id,
        template_key: "classic".to_string(),
        accent_color: None,
        font_family: None,
        sections: SqlJson(DEFAULT_CV_SECTIONS.iter().map(|s| s.to_string()).collect()),
        show_photo: false,
        updated_at: Utc::now(),
    }
}

pub fn default_landing_page(company_id: Uuid) -> LandingPageRow {
    LandingPageRow {
        company_id,
        locale: DEFAULT_LOCALE.to_string(),
        headline: None,
        subheadline: None,
        body_html: None,
        published: false,
        updated_at: Utc::now(),
    }
}

pub fn default_consent_config(company_id: Uuid) -> ConsentConfigRow {
    ConsentConfigRow {
        company_id,
        privacy_policy_url: None,
        consent_text: Some(DEFAULT_CONSENT_TEXT.to_string()),
        retention_days: DEFAULT_RETENTION_DAYS,
        require_explicit_consent: true,
        updated_at: Utc::now(),
    }
}

fn log_settings_update(state: &AppState, company_id: Uuid, user_id: Uuid, entity: &str) {
    log_activity(
        &state.db,
        ActivityEntry::new(company_id, &format!("{entity}.updated"), entity).by(user_id),
    );
}

// ── Branding ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BrandingUpdate {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub font_family: Option<String>,
    pub careers_headline: Option<String>,
}

pub async fn fetch_branding(
    pool: &sqlx::PgPool,
    company_id: Uuid,
) -> Result<Option<BrandingRow>, sqlx::Error> {
    sqlx::query_as::<_, BrandingRow>("SELECT * FROM brandings WHERE company_id = $1")
        .bind(company_id)
        .fetch_optional(pool)
        .await
}

/// GET /api/v1/branding
pub async fn handle_get_branding(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SettingsResponse<BrandingRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let row = fetch_branding(&state.db, company.id).await?;
    Ok(Json(SettingsResponse::from_row(row, || default_branding(company.id))))
}

/// PUT /api/v1/branding
pub async fn handle_put_branding(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<BrandingUpdate>,
) -> Result<Json<SettingsResponse<BrandingRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    if let Some(color) = &req.primary_color {
        validate_color("primary_color", color)?;
    }
    if let Some(color) = &req.secondary_color {
        validate_color("secondary_color", color)?;
    }
    if let Some(url) = &req.logo_url {
        validate_http_url("logo_url", url)?;
    }

    let row = sqlx::query_as::<_, BrandingRow>(
        r#"
        INSERT INTO brandings
            (company_id, primary_color, secondary_color, logo_url, font_family, careers_headline)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (company_id) DO UPDATE SET
            primary_color = COALESCE($2, brandings.primary_color),
            secondary_color = COALESCE($3, brandings.secondary_color),
            logo_url = COALESCE($4, brandings.logo_url),
            font_family = COALESCE($5, brandings.font_family),
            careers_headline = COALESCE($6, brandings.careers_headline),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(company.id)
    .bind(req.primary_color.map(|c| c.to_ascii_lowercase()))
    .bind(req.secondary_color.map(|c| c.to_ascii_lowercase()))
    .bind(&req.logo_url)
    .bind(req.font_family.as_deref().map(str::trim))
    .bind(req.careers_headline.as_deref().map(str::trim))
    .fetch_one(&state.db)
    .await?;

    log_settings_update(&state, company.id, session.user.id, "branding");
    Ok(Json(SettingsResponse::configured(row)))
}

// ── CV template ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CvTemplateUpdate {
    pub template_key: Option<String>,
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
    pub sections: Option<Vec<String>>,
    pub show_photo: Option<bool>,
}

/// GET /api/v1/cv-template
pub async fn handle_get_cv_template(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SettingsResponse<CvTemplateRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let row = sqlx::query_as::<_, CvTemplateRow>("SELECT * FROM cv_templates WHERE company_id = $1")
        .bind(company.id)
        .fetch_optional(&state.db)
        .await?;
    Ok(Json(SettingsResponse::from_row(row, || default_cv_template(company.id))))
}

/// PUT /api/v1/cv-template
pub async fn handle_put_cv_template(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CvTemplateUpdate>,
) -> Result<Json<SettingsResponse<CvTemplateRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    if let Some(key) = &req.template_key {
        validate_template_key(key)?;
    }
    if let Some(color) = &req.accent_color {
        validate_color("accent_color", color)?;
    }
    if let Some(sections) = &req.sections {
        validate_sections(sections)?;
    }
    let default_sections: Vec<&str> = DEFAULT_CV_SECTIONS.to_vec();

    let row = sqlx::query_as::<_, CvTemplateRow>(
        r#"
        INSERT INTO cv_templates
            (company_id, template_key, accent_color, font_family, sections, show_photo)
        VALUES ($1, COALESCE($2, 'classic'), $3, $4, COALESCE($5, $7), COALESCE($6, false))
        ON CONFLICT (company_id) DO UPDATE SET
            template_key = COALESCE($2, cv_templates.template_key),
            accent_color = COALESCE($3, cv_templates.accent_color),
            font_family = COALESCE($4, cv_templates.font_family),
            sections = COALESCE($5, cv_templates.sections),
            show_photo = COALESCE($6, cv_templates.show_photo),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(company.id)
    .bind(&req.template_key)
    .bind(req.accent_color.map(|c| c.to_ascii_lowercase()))
    .bind(req.font_family.as_deref().map(str::trim))
    .bind(req.sections.as_ref().map(SqlJson))
    .bind(req.show_photo)
    .bind(SqlJson(&default_sections))
    .fetch_one(&state.db)
    .await?;

    log_settings_update(&state, company.id, session.user.id, "cv_template");
    Ok(Json(SettingsResponse::configured(row)))
}

// ── Landing page ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LandingPageUpdate {
    pub locale: Option<String>,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub body_html: Option<String>,
    pub published: Option<bool>,
}

pub async fn fetch_landing_page(
    pool: &sqlx::PgPool,
    company_id: Uuid,
) -> Result<Option<LandingPageRow>, sqlx::Error> {
    sqlx::query_as::<_, LandingPageRow>("SELECT * FROM landing_pages WHERE company_id = $1")
        .bind(company_id)
        .fetch_optional(pool)
        .await
}

/// GET /api/v1/landing-page
pub async fn handle_get_landing_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SettingsResponse<LandingPageRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let row = fetch_landing_page(&state.db, company.id).await?;
    Ok(Json(SettingsResponse::from_row(row, || default_landing_page(company.id))))
}

/// PUT /api/v1/landing-page
pub async fn handle_put_landing_page(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<LandingPageUpdate>,
) -> Result<Json<SettingsResponse<LandingPageRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let locale = req.locale.as_deref().map(normalize_locale).transpose()?;
    // An explicitly submitted body that normalizes to nothing is stored as an empty string.
    let body_html = req
        .body_html
        .as_deref()
        .map(|html| normalize_html(html).unwrap_or_default());

    let row = sqlx::query_as::<_, LandingPageRow>(
        r#"
        INSERT INTO landing_pages
            (company_id, locale, headline, subheadline, body_html, published)
        VALUES ($1, COALESCE($2, 'en'), $3, $4, $5, COALESCE($6, false))
        ON CONFLICT (company_id) DO UPDATE SET
            locale = COALESCE($2, landing_pages.locale),
            headline = COALESCE($3, landing_pages.headline),
            subheadline = COALESCE($4, landing_pages.subheadline),
            body_html = COALESCE($5, landing_pages.body_html),
            published = COALESCE($6, landing_pages.published),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(company.id)
    .bind(locale)
    .bind(req.headline.as_deref().map(str::trim))
    .bind(req.subheadline.as_deref().map(str::trim))
    .bind(body_html)
    .bind(req.published)
    .fetch_one(&state.db)
    .await?;

    log_settings_update(&state, company.id, session.user.id, "landing_page");
    Ok(Json(SettingsResponse::configured(row)))
}

// ── Consent config ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConsentConfigUpdate {
    pub privacy_policy_url: Option<String>,
    pub consent_text: Option<String>,
    pub retention_days: Option<i32>,
    pub require_explicit_consent: Option<bool>,
}

pub async fn fetch_consent_config(
    pool: &sqlx::PgPool,
    company_id: Uuid,
) -> Result<Option<ConsentConfigRow>, sqlx::Error> {
    sqlx::query_as::<_, ConsentConfigRow>("SELECT * FROM consent_configs WHERE company_id = $1")
        .bind(company_id)
        .fetch_optional(pool)
        .await
}

/// GET /api/v1/consent-config
pub async fn handle_get_consent_config(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SettingsResponse<ConsentConfigRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let row = fetch_consent_config(&state.db, company.id).await?;
    Ok(Json(SettingsResponse::from_row(row, || default_consent_config(company.id))))
}

/// PUT /api/v1/consent-config
pub async fn handle_put_consent_config(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<ConsentConfigUpdate>,
) -> Result<Json<SettingsResponse<ConsentConfigRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    if let Some(url) = &req.privacy_policy_url {
        validate_http_url("privacy_policy_url", url)?;
    }
    if let Some(days) = req.retention_days {
        validate_retention_days(days)?;
    }

    let row = sqlx::query_as::<_, ConsentConfigRow>(
        r#"
        INSERT INTO consent_configs
            (company_id, privacy_policy_url, consent_text, retention_days, require_explicit_consent)
        VALUES ($1, $2, COALESCE($3, $6), COALESCE($4, $7), COALESCE($5, true))
        ON CONFLICT (company_id) DO UPDATE SET
            privacy_policy_url = COALESCE($2, consent_configs.privacy_policy_url),
            consent_text = COALESCE($3, consent_configs.consent_text),
            retention_days = COALESCE($4, consent_configs.retention_days),
            require_explicit_consent = COALESCE($5, consent_configs.require_explicit_consent),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(company.id)
    .bind(&req.privacy_policy_url)
    .bind(req.consent_text.as_deref().map(str::trim))
    .bind(req.retention_days)
    .bind(req.require_explicit_consent)
    .bind(DEFAULT_CONSENT_TEXT)
    .bind(DEFAULT_RETENTION_DAYS)
    .fetch_one(&state.db)
    .await?;

    log_settings_update(&state, company.id, session.user.id, "consent_config");
    Ok(Json(SettingsResponse::configured(row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_row_reports_defaults() {
        let company = Uuid::new_v4();
        let response = SettingsResponse::from_row(None, || default_consent_config(company));
        assert!(!response.configured);
        assert_eq!(response.settings.retention_days, DEFAULT_RETENTION_DAYS);
        assert!(response.settings.require_explicit_consent);
    }

    #[test]
    fn test_default_cv_sections() {
        let template = default_cv_template(Uuid::nil());
        assert_eq!(template.template_key, "classic");
        assert_eq!(template.sections.0.first().map(String::as_str), Some("personal"));
        assert!(validate_sections(&template.sections.0).is_ok());
    }
}
