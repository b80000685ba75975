//! Unauthenticated handlers under `/api/v1/public/companies/:slug`.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::activity::{log_activity, ActivityEntry};
use crate::careers::feed::{render_indeed_feed, FeedPublisher};
use crate::careers::{parse_consent, resume_key, sanitize_filename, validate_resume};
use crate::errors::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::models::company::CompanyRow;
use crate::models::job::{JobRow, JobStatus};
use crate::models::privacy::DeletionRequestRow;
use crate::privacy::{create_deletion_request, normalize_email, validate_email};
use crate::settings::handlers::{
    default_consent_config, fetch_branding, fetch_consent_config, fetch_landing_page,
};
use crate::settings::{DEFAULT_FONT_FAMILY, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PublicJob {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub job_type: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub apply_url: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct WidgetTheme {
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WidgetConfig {
    pub company_name: String,
    pub company_slug: String,
    pub headline: Option<String>,
    pub theme: WidgetTheme,
    pub jobs: Vec<PublicJob>,
}

#[derive(Debug, Serialize)]
pub struct PublicLandingPage {
    pub company_name: String,
    pub locale: String,
    pub requested_locale: Option<String>,
    pub locale_matched: bool,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub body_html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicConsent {
    pub privacy_policy_url: Option<String>,
    pub consent_text: Option<String>,
    pub retention_days: i32,
    pub require_explicit_consent: bool,
}

#[derive(Debug, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub application_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PublicDeletionRequest {
    pub email: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicDeletionResponse {
    pub id: Uuid,
    pub status: String,
}

impl From<DeletionRequestRow> for PublicDeletionResponse {
    fn from(row: DeletionRequestRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
        }
    }
}

fn careers_url(state: &AppState, slug: &str) -> String {
    format!("{}/careers/{slug}", state.config.public_base_url)
}

fn apply_url(state: &AppState, slug: &str, job_id: Uuid) -> String {
    format!("{}/jobs/{job_id}", careers_url(state, slug))
}

fn to_public_job(state: &AppState, slug: &str, job: JobRow) -> PublicJob {
    PublicJob {
        apply_url: apply_url(state, slug, job.id),
        id: job.id,
        title: job.title,
        description: job.description,
        location: job.location,
        country: job.country,
        job_type: job.job_type,
        salary_min: job.salary_min,
        salary_max: job.salary_max,
        salary_currency: job.salary_currency,
        posted_at: job.created_at,
    }
}

async fn company_by_slug(pool: &sqlx::PgPool, slug: &str) -> Result<CompanyRow, AppError> {
    sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company '{slug}' not found")))
}

async fn published_jobs(pool: &sqlx::PgPool, company_id: Uuid) -> Result<Vec<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE company_id = $1 AND status = $2 ORDER BY created_at DESC",
    )
    .bind(company_id)
    .bind(JobStatus::Published.as_str())
    .fetch_all(pool)
    .await
}

/// GET /api/v1/public/companies/:slug/jobs
pub async fn handle_public_jobs(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<PublicJob>>, AppError> {
    let company = company_by_slug(&state.db, &slug).await?;
    let jobs = published_jobs(&state.db, company.id).await?;
    Ok(Json(
        jobs.into_iter()
            .map(|job| to_public_job(&state, &company.slug, job))
            .collect(),
    ))
}

/// GET /api/v1/public/companies/:slug/jobs.xml
pub async fn handle_indeed_feed(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let company = company_by_slug(&state.db, &slug).await?;
    let jobs = published_jobs(&state.db, company.id).await?;

    let url = careers_url(&state, &company.slug);
    let publisher = FeedPublisher {
        name: &company.name,
        url: &url,
    };
    let xml = render_indeed_feed(
        &publisher,
        &jobs,
        |job| apply_url(&state, &company.slug, job.id),
        Utc::now(),
    )?;

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

/// GET /api/v1/public/companies/:slug/widget
pub async fn handle_widget_config(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<WidgetConfig>, AppError> {
    let company = company_by_slug(&state.db, &slug).await?;
    let branding = fetch_branding(&state.db, company.id).await?;
    let jobs = published_jobs(&state.db, company.id).await?;

    let theme = WidgetTheme {
        primary_color: branding
            .as_ref()
            .and_then(|b| b.primary_color.clone())
            .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
        secondary_color: branding
            .as_ref()
            .and_then(|b| b.secondary_color.clone())
            .unwrap_or_else(|| DEFAULT_SECONDARY_COLOR.to_string()),
        font_family: branding
            .as_ref()
            .and_then(|b| b.font_family.clone())
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        logo_url: branding.as_ref().and_then(|b| b.logo_url.clone()),
    };

    Ok(Json(WidgetConfig {
        headline: branding.and_then(|b| b.careers_headline),
        theme,
        jobs: jobs
            .into_iter()
            .map(|job| to_public_job(&state, &company.slug, job))
            .collect(),
        company_name: company.name,
        company_slug: company.slug,
    }))
}

/// GET /api/v1/public/companies/:slug/landing-page
pub async fn handle_public_landing_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ValidQuery(params): ValidQuery<LocaleQuery>,
) -> Result<Json<PublicLandingPage>, AppError> {
    let company = company_by_slug(&state.db, &slug).await?;
    let page = fetch_landing_page(&state.db, company.id)
        .await?
        .filter(|p| p.published)
        .ok_or_else(|| AppError::NotFound("Landing page not found".to_string()))?;

    let requested = params
        .locale
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    let locale_matched = requested
        .as_deref()
        .map_or(true, |l| l.eq_ignore_ascii_case(&page.locale));

    Ok(Json(PublicLandingPage {
        company_name: company.name,
        locale: page.locale,
        requested_locale: requested,
        locale_matched,
        headline: page.headline,
        subheadline: page.subheadline,
        body_html: page.body_html,
    }))
}

/// GET /api/v1/public/companies/:slug/consent
pub async fn handle_public_consent(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicConsent>, AppError> {
    let company = company_by_slug(&state.db, &slug).await?;
    let config = fetch_consent_config(&state.db, company.id)
        .await?
        .unwrap_or_else(|| default_consent_config(company.id));

    Ok(Json(PublicConsent {
        privacy_policy_url: config.privacy_policy_url,
        consent_text: config.consent_text,
        retention_days: config.retention_days,
        require_explicit_consent: config.require_explicit_consent,
    }))
}

/// Multipart fields of an application form.
#[derive(Default)]
struct ApplyForm {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    cover_letter: Option<String>,
    consent: Option<String>,
    source: Option<String>,
    resume: Option<ResumeUpload>,
}

struct ResumeUpload {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

async fn read_apply_form(mut multipart: Multipart) -> Result<ApplyForm, AppError> {
    let mut form = ApplyForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "resume" {
            let filename = sanitize_filename(field.file_name());
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            form.resume = Some(ResumeUpload {
                filename,
                content_type,
                data,
            });
            continue;
        }

        let value = field.text().await?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "name" => form.name = value,
            "email" => form.email = value,
            "phone" => form.phone = value,
            "cover_letter" => form.cover_letter = value,
            "consent" => form.consent = value,
            "source" => form.source = value,
            _ => {}
        }
    }
    Ok(form)
}

fn checked_resume(resume: Option<ResumeUpload>) -> Result<ResumeUpload, AppError> {
    let resume = resume.ok_or_else(|| AppError::Validation("resume is required".to_string()))?;
    validate_resume(&resume.filename, resume.content_type.as_deref(), resume.data.len())?;
    Ok(resume)
}

/// POST /api/v1/public/companies/:slug/jobs/:job_id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Path((slug, job_id)): Path<(String, Uuid)>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApplyResponse>), AppError> {
    let company = company_by_slug(&state.db, &slug).await?;
    let job = sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE id = $1 AND company_id = $2 AND status = $3",
    )
    .bind(job_id)
    .bind(company.id)
    .bind(JobStatus::Published.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let form = read_apply_form(multipart).await?;
    let name = form
        .name
        .ok_or_else(|| AppError::Validation("name is required".to_string()))?;
    let email = form
        .email
        .as_deref()
        .map(normalize_email)
        .ok_or_else(|| AppError::Validation("email is required".to_string()))?;
    validate_email(&email)?;

    let consent_config = fetch_consent_config(&state.db, company.id)
        .await?
        .unwrap_or_else(|| default_consent_config(company.id));
    let consent_given = parse_consent(form.consent.as_deref());
    if consent_config.require_explicit_consent && !consent_given {
        return Err(AppError::Validation(
            "consent is required to process this application".to_string(),
        ));
    }

    let resume = checked_resume(form.resume)?;

    let application_id = Uuid::new_v4();
    let key = resume_key(company.id, application_id, &resume.filename);

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO applications
            (id, company_id, job_id, candidate_name, candidate_email, phone,
             cover_letter, resume_key, source, status, consent_given)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'new', $10)
        "#,
    )
    .bind(application_id)
    .bind(company.id)
    .bind(job.id)
    .bind(&name)
    .bind(&email)
    .bind(&form.phone)
    .bind(&form.cover_letter)
    .bind(&key)
    .bind(form.source.as_deref().unwrap_or("careers_page"))
    .bind(consent_given)
    .execute(&mut *tx)
    .await?;

    let mut upload = state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(resume.data));
    if let Some(content_type) = resume.content_type {
        upload = upload.content_type(content_type);
    }
    upload
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("Resume upload failed: {e}")))?;
    info!("Uploaded resume to s3://{}/{}", state.config.s3_bucket, key);
    tx.commit().await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "application.received", "application")
            .entity(application_id)
            .metadata(json!({ "job_id": job.id, "source": form.source })),
    );

    Ok((StatusCode::CREATED, Json(ApplyResponse { application_id })))
}

/// POST /api/v1/public/companies/:slug/deletion-requests
pub async fn handle_public_deletion_request(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ValidJson(req): ValidJson<PublicDeletionRequest>,
) -> Result<(StatusCode, Json<PublicDeletionResponse>), AppError> {
    let company = company_by_slug(&state.db, &slug).await?;
    let request =
        create_deletion_request(&state.db, company.id, &req.email, req.reason.as_deref()).await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "privacy.deletion_requested", "deletion_request")
            .entity(request.id)
            .metadata(json!({ "origin": "candidate" })),
    );

    Ok((StatusCode::CREATED, Json(request.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};

    const BOUNDARY: &str = "hirekit-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
    }

    fn file_part(filename: &str, content_type: &str, data: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n"
        )
    }

    async fn multipart(parts: &[String]) -> Multipart {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        let request = Request::post("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_form_fields_are_trimmed() {
        let form = read_apply_form(
            multipart(&[
                text_part("name", "  Ada Lovelace "),
                text_part("email", "ada@example.com"),
                text_part("phone", "   "),
                file_part("cv.pdf", "application/pdf", "%PDF-1.7"),
            ])
            .await,
        )
        .await
        .unwrap();
        assert_eq!(form.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(form.phone, None);
        let resume = checked_resume(form.resume).unwrap();
        assert_eq!(resume.filename, "cv.pdf");
        assert_eq!(resume.data.as_ref(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_missing_resume_is_rejected() {
        let form = read_apply_form(
            multipart(&[
                text_part("name", "Ada"),
                text_part("email", "ada@example.com"),
                text_part("consent", "true"),
            ])
            .await,
        )
        .await
        .unwrap();
        match checked_resume(form.resume) {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "resume is required"),
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_wrong_resume_type_is_rejected() {
        let form = read_apply_form(
            multipart(&[file_part("photo.png", "image/png", "png")]).await,
        )
        .await
        .unwrap();
        assert!(matches!(
            checked_resume(form.resume),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_body_over_limit_is_payload_too_large() {
        // Multipart applies the default 2 MiB body limit when no layer overrides it.
        let big = "x".repeat(3 * 1024 * 1024);
        let err = read_apply_form(
            multipart(&[file_part("cv.pdf", "application/pdf", &big)]).await,
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }
}
