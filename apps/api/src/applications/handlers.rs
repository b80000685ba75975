use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::activity::{log_activity, page_limit, ActivityEntry};
use crate::applications::export::applications_to_csv;
use crate::applications::parse_status;
use crate::auth::{require_company, Session};
use crate::errors::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::models::application::{ApplicationListRow, ApplicationRow};
use crate::state::AppState;

const RESUME_URL_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Deserialize)]
pub struct ApplicationListQuery {
    pub job_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub job_id: Option<Uuid>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeUrlResponse {
    pub url: String,
    pub expires_in: u64,
}

/// Loads an application scoped to the company.
pub async fn find_company_application(
    pool: &sqlx::PgPool,
    company_id: Uuid,
    application_id: Uuid,
) -> Result<ApplicationRow, AppError> {
    sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE id = $1 AND company_id = $2",
    )
    .bind(application_id)
    .bind(company_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))
}

async fn fetch_application_list(
    pool: &sqlx::PgPool,
    company_id: Uuid,
    job_id: Option<Uuid>,
    status: Option<&str>,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<ApplicationListRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationListRow>(
        r#"
        SELECT a.id, a.job_id, j.title AS job_title, a.candidate_name, a.candidate_email,
               a.phone, a.source, a.status, a.created_at
        FROM applications a
        JOIN jobs j ON j.id = a.job_id
        WHERE a.company_id = $1
          AND ($2::uuid IS NULL OR a.job_id = $2)
          AND ($3::text IS NULL OR a.status = $3)
        ORDER BY a.created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(company_id)
    .bind(job_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(params): ValidQuery<ApplicationListQuery>,
) -> Result<Json<Vec<ApplicationListRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let status = params.status.as_deref().map(parse_status).transpose()?;

    let rows = fetch_application_list(
        &state.db,
        company.id,
        params.job_id,
        status.map(|s| s.as_str()),
        Some(page_limit(params.limit)),
        params.offset.unwrap_or(0).max(0),
    )
    .await?;

    Ok(Json(rows))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    Ok(Json(find_company_application(&state.db, company.id, id).await?))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<StatusUpdate>,
) -> Result<Json<ApplicationRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let status = parse_status(&req.status)?;
    let existing = find_company_application(&state.db, company.id, id).await?;

    let updated = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications SET status = $3, updated_at = now()
        WHERE id = $1 AND company_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(company.id)
    .bind(status.as_str())
    .fetch_one(&state.db)
    .await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "application.status_changed", "application")
            .by(session.user.id)
            .entity(id)
            .metadata(json!({ "from": existing.status, "to": updated.status })),
    );

    Ok(Json(updated))
}

/// GET /api/v1/applications/:id/resume
pub async fn handle_resume_url(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeUrlResponse>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let application = find_company_application(&state.db, company.id, id).await?;
    let key = application
        .resume_key
        .ok_or_else(|| AppError::NotFound(format!("Application {id} has no resume")))?;

    let presigning = PresigningConfig::expires_in(RESUME_URL_TTL)
        .map_err(|e| AppError::Storage(format!("Invalid presigning config: {e}")))?;
    let request = state
        .s3
        .get_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .presigned(presigning)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to presign {key}: {e}")))?;

    Ok(Json(ResumeUrlResponse {
        url: request.uri().to_string(),
        expires_in: RESUME_URL_TTL.as_secs(),
    }))
}

/// GET /api/v1/applications/export.csv
pub async fn handle_export_csv(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(params): ValidQuery<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let status = params.status.as_deref().map(parse_status).transpose()?;

    let rows = fetch_application_list(
        &state.db,
        company.id,
        params.job_id,
        status.map(|s| s.as_str()),
        None,
        0,
    )
    .await?;
    let body = applications_to_csv(&rows)?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "application.exported", "application")
            .by(session.user.id)
            .metadata(json!({ "rows": rows.len() })),
    );

    let filename = format!(
        "attachment; filename=\"{}-applications-{}.csv\"",
        company.slug,
        chrono::Utc::now().format("%Y%m%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        body,
    ))
}
