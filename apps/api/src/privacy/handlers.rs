use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::activity::{log_activity, ActivityEntry};
use crate::auth::{require_company, Session};
use crate::errors::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::models::privacy::{DeletionRequestRow, DeletionStatus};
use crate::privacy::deletion::{process_deletion, purge_resumes, reject_deletion};
use crate::privacy::export::collect_candidate_data;
use crate::privacy::{create_deletion_request, normalize_email, validate_email};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct DeletionRequestBody {
    pub email: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeletionListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub request: DeletionRequestRow,
    pub resumes_removed: usize,
}

/// GET /api/v1/privacy/export?email=
pub async fn handle_export(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(params): ValidQuery<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let email = normalize_email(&params.email);
    validate_email(&email)?;

    let export = collect_candidate_data(&state.db, company.id, &email).await?;
    let body = serde_json::to_vec_pretty(&export).map_err(anyhow::Error::from)?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "privacy.exported", "candidate")
            .by(session.user.id)
            .metadata(json!({ "applications": export.applications.len() })),
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"candidate-export-{}.json\"",
                    export.exported_at.format("%Y%m%d%H%M%S")
                ),
            ),
        ],
        body,
    ))
}

/// POST /api/v1/privacy/deletion-requests
pub async fn handle_create_deletion_request(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<DeletionRequestBody>,
) -> Result<(StatusCode, Json<DeletionRequestRow>), AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let request =
        create_deletion_request(&state.db, company.id, &req.email, req.reason.as_deref()).await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "privacy.deletion_requested", "deletion_request")
            .by(session.user.id)
            .entity(request.id),
    );

    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/v1/privacy/deletion-requests
pub async fn handle_list_deletion_requests(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(params): ValidQuery<DeletionListQuery>,
) -> Result<Json<Vec<DeletionRequestRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let status = params
        .status
        .as_deref()
        .map(|s| {
            DeletionStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown status '{s}'")))
        })
        .transpose()?;

    let rows = sqlx::query_as::<_, DeletionRequestRow>(
        r#"
        SELECT * FROM data_deletion_requests
        WHERE company_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY requested_at DESC
        "#,
    )
    .bind(company.id)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// POST /api/v1/privacy/deletion-requests/:id/process
pub async fn handle_process_deletion(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessResponse>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let outcome = process_deletion(&state.db, company.id, id, session.user.id).await?;
    let resumes_removed =
        purge_resumes(&state.s3, &state.config.s3_bucket, &outcome.resume_keys).await;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "privacy.deletion_completed", "deletion_request")
            .by(session.user.id)
            .entity(outcome.request.id)
            .metadata(json!({
                "deleted_applications": outcome.request.deleted_applications,
                "resumes_removed": resumes_removed,
            })),
    );

    Ok(Json(ProcessResponse {
        request: outcome.request,
        resumes_removed,
    }))
}

/// POST /api/v1/privacy/deletion-requests/:id/reject
pub async fn handle_reject_deletion(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<RejectBody>,
) -> Result<Json<DeletionRequestRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let request =
        reject_deletion(&state.db, company.id, id, session.user.id, req.reason.as_deref()).await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "privacy.deletion_rejected", "deletion_request")
            .by(session.user.id)
            .entity(request.id),
    );

    Ok(Json(request))
}
