use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::activity::{log_activity, ActivityEntry};
use crate::auth::{require_company, Session};
use crate::errors::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::jobs::{parse_job_status, parse_job_type, validate_salary};
use crate::models::job::{JobRow, JobStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub job_type: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub job_type: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub status: Option<String>,
}

/// Loads a job scoped to the company; other tenants' jobs are indistinguishable from missing ones.
pub async fn find_company_job(
    pool: &sqlx::PgPool,
    company_id: Uuid,
    job_id: Uuid,
) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND company_id = $2")
        .bind(job_id)
        .bind(company_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(params): ValidQuery<JobListQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let status = params
        .status
        .as_deref()
        .map(parse_job_status)
        .transpose()?
        .map(|s| s.as_str());

    let jobs = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT * FROM jobs
        WHERE company_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(company.id)
    .bind(status)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let company = require_company(&state.db, &session.user).await?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    let job_type = parse_job_type(&req.job_type)?;
    let status = match req.status.as_deref() {
        Some(s) => parse_job_status(s)?,
        None => JobStatus::Draft,
    };
    validate_salary(req.salary_min, req.salary_max)?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (id, company_id, title, description, location, country, job_type,
             salary_min, salary_max, salary_currency, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company.id)
    .bind(title)
    .bind(&req.description)
    .bind(&req.location)
    .bind(&req.country)
    .bind(job_type.as_str())
    .bind(req.salary_min)
    .bind(req.salary_max)
    .bind(&req.salary_currency)
    .bind(status.as_str())
    .fetch_one(&state.db)
    .await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "job.created", "job")
            .by(session.user.id)
            .entity(job.id)
            .metadata(json!({ "title": job.title })),
    );

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    Ok(Json(find_company_job(&state.db, company.id, id).await?))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let existing = find_company_job(&state.db, company.id, id).await?;

    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    let job_type = req.job_type.as_deref().map(parse_job_type).transpose()?;
    let status = req.status.as_deref().map(parse_job_status).transpose()?;
    validate_salary(
        req.salary_min.or(existing.salary_min),
        req.salary_max.or(existing.salary_max),
    )?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET
            title = COALESCE($3, title),
            description = COALESCE($4, description),
            location = COALESCE($5, location),
            country = COALESCE($6, country),
            job_type = COALESCE($7, job_type),
            salary_min = COALESCE($8, salary_min),
            salary_max = COALESCE($9, salary_max),
            salary_currency = COALESCE($10, salary_currency),
            status = COALESCE($11, status),
            updated_at = now()
        WHERE id = $1 AND company_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(company.id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(&req.location)
    .bind(&req.country)
    .bind(job_type.map(|t| t.as_str()))
    .bind(req.salary_min)
    .bind(req.salary_max)
    .bind(&req.salary_currency)
    .bind(status.map(|s| s.as_str()))
    .fetch_one(&state.db)
    .await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "job.updated", "job")
            .by(session.user.id)
            .entity(job.id)
            .metadata(json!({ "from_status": existing.status, "to_status": job.status })),
    );

    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let job = find_company_job(&state.db, company.id, id).await?;

    let applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE job_id = $1")
        .bind(job.id)
        .fetch_one(&state.db)
        .await?;
    if applications > 0 {
        return Err(AppError::Validation(format!(
            "Job has {applications} application(s); close it instead of deleting"
        )));
    }

    sqlx::query("DELETE FROM jobs WHERE id = $1 AND company_id = $2")
        .bind(job.id)
        .bind(company.id)
        .execute(&state.db)
        .await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "job.deleted", "job")
            .by(session.user.id)
            .entity(job.id)
            .metadata(json!({ "title": job.title })),
    );

    Ok(StatusCode::NO_CONTENT)
}
