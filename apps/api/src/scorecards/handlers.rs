use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::activity::{log_activity, ActivityEntry};
use crate::auth::{require_company, Session};
use crate::errors::AppError;
use crate::extract::ValidJson;
use crate::models::scorecard::{Criterion, ScorecardRow};
use crate::scorecards::validate_criteria;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateScorecardRequest {
    pub name: String,
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScorecardRequest {
    pub name: Option<String>,
    pub criteria: Option<Vec<Criterion>>,
    pub is_default: Option<bool>,
}

pub async fn find_company_scorecard(
    pool: &sqlx::PgPool,
    company_id: Uuid,
    scorecard_id: Uuid,
) -> Result<ScorecardRow, AppError> {
    sqlx::query_as::<_, ScorecardRow>("SELECT * FROM scorecards WHERE id = $1 AND company_id = $2")
        .bind(scorecard_id)
        .bind(company_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Scorecard {scorecard_id} not found")))
}

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(name)
}

/// GET /api/v1/scorecards
pub async fn handle_list_scorecards(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ScorecardRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let rows = sqlx::query_as::<_, ScorecardRow>(
        "SELECT * FROM scorecards WHERE company_id = $1 ORDER BY is_default DESC, name ASC",
    )
    .bind(company.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// Clears the default flag on the company's other scorecards.
///
/// The company row is locked first so concurrent default changes for one
/// company run one after another.
async fn clear_other_defaults(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    keep: Option<Uuid>,
) -> Result<(), AppError> {
    sqlx::query("SELECT id FROM companies WHERE id = $1 FOR UPDATE")
        .bind(company_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "UPDATE scorecards SET is_default = false \
         WHERE company_id = $1 AND is_default AND id IS DISTINCT FROM $2",
    )
    .bind(company_id)
    .bind(keep)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// POST /api/v1/scorecards
pub async fn handle_create_scorecard(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateScorecardRequest>,
) -> Result<(StatusCode, Json<ScorecardRow>), AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let name = validate_name(&req.name)?;
    let criteria = validate_criteria(&req.criteria)?;

    let mut tx = state.db.begin().await?;
    if req.is_default {
        clear_other_defaults(&mut tx, company.id, None).await?;
    }
    let scorecard = sqlx::query_as::<_, ScorecardRow>(
        r#"
        INSERT INTO scorecards (id, company_id, name, criteria, is_default)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company.id)
    .bind(name)
    .bind(SqlJson(&criteria))
    .bind(req.is_default)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "scorecard.created", "scorecard")
            .by(session.user.id)
            .entity(scorecard.id),
    );

    Ok((StatusCode::CREATED, Json(scorecard)))
}

/// GET /api/v1/scorecards/:id
pub async fn handle_get_scorecard(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ScorecardRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    Ok(Json(find_company_scorecard(&state.db, company.id, id).await?))
}

/// PATCH /api/v1/scorecards/:id
pub async fn handle_update_scorecard(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateScorecardRequest>,
) -> Result<Json<ScorecardRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let existing = find_company_scorecard(&state.db, company.id, id).await?;

    let name = req.name.as_deref().map(validate_name).transpose()?;
    let criteria = req.criteria.as_deref().map(validate_criteria).transpose()?;

    let mut tx = state.db.begin().await?;
    if req.is_default == Some(true) {
        clear_other_defaults(&mut tx, company.id, Some(existing.id)).await?;
    }
    let scorecard = sqlx::query_as::<_, ScorecardRow>(
        r#"
        UPDATE scorecards SET
            name = COALESCE($3, name),
            criteria = COALESCE($4, criteria),
            is_default = COALESCE($5, is_default),
            updated_at = now()
        WHERE id = $1 AND company_id = $2
        RETURNING *
        "#,
    )
    .bind(existing.id)
    .bind(company.id)
    .bind(name)
    .bind(criteria.as_ref().map(SqlJson))
    .bind(req.is_default)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "scorecard.updated", "scorecard")
            .by(session.user.id)
            .entity(scorecard.id),
    );

    Ok(Json(scorecard))
}

/// DELETE /api/v1/scorecards/:id
pub async fn handle_delete_scorecard(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let scorecard = find_company_scorecard(&state.db, company.id, id).await?;

    sqlx::query("DELETE FROM scorecards WHERE id = $1 AND company_id = $2")
        .bind(scorecard.id)
        .bind(company.id)
        .execute(&state.db)
        .await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "scorecard.deleted", "scorecard")
            .by(session.user.id)
            .entity(scorecard.id),
    );

    Ok(StatusCode::NO_CONTENT)
}
