use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::activity::{log_activity, ActivityEntry};
use crate::applications::handlers::find_company_application;
use crate::auth::{require_company, Session};
use crate::errors::AppError;
use crate::evaluation::aggregate::{
    summarize, summary_scorecard, EvaluationSummary, SummaryScorecard,
};
use crate::evaluation::{validate_rating, validate_scores};
use crate::extract::ValidJson;
use crate::models::evaluation::{EvaluationRow, Recommendation};
use crate::models::scorecard::ScorecardRow;
use crate::scorecards::handlers::find_company_scorecard;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub rating: i16,
    #[serde(default)]
    pub scores: BTreeMap<String, i16>,
    pub scorecard_id: Option<Uuid>,
    pub recommendation: Option<Recommendation>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationListResponse {
    pub evaluations: Vec<EvaluationRow>,
    pub summary: EvaluationSummary,
}

const UPSERT_EVALUATION_SQL: &str = r#"
    INSERT INTO evaluations
        (id, application_id, user_id, scorecard_id, rating, scores, recommendation, notes)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (application_id, user_id) DO UPDATE SET
        scorecard_id = EXCLUDED.scorecard_id,
        rating = EXCLUDED.rating,
        scores = EXCLUDED.scores,
        recommendation = EXCLUDED.recommendation,
        notes = EXCLUDED.notes,
        updated_at = now()
    RETURNING *
"#;

/// PUT /api/v1/applications/:id/evaluation
///
/// Creates or replaces the caller's evaluation; one row per (application, reviewer).
pub async fn handle_upsert_evaluation(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<Uuid>,
    ValidJson(req): ValidJson<EvaluationRequest>,
) -> Result<Json<EvaluationRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let application = find_company_application(&state.db, company.id, application_id).await?;

    validate_rating(req.rating)?;
    let scorecard = match req.scorecard_id {
        Some(id) => Some(find_company_scorecard(&state.db, company.id, id).await?),
        None => None,
    };
    validate_scores(
        &req.scores,
        scorecard.as_ref().map(|s| s.criteria.0.as_slice()),
    )?;

    let notes = req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let evaluation = sqlx::query_as::<_, EvaluationRow>(UPSERT_EVALUATION_SQL)
        .bind(Uuid::new_v4())
        .bind(application.id)
        .bind(session.user.id)
        .bind(req.scorecard_id)
        .bind(req.rating)
        .bind(SqlJson(&req.scores))
        .bind(req.recommendation.map(|r| r.as_str()))
        .bind(notes)
        .fetch_one(&state.db)
        .await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "evaluation.submitted", "application")
            .by(session.user.id)
            .entity(application.id)
            .metadata(json!({ "rating": evaluation.rating })),
    );

    Ok(Json(evaluation))
}

/// GET /api/v1/applications/:id/evaluations
pub async fn handle_list_evaluations(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<Uuid>,
) -> Result<Json<EvaluationListResponse>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let application = find_company_application(&state.db, company.id, application_id).await?;

    let evaluations = sqlx::query_as::<_, EvaluationRow>(
        "SELECT * FROM evaluations WHERE application_id = $1 ORDER BY created_at ASC",
    )
    .bind(application.id)
    .fetch_all(&state.db)
    .await?;

    let scorecard = load_summary_scorecard(&state.db, company.id, &evaluations).await?;
    let summary = summarize(
        &evaluations,
        scorecard.as_ref().map(|s| s.criteria.0.as_slice()),
    );

    Ok(Json(EvaluationListResponse {
        evaluations,
        summary,
    }))
}

/// DELETE /api/v1/applications/:id/evaluation
pub async fn handle_delete_evaluation(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let application = find_company_application(&state.db, company.id, application_id).await?;

    let result = sqlx::query("DELETE FROM evaluations WHERE application_id = $1 AND user_id = $2")
        .bind(application.id)
        .bind(session.user.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Evaluation not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// The scorecard shared by every evaluation, else the company default.
async fn load_summary_scorecard(
    pool: &sqlx::PgPool,
    company_id: Uuid,
    evaluations: &[EvaluationRow],
) -> Result<Option<ScorecardRow>, AppError> {
    let scorecard = match summary_scorecard(evaluations) {
        SummaryScorecard::Shared(id) => {
            sqlx::query_as::<_, ScorecardRow>(
                "SELECT * FROM scorecards WHERE id = $1 AND company_id = $2",
            )
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await?
        }
        SummaryScorecard::CompanyDefault => {
            sqlx::query_as::<_, ScorecardRow>(
                "SELECT * FROM scorecards WHERE company_id = $1 AND is_default LIMIT 1",
            )
            .bind(company_id)
            .fetch_optional(pool)
            .await?
        }
    };
    Ok(scorecard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};

    async fn parse(body: &'static str) -> Result<EvaluationRequest, AppError> {
        let request = Request::put("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        ValidJson::<EvaluationRequest>::from_request(request, &())
            .await
            .map(|ValidJson(req)| req)
    }

    #[tokio::test]
    async fn test_unknown_recommendation_is_bad_request() {
        let err = parse(r#"{"rating":3,"recommendation":"bogus"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_minimal_request_parses() {
        let req = parse(r#"{"rating":4,"recommendation":"strong_yes"}"#)
            .await
            .unwrap();
        assert_eq!(req.rating, 4);
        assert!(req.scores.is_empty());
        assert_eq!(req.recommendation, Some(Recommendation::StrongYes));
    }

    #[test]
    fn test_upsert_targets_one_row_per_reviewer() {
        assert!(UPSERT_EVALUATION_SQL.contains("ON CONFLICT (application_id, user_id) DO UPDATE"));
        for column in ["rating", "scores", "recommendation", "notes", "scorecard_id"] {
            assert!(
                UPSERT_EVALUATION_SQL.contains(&format!("{column} = EXCLUDED.{column}")),
                "{column} is not overwritten on repeat"
            );
        }
    }
}
