use axum::{extract::State, Json};
use serde::Deserialize;

use crate::activity::page_limit;
use crate::auth::{require_company, Session};
use crate::errors::AppError;
use crate::extract::ValidQuery;
use crate::models::activity::ActivityLogRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/activity
pub async fn handle_list_activity(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(params): ValidQuery<ActivityQuery>,
) -> Result<Json<Vec<ActivityLogRow>>, AppError> {
    let company = require_company(&state.db, &session.user).await?;

    let rows = sqlx::query_as::<_, ActivityLogRow>(
        r#"
        SELECT * FROM activity_logs
        WHERE company_id = $1 AND ($2::text IS NULL OR entity_type = $2)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(company.id)
    .bind(params.entity_type)
    .bind(page_limit(params.limit))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}
