use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::company::CompanyRow;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub company: Option<CompanyRow>,
}

/// GET /api/v1/me
pub async fn handle_me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<MeResponse>, AppError> {
    let company = match session.user.company_id {
        Some(id) => {
            sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
                .bind(id)
                .fetch_optional(&state.db)
                .await?
        }
        None => None,
    };
    Ok(Json(MeResponse {
        user: session.user,
        company,
    }))
}
