use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::activity::{log_activity, ActivityEntry};
use crate::auth::{require_company, Session};
use crate::companies::{next_free_slug, slugify};
use crate::errors::AppError;
use crate::extract::ValidJson;
use crate::models::company::CompanyRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub website: Option<String>,
}

const SLUG_ATTEMPTS: usize = 5;

/// Inserts the company and links its owner in one transaction.
async fn insert_company(
    pool: &PgPool,
    name: &str,
    slug: &str,
    website: Option<&str>,
    owner_id: Uuid,
) -> Result<CompanyRow, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let company = sqlx::query_as::<_, CompanyRow>(
        r#"
        INSERT INTO companies (id, name, slug, owner_id, website)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(owner_id)
    .bind(website)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET company_id = $1 WHERE id = $2")
        .bind(company.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(company)
}

/// POST /api/v1/company
pub async fn handle_create_company(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyRow>), AppError> {
    if session.user.company_id.is_some() {
        return Err(AppError::Validation(
            "User already belongs to a company".to_string(),
        ));
    }
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let mut base = slugify(name);
    if base.is_empty() {
        base = "company".to_string();
    }
    let mut taken: Vec<String> =
        sqlx::query_scalar("SELECT slug FROM companies WHERE slug = $1 OR slug LIKE $1 || '-%'")
            .bind(&base)
            .fetch_all(&state.db)
            .await?;
    let website = req.website.as_deref().map(str::trim).filter(|w| !w.is_empty());

    let mut created = None;
    for _ in 0..SLUG_ATTEMPTS {
        let slug = next_free_slug(&base, &taken);
        match insert_company(&state.db, name, &slug, website, session.user.id).await {
            Ok(company) => {
                created = Some(company);
                break;
            }
            Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
                warn!("Slug {slug} was taken concurrently, retrying");
                taken.push(slug);
            }
            Err(e) => return Err(e.into()),
        }
    }
    let company = created.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "no free slug for '{base}' after {SLUG_ATTEMPTS} attempts"
        ))
    })?;
    let slug = company.slug.clone();

    info!("Created company {} ({}) for user {}", company.id, slug, session.user.id);
    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "company.created", "company")
            .by(session.user.id)
            .entity(company.id)
            .metadata(json!({ "slug": slug })),
    );

    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/v1/company
pub async fn handle_get_company(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CompanyRow>, AppError> {
    Ok(Json(require_company(&state.db, &session.user).await?))
}

/// PATCH /api/v1/company
pub async fn handle_update_company(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<UpdateCompanyRequest>,
) -> Result<Json<CompanyRow>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
    }

    let updated = sqlx::query_as::<_, CompanyRow>(
        r#"
        UPDATE companies
        SET name = COALESCE($2, name),
            website = COALESCE($3, website),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(company.id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.website.as_deref().map(str::trim))
    .fetch_one(&state.db)
    .await?;

    log_activity(
        &state.db,
        ActivityEntry::new(company.id, "company.updated", "company")
            .by(session.user.id)
            .entity(company.id),
    );

    Ok(Json(updated))
}
