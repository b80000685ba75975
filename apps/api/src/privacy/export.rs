use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::activity::ActivityLogRow;
use crate::models::application::ApplicationRow;
use crate::models::evaluation::EvaluationRow;

/// Everything a company holds about one candidate.
#[derive(Debug, Serialize)]
pub struct CandidateExport {
    pub candidate_email: String,
    pub exported_at: DateTime<Utc>,
    pub applications: Vec<ApplicationRow>,
    pub evaluations: Vec<EvaluationRow>,
    pub activity: Vec<ActivityLogRow>,
}

/// Collects the candidate's data within one company. `email` must already be normalized.
pub async fn collect_candidate_data(
    pool: &PgPool,
    company_id: Uuid,
    email: &str,
) -> Result<CandidateExport, sqlx::Error> {
    let applications = sqlx::query_as::<_, ApplicationRow>(
        r#"
        SELECT * FROM applications
        WHERE company_id = $1 AND lower(candidate_email) = $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(company_id)
    .bind(email)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = applications.iter().map(|a| a.id).collect();

    let evaluations = sqlx::query_as::<_, EvaluationRow>(
        "SELECT * FROM evaluations WHERE application_id = ANY($1) ORDER BY created_at ASC",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let activity = sqlx::query_as::<_, ActivityLogRow>(
        r#"
        SELECT * FROM activity_logs
        WHERE company_id = $1 AND entity_type = 'application' AND entity_id = ANY($2)
        ORDER BY created_at ASC
        "#,
    )
    .bind(company_id)
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    Ok(CandidateExport {
        candidate_email: email.to_string(),
        exported_at: Utc::now(),
        applications,
        evaluations,
        activity,
    })
}
