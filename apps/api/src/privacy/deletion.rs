use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::privacy::{DeletionRequestRow, DeletionStatus};

/// Result of a processed deletion request.
pub struct DeletionOutcome {
    pub request: DeletionRequestRow,
    /// S3 keys of resumes that belonged to the deleted applications.
    pub resume_keys: Vec<String>,
}

/// Deletes the candidate's applications, their evaluations and related
/// activity, and marks the request completed. Runs in a single transaction.
pub async fn process_deletion(
    pool: &PgPool,
    company_id: Uuid,
    request_id: Uuid,
    processed_by: Uuid,
) -> Result<DeletionOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, DeletionRequestRow>(
        "SELECT * FROM data_deletion_requests WHERE id = $1 AND company_id = $2 FOR UPDATE",
    )
    .bind(request_id)
    .bind(company_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Deletion request {request_id} not found")))?;
    ensure_pending(&request)?;

    let targets: Vec<(Uuid, Option<String>)> = sqlx::query_as(
        r#"
        SELECT id, resume_key FROM applications
        WHERE company_id = $1 AND lower(candidate_email) = $2
        FOR UPDATE
        "#,
    )
    .bind(company_id)
    .bind(&request.candidate_email)
    .fetch_all(&mut *tx)
    .await?;
    let ids: Vec<Uuid> = targets.iter().map(|(id, _)| *id).collect();

    sqlx::query("DELETE FROM evaluations WHERE application_id = ANY($1)")
        .bind(&ids)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        DELETE FROM activity_logs
        WHERE company_id = $1 AND entity_type = 'application' AND entity_id = ANY($2)
        "#,
    )
    .bind(company_id)
    .bind(&ids)
    .execute(&mut *tx)
    .await?;
    let deleted = sqlx::query("DELETE FROM applications WHERE id = ANY($1)")
        .bind(&ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let request = sqlx::query_as::<_, DeletionRequestRow>(
        r#"
        UPDATE data_deletion_requests
        SET status = $2, processed_at = $3, processed_by = $4, deleted_applications = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(request.id)
    .bind(DeletionStatus::Completed.as_str())
    .bind(Utc::now())
    .bind(processed_by)
    .bind(i32::try_from(deleted).unwrap_or(i32::MAX))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(
        "Processed deletion request {} for company {company_id}: {deleted} application(s) removed",
        request.id
    );

    Ok(DeletionOutcome {
        request,
        resume_keys: targets.into_iter().filter_map(|(_, key)| key).collect(),
    })
}

/// Marks a pending request as rejected.
pub async fn reject_deletion(
    pool: &PgPool,
    company_id: Uuid,
    request_id: Uuid,
    processed_by: Uuid,
    reason: Option<&str>,
) -> Result<DeletionRequestRow, AppError> {
    let mut tx = pool.begin().await?;
    let request = sqlx::query_as::<_, DeletionRequestRow>(
        "SELECT * FROM data_deletion_requests WHERE id = $1 AND company_id = $2 FOR UPDATE",
    )
    .bind(request_id)
    .bind(company_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Deletion request {request_id} not found")))?;
    ensure_pending(&request)?;

    let request = sqlx::query_as::<_, DeletionRequestRow>(
        r#"
        UPDATE data_deletion_requests
        SET status = $2, processed_at = now(), processed_by = $3, reason = COALESCE($4, reason)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(request.id)
    .bind(DeletionStatus::Rejected.as_str())
    .bind(processed_by)
    .bind(reason.map(str::trim).filter(|r| !r.is_empty()))
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(request)
}

/// Removes resume objects after the database cascade has committed.
/// Failures are logged; the database side is already consistent.
pub async fn purge_resumes(s3: &aws_sdk_s3::Client, bucket: &str, keys: &[String]) -> usize {
    let mut removed = 0;
    for key in keys {
        match s3.delete_object().bucket(bucket).key(key).send().await {
            Ok(_) => removed += 1,
            Err(e) => warn!("Failed to delete resume s3://{bucket}/{key}: {e}"),
        }
    }
    removed
}

pub fn ensure_pending(request: &DeletionRequestRow) -> Result<(), AppError> {
    if DeletionStatus::parse(&request.status) != Some(DeletionStatus::Pending) {
        return Err(AppError::Validation(format!(
            "Deletion request {} is already {}",
            request.id, request.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: &str) -> DeletionRequestRow {
        DeletionRequestRow {
            id: Uuid::nil(),
            company_id: Uuid::nil(),
            candidate_email: "ada@example.com".to_string(),
            reason: None,
            status: status.to_string(),
            requested_at: Utc::now(),
            processed_at: None,
            processed_by: None,
            deleted_applications: 0,
        }
    }

    #[test]
    fn test_only_pending_requests_are_processable() {
        assert!(ensure_pending(&request("pending")).is_ok());
        assert!(matches!(
            ensure_pending(&request("completed")),
            Err(AppError::Validation(_))
        ));
        assert!(ensure_pending(&request("rejected")).is_err());
    }
}
