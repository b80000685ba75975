//! GDPR candidate data export and deletion.

pub mod deletion;
pub mod export;
pub mod handlers;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::privacy::DeletionRequestRow;

/// Trims and lowercases an email address for matching.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose syntactic check: one `@` with something on both sides and no whitespace.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("'{email}' is not a valid email address")));
    }
    Ok(())
}

/// Files a deletion request. A pending request for the same email is returned as-is.
pub async fn create_deletion_request(
    pool: &PgPool,
    company_id: Uuid,
    email: &str,
    reason: Option<&str>,
) -> Result<DeletionRequestRow, AppError> {
    let email = normalize_email(email);
    validate_email(&email)?;

    let inserted = sqlx::query_as::<_, DeletionRequestRow>(
        r#"
        INSERT INTO data_deletion_requests (id, company_id, candidate_email, reason)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (company_id, candidate_email) WHERE status = 'pending' DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(&email)
    .bind(reason.map(str::trim).filter(|r| !r.is_empty()))
    .fetch_optional(pool)
    .await?;
    if let Some(row) = inserted {
        return Ok(row);
    }

    let existing = sqlx::query_as::<_, DeletionRequestRow>(
        r#"
        SELECT * FROM data_deletion_requests
        WHERE company_id = $1 AND candidate_email = $2 AND status = 'pending'
        "#,
    )
    .bind(company_id)
    .bind(&email)
    .fetch_one(pool)
    .await?;
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("ada lovelace@example.com").is_err());
    }
}
