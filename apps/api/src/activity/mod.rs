pub mod handlers;

use serde_json::Value;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// A single audit-trail record to be written asynchronously.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub metadata: Value,
}

impl ActivityEntry {
    pub fn new(company_id: Uuid, action: &str, entity_type: &str) -> Self {
        Self {
            company_id,
            user_id: None,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: None,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Records activity without blocking the request.
/// Failures are logged and swallowed; callers never see them.
pub fn log_activity(pool: &PgPool, entry: ActivityEntry) {
    let pool = pool.clone();
    tokio::spawn(async move {
        if let Err(e) = insert_activity(&pool, &entry).await {
            warn!(
                "Failed to record activity '{}' for company {}: {e}",
                entry.action, entry.company_id
            );
        }
    });
}

async fn insert_activity(pool: &PgPool, entry: &ActivityEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO activity_logs (id, company_id, user_id, action, entity_type, entity_id, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.company_id)
    .bind(entry.user_id)
    .bind(&entry.action)
    .bind(&entry.entity_type)
    .bind(entry.entity_id)
    .bind(&entry.metadata)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clamps a client-supplied page size to `1..=200`, defaulting to 50.
pub fn page_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(50).clamp(1, 200)
}
