use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Resume uploads and GDPR cleanup go through this bucket client.
    pub s3: S3Client,
    pub config: Config,
}
