pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::careers::MAX_RESUME_BYTES;
use crate::state::AppState;
use crate::{
    activity, applications, auth, calendar, careers, companies, evaluation, jobs, privacy,
    scorecards, settings,
};

/// Multipart overhead on top of the resume itself (form fields, boundaries).
const APPLY_BODY_LIMIT: usize = MAX_RESUME_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/me", get(auth::handlers::handle_me))
        // Company (tenant)
        .route(
            "/api/v1/company",
            get(companies::handlers::handle_get_company)
                .post(companies::handlers::handle_create_company)
                .patch(companies::handlers::handle_update_company),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handlers::handle_list_jobs).post(jobs::handlers::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handlers::handle_get_job)
                .patch(jobs::handlers::handle_update_job)
                .delete(jobs::handlers::handle_delete_job),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handlers::handle_list_applications),
        )
        .route(
            "/api/v1/applications/export.csv",
            get(applications::handlers::handle_export_csv),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handlers::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handlers::handle_update_status),
        )
        .route(
            "/api/v1/applications/:id/resume",
            get(applications::handlers::handle_resume_url),
        )
        .route(
            "/api/v1/applications/:id/calendar-links",
            post(calendar::handlers::handle_calendar_links),
        )
        // Evaluations
        .route(
            "/api/v1/applications/:id/evaluations",
            get(evaluation::handlers::handle_list_evaluations),
        )
        .route(
            "/api/v1/applications/:id/evaluation",
            put(evaluation::handlers::handle_upsert_evaluation)
                .delete(evaluation::handlers::handle_delete_evaluation),
        )
        // Scorecards
        .route(
            "/api/v1/scorecards",
            get(scorecards::handlers::handle_list_scorecards)
                .post(scorecards::handlers::handle_create_scorecard),
        )
        .route(
            "/api/v1/scorecards/:id",
            get(scorecards::handlers::handle_get_scorecard)
                .patch(scorecards::handlers::handle_update_scorecard)
                .delete(scorecards::handlers::handle_delete_scorecard),
        )
        // Settings
        .route(
            "/api/v1/branding",
            get(settings::handlers::handle_get_branding).put(settings::handlers::handle_put_branding),
        )
        .route(
            "/api/v1/cv-template",
            get(settings::handlers::handle_get_cv_template)
                .put(settings::handlers::handle_put_cv_template),
        )
        .route(
            "/api/v1/landing-page",
            get(settings::handlers::handle_get_landing_page)
                .put(settings::handlers::handle_put_landing_page),
        )
        .route(
            "/api/v1/consent-config",
            get(settings::handlers::handle_get_consent_config)
                .put(settings::handlers::handle_put_consent_config),
        )
        // Privacy (GDPR)
        .route("/api/v1/privacy/export", get(privacy::handlers::handle_export))
        .route(
            "/api/v1/privacy/deletion-requests",
            get(privacy::handlers::handle_list_deletion_requests)
                .post(privacy::handlers::handle_create_deletion_request),
        )
        .route(
            "/api/v1/privacy/deletion-requests/:id/process",
            post(privacy::handlers::handle_process_deletion),
        )
        .route(
            "/api/v1/privacy/deletion-requests/:id/reject",
            post(privacy::handlers::handle_reject_deletion),
        )
        // Activity
        .route("/api/v1/activity", get(activity::handlers::handle_list_activity))
        // Public careers surface
        .route(
            "/api/v1/public/companies/:slug/jobs",
            get(careers::handlers::handle_public_jobs),
        )
        .route(
            "/api/v1/public/companies/:slug/jobs.xml",
            get(careers::handlers::handle_indeed_feed),
        )
        .route(
            "/api/v1/public/companies/:slug/jobs/:job_id/apply",
            post(careers::handlers::handle_apply).layer(DefaultBodyLimit::max(APPLY_BODY_LIMIT)),
        )
        .route(
            "/api/v1/public/companies/:slug/widget",
            get(careers::handlers::handle_widget_config),
        )
        .route(
            "/api/v1/public/companies/:slug/landing-page",
            get(careers::handlers::handle_public_landing_page),
        )
        .route(
            "/api/v1/public/companies/:slug/consent",
            get(careers::handlers::handle_public_consent),
        )
        .route(
            "/api/v1/public/companies/:slug/deletion-requests",
            post(careers::handlers::handle_public_deletion_request),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::{BehaviorVersion, Region};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::auth::Claims;
    use crate::config::Config;

    const SECRET: &str = "router-test-secret";

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            session_jwt_secret: SECRET.to_string(),
            s3_bucket: "hirekit-test".to_string(),
            s3_endpoint: "http://127.0.0.1:1".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            port: 0,
            rust_log: "info".to_string(),
            run_migrations: false,
        };
        let db = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(100))
            .connect_lazy(&config.database_url)
            .unwrap();
        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        AppState {
            db,
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            config,
        }
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        build_router(test_state())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_session_is_401() {
        for path in [
            "/api/v1/me",
            "/api/v1/jobs",
            "/api/v1/applications",
            "/api/v1/applications/export.csv",
            "/api/v1/scorecards",
            "/api/v1/branding",
            "/api/v1/privacy/deletion-requests",
            "/api/v1/activity",
        ] {
            let request = Request::get(path).body(Body::empty()).unwrap();
            assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[tokio::test]
    async fn test_garbage_token_is_401() {
        let request = Request::get("/api/v1/jobs")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_401() {
        let claims = Claims {
            sub: "user_1".to_string(),
            email: None,
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"someone-else"),
        )
        .unwrap();
        let request = Request::get("/api/v1/company")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unauthorized_body_shape() {
        let request = Request::get("/api/v1/jobs").body(Body::empty()).unwrap();
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let request = Request::get("/api/v1/nope").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_public_json_is_400() {
        let request = Request::post("/api/v1/public/companies/acme/deletion-requests")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"reason":"no email"}"#))
            .unwrap();
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }
}
