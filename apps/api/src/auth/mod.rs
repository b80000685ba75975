//! Session verification and tenant lookup.
//!
//! The session provider issues HS256 JWTs whose `sub` is the provider's user
//! id. Handlers take a [`Session`] extractor; anything that fails to produce a
//! known user is rejected with 401 before the handler runs.

pub mod handlers;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use crate::errors::AppError;
use crate::models::company::CompanyRow;
use crate::models::user::User;
use crate::state::AppState;

const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

/// The authenticated staff user behind the current request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = verify_token(&token, &state.config.session_jwt_secret)?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE external_id = $1")
            .bind(&claims.sub)
            .fetch_optional(&state.db)
            .await?;

        match user {
            Some(user) => Ok(Session { user }),
            None => {
                debug!("Session subject {} has no user record", claims.sub);
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Pulls the session token from `Authorization: Bearer` or the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| {
            let (scheme, token) = auth.split_once(' ')?;
            scheme
                .eq_ignore_ascii_case("bearer")
                .then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected session token: {e}");
        AppError::Unauthorized
    })
}

/// Loads the company the user belongs to, or 404 if they have none yet.
pub async fn require_company(pool: &PgPool, user: &User) -> Result<CompanyRow, AppError> {
    let company_id = user
        .company_id
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

    sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
        .bind(company_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token_with_exp(exp: i64) -> String {
        let claims = Claims {
            sub: "user_123".to_string(),
            email: Some("recruiter@example.com".to_string()),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_bearer_scheme_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=tok123; other=1"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_basic_auth_is_not_a_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn test_verify_valid_token() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let claims = verify_token(&token_with_exp(exp), SECRET).unwrap();
        assert_eq!(claims.sub, "user_123");
    }

    #[test]
    fn test_verify_expired_token() {
        let exp = chrono::Utc::now().timestamp() - 3600;
        assert!(matches!(
            verify_token(&token_with_exp(exp), SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        assert!(verify_token(&token_with_exp(exp), "other-secret").is_err());
    }
}
