//! Request extractors that reject with `AppError` instead of axum's plain-text rejections.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// JSON body; malformed or mistyped payloads become 400 `VALIDATION_ERROR`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);

/// Query string, same rejection shape as [`ValidJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        rating: i16,
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_type_mismatch_is_validation_error() {
        let err = ValidJson::<Payload>::from_request(json_request(r#"{"rating":"high"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_missing_field_and_syntax_error() {
        let err = ValidJson::<Payload>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = ValidJson::<Payload>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_without_content_type_is_rejected() {
        let request = Request::post("/").body(Body::from(r#"{"rating":3}"#)).unwrap();
        let err = ValidJson::<Payload>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_json_accepts_valid_body() {
        let ValidJson(payload) = ValidJson::<Payload>::from_request(json_request(r#"{"rating":3}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.rating, 3);
    }

    #[tokio::test]
    async fn test_bad_query_is_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Paging {
            #[allow(dead_code)]
            limit: Option<i64>,
        }
        let (mut parts, _) = Request::get("/?limit=lots").body(()).unwrap().into_parts();
        let err = ValidQuery::<Paging>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
