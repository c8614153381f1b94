//! Request size guard for the REST API
//!
//! Requests that declare a `Content-Length` above the configured limit are
//! answered with 413 before any handler touches the body. Bodies without a
//! declared length are bounded by axum's `DefaultBodyLimit` instead, which the
//! router sets to the same value.

use super::error_response::localized;
use crate::config::Locale;
use crate::error::Error;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

/// State for [`reject_oversized_body`]
#[derive(Clone, Copy, Debug)]
pub struct BodyLimit {
    /// Largest accepted body in bytes
    pub max_bytes: u64,
    /// Language of the 413 message
    pub locale: Locale,
}

/// Middleware that rejects requests whose declared body size exceeds the limit
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use konversi_data::api::body_limit::{BodyLimit, reject_oversized_body};
/// use konversi_data::config::Locale;
///
/// let limit = BodyLimit { max_bytes: 1024, locale: Locale::English };
/// let router: Router = Router::new()
///     .layer(middleware::from_fn_with_state(limit, reject_oversized_body));
/// ```
pub async fn reject_oversized_body(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    match declared {
        Some(size) if size > limit.max_bytes => localized(
            Error::PayloadTooLarge {
                size: Some(size),
                limit: limit.max_bytes,
            },
            limit.locale,
        ),
        _ => next.run(request).await,
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::post,
    };
    use tower::ServiceExt; // for oneshot

    async fn echo_len(body: axum::body::Bytes) -> String {
        body.len().to_string()
    }

    fn app(max_bytes: u64) -> Router {
        Router::new().route("/upload", post(echo_len)).layer(middleware::from_fn_with_state(
            BodyLimit {
                max_bytes,
                locale: Locale::English,
            },
            reject_oversized_body,
        ))
    }

    #[tokio::test]
    async fn test_body_within_limit_passes() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-length", "5")
            .body(Body::from("hello"))
            .unwrap();

        let response = app(10).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-length", "11")
            .body(Body::from("hello world"))
            .unwrap();

        let response = app(10).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "payload_too_large");
        assert_eq!(json["error"]["details"]["size_bytes"], 11);
        assert_eq!(json["error"]["details"]["limit_bytes"], 10);
    }

    #[tokio::test]
    async fn test_missing_length_passes_through() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::empty())
            .unwrap();

        let response = app(10).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
