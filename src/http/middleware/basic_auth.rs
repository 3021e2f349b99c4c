//! HTTP Basic authentication for individual routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::BasicAuthConfig;
use crate::observability::metrics;

/// The expected credential pair and the realm used in challenges.
pub struct Credentials {
    user_id: String,
    password: String,
    challenge: HeaderValue,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>, realm: &str) -> Self {
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
            .unwrap_or_else(|_| HeaderValue::from_static("Basic realm=\"Restricted\""));
        Self {
            user_id: user_id.into(),
            password: password.into(),
            challenge,
        }
    }

    pub fn from_config(config: &BasicAuthConfig) -> Self {
        Self::new(&config.user_id, &config.password, &config.realm)
    }

    /// Both fields are compared in full, whatever the first comparison says.
    fn matches(&self, user_id: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(user_id.as_bytes(), self.user_id.as_bytes());
        let password_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        user_ok & password_ok
    }
}

pub async fn require_basic_auth(
    State(credentials): State<Arc<Credentials>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = parse_basic_auth(request.headers())
        .map(|(user_id, password)| credentials.matches(&user_id, &password))
        .unwrap_or(false);

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Basic authentication failed");
    metrics::record_auth_rejected();
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, credentials.challenge.clone())],
        "Unauthorized",
    )
        .into_response()
}

/// Extract `(user, password)` from an `Authorization: Basic ...` header.
///
/// The scheme is matched case-insensitively and the password may itself
/// contain `:`.
fn parse_basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user_id, password) = decoded.split_once(':')?;
    Some((user_id.to_string(), password.to_string()))
}

/// Compare without an early exit on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn encode(user: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
    }

    fn app(hits: Arc<AtomicUsize>) -> Router {
        let credentials = Arc::new(Credentials::new("alice", "s3cret", "Restricted"));
        Router::new()
            .route(
                "/",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "secret stuff"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(credentials, require_basic_auth))
    }

    async fn call(hits: Arc<AtomicUsize>, authorization: Option<&str>) -> Response {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app(hits)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn correct_credentials_reach_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = call(hits.clone(), Some(&encode("alice", "s3cret"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejections_never_reach_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cases = [
            None,
            Some(encode("mallory", "s3cret")),
            Some(encode("alice", "wrong")),
            Some("Bearer abc".to_string()),
            Some("Basic !!!not-base64".to_string()),
        ];

        for authorization in cases {
            let response = call(hits.clone(), authorization.as_deref()).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers()[header::WWW_AUTHENTICATE],
                "Basic realm=\"Restricted\""
            );
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn parses_scheme_case_insensitively_and_keeps_colons() {
        let mut headers = HeaderMap::new();
        let value = format!("basic {}", STANDARD.encode("bob:pa:ss"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        assert_eq!(
            parse_basic_auth(&headers),
            Some(("bob".to_string(), "pa:ss".to_string()))
        );
    }

    #[test]
    fn constant_time_eq_checks_length_and_content() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
