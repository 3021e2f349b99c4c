//! Attaches the caller's operating system family to the request context.

use axum::{extract::Request, http::header, middleware::Next, response::Response};

use crate::http::context::RequestContext;
use crate::http::user_agent::OsFamily;

pub async fn inject_os_context(mut request: Request, next: Next) -> Response {
    let os = OsFamily::from_header(
        request
            .headers()
            .get(header::USER_AGENT)
            .map(|value| value.as_bytes()),
    );
    RequestContext::new(os).attach(&mut request);

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn echo_os(request: Request) -> String {
        RequestContext::of(&request)
            .map(|ctx| ctx.os().to_string())
            .unwrap_or_else(|| "missing".to_string())
    }

    async fn os_for(user_agent: Option<&str>) -> String {
        let app = Router::new()
            .route("/", get(echo_os))
            .layer(middleware::from_fn(inject_os_context));

        let mut builder = Request::builder().uri("/");
        if let Some(ua) = user_agent {
            builder = builder.header(header::USER_AGENT, ua);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn parsed_os_reaches_handler() {
        let os = os_for(Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")).await;
        assert_eq!(os, "Windows");
    }

    #[tokio::test]
    async fn absent_header_yields_placeholder_not_missing() {
        assert_eq!(os_for(None).await, "unknown");
    }
}
