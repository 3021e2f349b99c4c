//! Route table.
//!
//! | Path        | Auth  | Handler                               |
//! |-------------|-------|---------------------------------------|
//! | `/healthz`  | none  | slow health probe                     |
//! | `/todos`    | Basic | TODO CRUD, dispatched by method       |
//! | `/do-panic` | none  | panics on purpose                     |
//! | `/test-os`  | none  | echoes the detected OS                |

use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::http::handlers;
use crate::http::middleware::{require_basic_auth, Credentials};
use crate::service::TodoService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
    pub health_delay_ms: u64,
}

/// Build the route table. Basic auth guards `/todos` only.
pub fn build_router(state: AppState, credentials: Arc<Credentials>, max_body_size: usize) -> Router {
    let todos = get(handlers::read_todos)
        .post(handlers::create_todo)
        .put(handlers::update_todo)
        .delete(handlers::delete_todos)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(middleware::from_fn_with_state(credentials, require_basic_auth));

    Router::new()
        .route("/healthz", any(handlers::healthz))
        .route("/todos", todos)
        .route("/do-panic", any(handlers::do_panic))
        .route("/test-os", any(handlers::test_os))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;
    use axum::{
        body::Body,
        extract::Request,
        http::{header, Method, StatusCode},
        response::Response,
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use tower::ServiceExt;

    async fn router() -> Router {
        let pool = store::open_in_memory().await.unwrap();
        let state = AppState {
            todos: TodoService::new(pool),
            health_delay_ms: 0,
        };
        build_router(
            state,
            Arc::new(Credentials::new("user", "pass", "Restricted")),
            64 * 1024,
        )
    }

    fn authorized(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode("user:pass")),
            );
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let response = router()
            .await
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!({ "message": "OK" }));
    }

    #[tokio::test]
    async fn todos_require_auth() {
        let response = router()
            .await
            .oneshot(Request::builder().uri("/todos").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn todo_crud_round() {
        let app = router().await;

        let created = app
            .clone()
            .oneshot(authorized(
                Method::POST,
                "/todos",
                Some(serde_json::json!({ "subject": "write tests", "description": "" })),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::OK);
        let created = json(created).await;
        assert_eq!(created["todo"]["subject"], "write tests");
        let id = created["todo"]["id"].as_i64().unwrap();

        let updated = app
            .clone()
            .oneshot(authorized(
                Method::PUT,
                "/todos",
                Some(serde_json::json!({ "id": id, "subject": "write more tests" })),
            ))
            .await
            .unwrap();
        assert_eq!(json(updated).await["todo"]["subject"], "write more tests");

        let listed = app
            .clone()
            .oneshot(authorized(Method::GET, "/todos?size=10", None))
            .await
            .unwrap();
        assert_eq!(json(listed).await["todos"].as_array().unwrap().len(), 1);

        let deleted = app
            .clone()
            .oneshot(authorized(
                Method::DELETE,
                "/todos",
                Some(serde_json::json!({ "ids": [id] })),
            ))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let deleted_again = app
            .oneshot(authorized(
                Method::DELETE,
                "/todos",
                Some(serde_json::json!({ "ids": [id] })),
            ))
            .await
            .unwrap();
        assert_eq!(deleted_again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_todo_requests_are_bad_requests() {
        let app = router().await;

        let cases = [
            (Method::POST, serde_json::json!({ "subject": "" })),
            (Method::PUT, serde_json::json!({ "id": 0, "subject": "x" })),
            (Method::DELETE, serde_json::json!({ "ids": [] })),
        ];
        for (method, body) in cases {
            let response = app
                .clone()
                .oneshot(authorized(method.clone(), "/todos", Some(body)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method}");
        }
    }

    fn authorized_raw(method: Method, uri: &str, body: &'static str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode("user:pass")),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn body_is_decoded_without_content_type() {
        let response = router()
            .await
            .oneshot(authorized_raw(Method::POST, "/todos", r#"{"subject":"no header"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["todo"]["subject"], "no header");
    }

    #[tokio::test]
    async fn malformed_input_gets_json_error() {
        let app = router().await;
        let cases = [
            authorized_raw(Method::POST, "/todos", "{not json"),
            authorized_raw(Method::PUT, "/todos", r#"{"subject":"missing id"}"#),
            authorized_raw(Method::DELETE, "/todos", r#"{"ids":"1,2"}"#),
            authorized_raw(Method::GET, "/todos?prev_id=abc", ""),
        ];

        for request in cases {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "application/json"
            );
            assert!(json(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/todos")
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode("user:pass")),
            )
            .body(Body::from(vec![b' '; 128 * 1024]))
            .unwrap();
        let response = router().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn update_of_missing_todo_is_not_found() {
        let response = router()
            .await
            .oneshot(authorized(
                Method::PUT,
                "/todos",
                Some(serde_json::json!({ "id": 99, "subject": "ghost" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_os_without_context_is_500() {
        let response = router()
            .await
            .oneshot(Request::builder().uri("/test-os").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
