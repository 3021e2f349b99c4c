//! `/todos` resource. Requests are dispatched by method.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extract::{JsonBody, QueryParams};
use crate::http::router::AppState;
use crate::model::Todo;

const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct ReadTodoRequest {
    #[serde(default)]
    pub prev_id: i64,
    pub size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ReadTodoResponse {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub subject: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub id: i64,
    pub subject: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub todo: Todo,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTodoRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct DeleteTodoResponse {}

pub async fn read_todos(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ReadTodoRequest>,
) -> Result<Json<ReadTodoResponse>, ApiError> {
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    let todos = state.todos.read(params.prev_id, size).await?;
    Ok(Json(ReadTodoResponse { todos }))
}

pub async fn create_todo(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    if body.subject.is_empty() {
        return Err(ApiError::BadRequest("subject must not be empty"));
    }

    let todo = state.todos.create(&body.subject, &body.description).await?;
    Ok(Json(TodoResponse { todo }))
}

pub async fn update_todo(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    if body.id == 0 {
        return Err(ApiError::BadRequest("id must not be zero"));
    }
    if body.subject.is_empty() {
        return Err(ApiError::BadRequest("subject must not be empty"));
    }

    let todo = state
        .todos
        .update(body.id, &body.subject, &body.description)
        .await?;
    Ok(Json(TodoResponse { todo }))
}

pub async fn delete_todos(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<DeleteTodoRequest>,
) -> Result<Json<DeleteTodoResponse>, ApiError> {
    if body.ids.is_empty() {
        return Err(ApiError::BadRequest("ids must not be empty"));
    }

    state.todos.delete(&body.ids).await?;
    Ok(Json(DeleteTodoResponse {}))
}
