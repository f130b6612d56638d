use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tasktalk_schema::{NewTodo, Todo, TodoFilter, TodoPatch};

use crate::state::AppState;

use super::{api_error, authenticate, internal_error, ApiError};

#[derive(Serialize)]
pub struct TodoBody {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: i64,
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Todo> for TodoBody {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            priority: todo.priority,
            due_date: todo.due_date,
            created_at: todo.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub completed: Option<bool>,
    pub priority: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub due_date: Option<String>,
}

fn default_priority() -> i64 {
    3
}

#[derive(Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/{id}", get(get_todo).put(update_todo).delete(delete_todo))
}

fn check_priority(priority: i64) -> Result<(), ApiError> {
    if (1..=5).contains(&priority) {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::BAD_REQUEST,
            "priority must be between 1 and 5",
        ))
    }
}

async fn list_todos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TodoBody>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let filter = TodoFilter {
        completed: query.completed,
        priority: query.priority,
    };
    let todos = state
        .todos
        .list_todos(&user.id, &filter)
        .await
        .map_err(internal_error)?;
    Ok(Json(todos.into_iter().map(TodoBody::from).collect()))
}

async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoBody>), ApiError> {
    let user = authenticate(&state, &headers).await?;

    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "title must not be empty"));
    }
    check_priority(body.priority)?;

    let todo = state
        .todos
        .insert_todo(NewTodo {
            title,
            description: body.description,
            completed: false,
            priority: body.priority,
            due_date: body.due_date,
            user_id: user.id,
        })
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(todo.into())))
}

async fn get_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<TodoBody>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let todo = state
        .todos
        .find_todo(&user.id, id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "todo not found"))?;
    Ok(Json(todo.into()))
}

async fn update_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTodoRequest>,
) -> Result<Json<TodoBody>, ApiError> {
    let user = authenticate(&state, &headers).await?;

    if let Some(priority) = body.priority {
        check_priority(priority)?;
    }
    let patch = TodoPatch {
        title: body.title,
        description: body.description,
        completed: body.completed,
        priority: body.priority,
        due_date: body.due_date,
    };
    if patch.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "no fields to update"));
    }

    let todo = state
        .todos
        .update_todo(&user.id, id, &patch)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "todo not found"))?;
    Ok(Json(todo.into()))
}

async fn delete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let deleted = state
        .todos
        .delete_todo(&user.id, id)
        .await
        .map_err(internal_error)?;
    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "todo not found"));
    }
    Ok(Json(DeleteResponse { deleted }))
}
