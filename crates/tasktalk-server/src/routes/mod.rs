pub mod auth;
pub mod chat;
pub mod todos;

use axum::http::{header, HeaderMap, StatusCode};
use axum::{Json, Router};
use serde::Serialize;

use tasktalk_schema::User;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/todos", todos::router())
        .nest("/chat", chat::router())
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub(crate) fn internal_error(err: impl std::fmt::Display) -> ApiError {
    tracing::error!("internal error: {err}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

/// Pull the bearer token out of the Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the request's bearer token to a user, or fail with 401.
pub(crate) async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "missing bearer token"))?;

    let user_id = state
        .tokens
        .verify(token)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "invalid or expired token"))?;

    state
        .users
        .find_user(&user_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "invalid or expired token"))
}
