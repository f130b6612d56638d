use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tasktalk_auth::{generate_salt, hash_password, verify_password};
use tasktalk_memory::StoreError;
use tasktalk_schema::User;

use crate::state::AppState;

use super::{api_error, authenticate, bearer_token, internal_error, ApiError};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserBody {
    pub id: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct SessionBody {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserBody,
    pub session: SessionBody,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid email"));
    }
    if body.password.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "password must not be empty"));
    }

    let salt = generate_salt();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.clone(),
        password_hash: hash_password(&body.password, &salt),
        salt,
        created_at: Utc::now(),
    };

    let user = match state.users.create_user(user).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => {
            return Err(api_error(StatusCode::CONFLICT, "email already registered"))
        }
        Err(err) => return Err(internal_error(err)),
    };

    let issued = state.tokens.issue(&user.id).await.map_err(internal_error)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserBody {
                id: user.id,
                email: user.email,
            },
            session: SessionBody {
                token: issued.token,
                expires_at: issued.expires_at,
            },
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = body.email.trim().to_lowercase();
    let user = state
        .users
        .find_user_by_email(&email)
        .await
        .map_err(internal_error)?;

    // One rejection message for both unknown email and bad password.
    let Some(user) = user else {
        return Err(api_error(StatusCode::UNAUTHORIZED, "invalid email or password"));
    };
    if !verify_password(&body.password, &user.salt, &user.password_hash) {
        return Err(api_error(StatusCode::UNAUTHORIZED, "invalid email or password"));
    }

    let issued = state.tokens.issue(&user.id).await.map_err(internal_error)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        user: UserBody {
            id: user.id,
            email: user.email,
        },
        session: SessionBody {
            token: issued.token,
            expires_at: issued.expires_at,
        },
    }))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "missing bearer token"))?;
    let revoked = state.tokens.revoke(token).await.map_err(internal_error)?;
    Ok(Json(LogoutResponse { revoked }))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserBody>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    Ok(Json(UserBody {
        id: user.id,
        email: user.email,
    }))
}
