use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentUser;
use crate::api::validation::{validate_password_len, validate_username};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserCreate, UserLogin, UserResponse};

/// Max attempts per window for signup and login.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_username(&payload.username)?;
    enforce_rate_limit(&state, "signup", &payload.username).await?;
    validate_password_len(&payload.password)?;

    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::BadRequest("Full name is required".to_string()));
    }

    let existing = repositories::users::exists_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing {
        return Err(ApiError::Conflict("User with this username already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            hashed_password,
            full_name,
            is_active: true,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("User with this username already exists".to_string())
        }
        _ => ApiError::internal(e, "Failed to create user"),
    })?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(issue_token(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_username(&payload.username)?;
    enforce_rate_limit(&state, "login", &payload.username).await?;

    let user = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    Ok(Json(issue_token(&state, user)?))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn enforce_rate_limit(state: &AppState, action: &str, username: &str) -> Result<(), ApiError> {
    let rate_key = format!("rl:{action}:{username}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests("Too many attempts, try again later"))
    }
}

fn issue_token(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;
    Ok(TokenResponse::bearer(token, UserResponse::from_db(user)))
}

#[cfg(test)]
mod tests;
