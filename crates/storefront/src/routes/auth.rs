//! Authentication route handlers.
//!
//! Registration and login answer with the user and a bearer token. Logout is
//! stateless: tokens are not revoked and simply run out.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use super::json_body;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration request body.
///
/// Missing fields deserialize as empty so they fail validation with a
/// specific message.
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response to a successful register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: User,
    pub token: String,
}

/// `POST /api/auth/register`
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let form = json_body(payload)?;

    let (user, issued) = AuthService::new(state.users(), state.tokens())
        .register(&form.name, &form.email, &form.password, form.role.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user,
            token: issued.token,
        }),
    ))
}

/// `POST /api/auth/login`
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let form = json_body(payload)?;
    if form.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    let (user, issued) = AuthService::new(state.users(), state.tokens())
        .login(&form.email, &form.password)
        .await
        .inspect_err(|_| tracing::info!("Failed login attempt"))?;

    add_breadcrumb("auth", "Logged in", None);
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful",
        user,
        token: issued.token,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logout successful" }))
}

/// `GET /api/auth/profile`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}
