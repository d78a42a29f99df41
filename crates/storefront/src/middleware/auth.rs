//! Authentication extractors.
//!
//! Handlers take [`RequireUser`] or [`RequireSeller`] to demand a verified
//! bearer token. The cart owner is always the token's user; nothing a client
//! puts in a path or body can name a different owner.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 if the `Authorization` header is missing, malformed,
/// expired, or names a user that no longer exists.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_cart(
///     State(state): State<AppState>,
///     RequireUser(user): RequireUser,
/// ) -> Result<Json<CartSummary>> {
///     Ok(Json(state.carts().get_cart(user.id).await))
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;

        let user = AuthService::new(state.users(), state.tokens())
            .authenticate(token)
            .await
            .map_err(|e| match e {
                // A deleted account's token is just an invalid token.
                AuthError::UserNotFound => AuthError::InvalidToken,
                other => other,
            })?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", user.id.as_i32());

        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token for a seller.
///
/// Rejects with 401 like [`RequireUser`], and with 403 if the user is a buyer.
pub struct RequireSeller(pub User);

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.role.can_manage_products() {
            return Err(AppError::Forbidden(
                "Only sellers can manage products".to_string(),
            ));
        }

        Ok(Self(user))
    }
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
