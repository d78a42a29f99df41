//! Authentication error types.

use thiserror::Error;

use zaulimi_core::{EmailError, RoleError};

use crate::store::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Name missing or blank.
    #[error("name is required")]
    InvalidName,

    /// Role is neither buyer nor seller.
    #[error("invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token names a user that no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No bearer token on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// Token is malformed or its signature does not match.
    #[error("invalid token")]
    InvalidToken,

    /// Token signature is valid but it has expired.
    #[error("token expired")]
    TokenExpired,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be produced.
    #[error("token encoding error")]
    TokenEncoding,

    /// User store error.
    #[error("store error: {0}")]
    Repository(#[from] RepositoryError),
}
