//! In-process stores for storefront state.
//!
//! Nothing here is persisted. Each store is an explicitly owned value held by
//! [`AppState`](crate::state::AppState), so every test can start from a
//! fresh, isolated store.
//!
//! - `users` - Registered accounts and their password hashes
//! - `carts` - One cart per owner, each behind its own lock

pub mod carts;
pub mod users;

pub use carts::CartStore;
pub use users::UserStore;

use thiserror::Error;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The id sequence ran out.
    #[error("id space exhausted")]
    IdsExhausted,
}
