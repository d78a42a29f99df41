//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use zaulimi_core::{Email, Role, UserId};

/// A registered account.
///
/// The password hash lives only in the user store and never leaves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// Buyer or seller.
    pub role: Role,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}
