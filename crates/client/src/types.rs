//! Wire types returned by the API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use zaulimi_core::{Email, Price, ProductId, ProductSnapshot, Role, UserId};

/// `GET /api/health` body.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// A registered user as the API shows it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Register or login response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub category: String,
    pub unit: String,
    #[serde(default)]
    pub organic: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    /// The fields a cart line keeps.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            unit_price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
