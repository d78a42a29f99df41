//! Zaulimi24 API client.
//!
//! [`ApiClient`] is a typed wrapper over the JSON API. [`CartCache`] keeps a
//! local copy of the signed-in user's cart that updates optimistically and
//! always converges on what the server says.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod api;
mod cache;
mod error;
mod types;

pub use api::ApiClient;
pub use cache::CartCache;
pub use error::ClientError;
pub use types::{AuthSession, Health, Product, UserProfile};
