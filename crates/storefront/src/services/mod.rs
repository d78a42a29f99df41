//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, and bearer tokens
//! - `cart` - Per-owner cart operations backed by the product catalog

pub mod auth;
pub mod cart;
