//! Zaulimi24 Core - Shared domain types and the cart aggregate.
//!
//! This crate is used by both sides of the cart:
//! - `storefront` - The JSON API server (authoritative cart state)
//! - `client` - The HTTP client and client-side cart cache
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no locking,
//! no HTTP. The same [`Cart`] aggregate enforces the cart rules on the server
//! and when the client applies an optimistic update.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and roles
//! - [`cart`] - The cart aggregate and its wire summary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartError, CartSummary, LineItem, LineSummary, ProductSnapshot, SetQuantity};
pub use types::*;
