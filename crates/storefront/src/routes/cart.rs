//! Cart route handlers.
//!
//! Every handler works on the cart of the user named by the bearer token and
//! answers with the full cart, so clients can replace their local copy.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use zaulimi_core::CartSummary;

use super::json_body;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Add-to-cart request body.
///
/// Fields stay untyped until validated so that a missing or non-numeric
/// value is a 400 with a useful message rather than a deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<Value>,
    pub quantity: Option<Value>,
}

/// Update-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: Option<Value>,
}

/// `GET /api/cart`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<CartSummary> {
    Json(state.carts().get_cart(user.id).await)
}

/// `POST /api/cart/items`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    payload: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartSummary>> {
    let body = json_body(payload)?;

    let invalid = || {
        AppError::Validation(
            "Invalid productId or quantity. Quantity must be a positive number.".to_string(),
        )
    };
    let product_id = body.product_id.as_ref().and_then(product_id_text).ok_or_else(invalid)?;
    let quantity = body.quantity.as_ref().and_then(whole_number).ok_or_else(invalid)?;

    let cart = state.carts().add_item(user.id, &product_id, quantity).await?;

    add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));

    Ok(Json(cart))
}

/// `PUT /api/cart/items/{productId}`
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<String>,
    payload: std::result::Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<CartSummary>> {
    let body = json_body(payload)?;
    let quantity = body.quantity.as_ref().and_then(whole_number).ok_or_else(|| {
        AppError::Validation("quantity is required and must be a number".to_string())
    })?;

    let cart = state.carts().update_item(user.id, &product_id, quantity).await?;

    add_breadcrumb("cart", "Updated quantity", Some(&[("product_id", product_id.as_str())]));

    Ok(Json(cart))
}

/// `DELETE /api/cart/items/{productId}`
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<String>,
) -> Json<CartSummary> {
    add_breadcrumb("cart", "Removed item", Some(&[("product_id", product_id.as_str())]));
    Json(state.carts().remove_item(user.id, &product_id).await)
}

/// `DELETE /api/cart`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<CartSummary> {
    add_breadcrumb("cart", "Cleared cart", None);
    Json(state.carts().clear_cart(user.id).await)
}

/// A product id sent as a JSON string or number.
fn product_id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An integer sent as a JSON number or numeric string. Fractions are rejected.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
