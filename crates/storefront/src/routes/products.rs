//! Product route handlers.
//!
//! Anyone can browse; only sellers can create, replace, or delete listings.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use zaulimi_core::ProductId;

use super::json_body;
use crate::catalog::{CatalogError, Product, ProductDraft};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireSeller;
use crate::state::AppState;

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog().list().await)
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    Ok(Json(state.catalog().get(&id).await?))
}

/// `POST /api/products`
#[instrument(skip_all, fields(seller_id = %seller.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    payload: std::result::Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let draft = json_body(payload)?;
    let product = state.catalog().create(draft).await?;

    add_breadcrumb("catalog", "Created product", Some(&[("product_id", product.id.as_str())]));

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
#[instrument(skip_all, fields(seller_id = %seller.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ProductDraft>, JsonRejection>,
) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    let draft = json_body(payload)?;
    Ok(Json(state.catalog().update(&id, draft).await?))
}

/// `DELETE /api/products/{id}`
#[instrument(skip_all, fields(seller_id = %seller.id, product_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    state.catalog().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// An id that can't parse can't name a product.
fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw)
        .map_err(|_| AppError::Catalog(CatalogError::Invalid("Invalid product id".to_string())))
}
