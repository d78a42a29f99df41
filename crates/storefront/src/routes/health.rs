//! Service surface: welcome, health, and the 404 fallback.

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

use crate::error::AppError;

/// `GET /`
pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to Zaulimi24 API" }))
}

/// Liveness health check endpoint.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now().to_rfc3339() }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
