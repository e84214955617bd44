use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;

use stockroom_products::ProductFilter;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub brand: Option<String>,
    pub category: Option<String>,
}

impl ListProductsQuery {
    pub fn filter(&self) -> ProductFilter {
        ProductFilter::new(self.brand.clone(), self.category.clone())
    }
}

// -------------------------
// Response mapping
// -------------------------

/// Success envelope: `{ "message": .., "data": .. }`.
pub fn envelope<T: Serialize>(status: StatusCode, message: &str, data: T) -> axum::response::Response {
    (status, axum::Json(json!({ "message": message, "data": data }))).into_response()
}

/// Success envelope without a payload.
pub fn message(status: StatusCode, message: &str) -> axum::response::Response {
    (status, axum::Json(json!({ "message": message }))).into_response()
}
