use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use stockroom_core::ProductId;
use stockroom_products::{NewProduct, Page, ProductPatch};

use crate::app::dto::{self, ListProductsQuery};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::{self, ADMIN_ONLY};
use crate::context::{caller_ref, CallerContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product)
                .patch(update_product)
                .put(replace_product)
                .delete(delete_product),
        )
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require_roles(caller_ref(&caller), ADMIN_ONLY) {
        return res;
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.products.create(body).await {
        Ok(product) => dto::envelope(StatusCode::CREATED, "Product created successfully", product),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Public listing of active products.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListProductsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };
    let page = match Page::new(query.page, query.limit) {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(e.into()),
    };

    match services.products.find_all(query.filter(), page).await {
        Ok(products) => dto::envelope(StatusCode::OK, "Products retrieved successfully", products),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.products.find_one(id).await {
        Ok(product) => dto::envelope(StatusCode::OK, "Product retrieved successfully", product),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> axum::response::Response {
    apply_patch(&services, caller_ref(&caller), &id, body, "Product updated successfully").await
}

/// `PUT` shares `PATCH` semantics: absent fields are kept.
pub async fn replace_product(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> axum::response::Response {
    apply_patch(&services, caller_ref(&caller), &id, body, "Product replaced successfully").await
}

async fn apply_patch(
    services: &AppServices,
    caller: Option<&CallerContext>,
    raw_id: &str,
    body: Result<Json<ProductPatch>, JsonRejection>,
    success: &str,
) -> axum::response::Response {
    if let Err(res) = authz::require_roles(caller, ADMIN_ONLY) {
        return res;
    }
    let id: ProductId = match errors::parse_id(raw_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.products.update(id, patch).await {
        Ok(product) => dto::envelope(StatusCode::OK, success, product),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Soft delete; the product stays retrievable by id.
pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = authz::require_roles(caller_ref(&caller), ADMIN_ONLY) {
        return res;
    }
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.products.remove(id).await {
        Ok(product) => dto::envelope(StatusCode::OK, "Product deleted successfully", product),
        Err(e) => errors::service_error_to_response(e),
    }
}
