use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use stockroom_auth::CreateUser;

use crate::app::dto::{self, LoginRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{caller_ref, CallerContext};

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.auth.login(&body.username, &body.password).await {
        Ok(session) => dto::envelope(StatusCode::OK, "Login successful", session),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CreateUser>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.auth.register(body).await {
        Ok(user) => dto::envelope(StatusCode::CREATED, "User registered successfully", user),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
) -> axum::response::Response {
    let caller = match authz::require_authenticated(caller_ref(&caller)) {
        Ok(c) => c,
        Err(res) => return res,
    };

    match services.users.find_by_id(caller.user_id()).await {
        Ok(user) => dto::envelope(StatusCode::OK, "User retrieved successfully", user),
        Err(e) => errors::service_error_to_response(e),
    }
}
