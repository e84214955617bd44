use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use stockroom_auth::{CreateUser, UserPatch};
use stockroom_core::UserId;

use crate::app::dto::{self, SearchQuery};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::{self, ADMIN_ONLY};
use crate::context::{caller_ref, CallerContext};

pub const NO_USERS_FOUND: &str = "No users found with the given username";

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/search", get(search_users))
        .route(
            "/:id",
            get(get_user)
                .patch(update_user)
                .put(replace_user)
                .delete(delete_user),
        )
        .route("/:id/activate", patch(activate_user))
        .route("/:id/deactivate", patch(deactivate_user))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    body: Result<Json<CreateUser>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require_roles(caller_ref(&caller), ADMIN_ONLY) {
        return res;
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.users.create(body).await {
        Ok(user) => dto::envelope(StatusCode::CREATED, "User created successfully", user),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
) -> axum::response::Response {
    if let Err(res) = authz::require_roles(caller_ref(&caller), ADMIN_ONLY) {
        return res;
    }

    match services.users.list().await {
        Ok(users) => dto::envelope(StatusCode::OK, "Users retrieved successfully", users),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search_users(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require_authenticated(caller_ref(&caller)) {
        return res;
    }
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };
    let Some(fragment) = query.username.filter(|u| !u.trim().is_empty()) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "username query parameter is required");
    };

    match services.users.search_by_username(&fragment).await {
        Ok(users) if users.is_empty() => errors::json_error(StatusCode::NOT_FOUND, NO_USERS_FOUND),
        Ok(users) => dto::envelope(StatusCode::OK, "Users found successfully", users),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = authz::require_authenticated(caller_ref(&caller)) {
        return res;
    }
    let id: UserId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.users.find_by_id(id).await {
        Ok(user) => dto::envelope(StatusCode::OK, "User retrieved successfully", user),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> axum::response::Response {
    apply_patch(&services, caller_ref(&caller), &id, body, "User updated successfully").await
}

/// `PUT` shares `PATCH` semantics: absent fields are kept.
pub async fn replace_user(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> axum::response::Response {
    apply_patch(&services, caller_ref(&caller), &id, body, "User replaced successfully").await
}

async fn apply_patch(
    services: &AppServices,
    caller: Option<&CallerContext>,
    raw_id: &str,
    body: Result<Json<UserPatch>, JsonRejection>,
    success: &str,
) -> axum::response::Response {
    let caller = match authz::require_authenticated(caller) {
        Ok(c) => c,
        Err(res) => return res,
    };
    let id: UserId = match errors::parse_id(raw_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    // Non-admins may edit their own profile fields only.
    if !caller.is_admin() && (!caller.principal().is_self(id) || patch.touches_privileged_fields()) {
        tracing::info!(user_id = %caller.user_id(), target = %id, "user update denied");
        return errors::json_error(StatusCode::FORBIDDEN, authz::FORBIDDEN_MESSAGE);
    }

    match services.users.update(id, patch).await {
        Ok(user) => dto::envelope(StatusCode::OK, success, user),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = authz::require_roles(caller_ref(&caller), ADMIN_ONLY) {
        return res;
    }
    let id: UserId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.users.remove(id).await {
        Ok(()) => dto::message(StatusCode::OK, "User deleted successfully"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(&services, caller_ref(&caller), &id, true).await
}

pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    caller: Option<Extension<CallerContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(&services, caller_ref(&caller), &id, false).await
}

async fn set_active(
    services: &AppServices,
    caller: Option<&CallerContext>,
    raw_id: &str,
    active: bool,
) -> axum::response::Response {
    if let Err(res) = authz::require_roles(caller, ADMIN_ONLY) {
        return res;
    }
    let id: UserId = match errors::parse_id(raw_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let result = if active {
        services.users.activate(id).await
    } else {
        services.users.deactivate(id).await
    };
    match result {
        Ok(user) if active => dto::envelope(StatusCode::OK, "User activated successfully", user),
        Ok(user) => dto::envelope(StatusCode::OK, "User deactivated successfully", user),
        Err(e) => errors::service_error_to_response(e),
    }
}
