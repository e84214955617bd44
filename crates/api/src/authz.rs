//! Route access checks.
//!
//! Every handler states its access level by calling one of these before
//! touching a service. Anonymous callers get 401; authenticated callers
//! whose role is outside the route's set get 403.

use axum::http::StatusCode;
use axum::response::Response;

use stockroom_auth::{AuthzError, Role, authorize};

use crate::app::errors;
use crate::context::CallerContext;

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const FORBIDDEN_MESSAGE: &str = "Forbidden resource";

/// Any valid token will do.
pub fn require_authenticated(caller: Option<&CallerContext>) -> Result<&CallerContext, Response> {
    caller.ok_or_else(|| errors::json_error(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))
}

/// A valid token whose role is in `required`.
pub fn require_roles<'a>(
    caller: Option<&'a CallerContext>,
    required: &[Role],
) -> Result<&'a CallerContext, Response> {
    let caller = require_authenticated(caller)?;
    authorize(Some(caller.role()), required).map_err(|e| forbidden(caller, e))?;
    Ok(caller)
}

fn forbidden(caller: &CallerContext, err: AuthzError) -> Response {
    tracing::info!(user_id = %caller.user_id(), reason = %err, "access denied");
    errors::json_error(StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE)
}
