use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use stockroom_auth::JwtValidator;

use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Optional bearer authentication.
///
/// A request whose bearer token verifies carries a [`CallerContext`]. A
/// missing, malformed, badly signed or expired token leaves the request
/// anonymous; handlers that need an identity answer 401 themselves.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(caller) = authenticate(&state, req.headers()) {
        req.extensions_mut().insert(caller);
    }
    next.run(req).await
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Option<CallerContext> {
    if !headers.contains_key(axum::http::header::AUTHORIZATION) {
        return None;
    }

    let token = match extract_bearer(headers) {
        Ok(token) => token,
        Err(_) => {
            tracing::debug!("malformed authorization header ignored");
            return None;
        }
    };

    match state.jwt.validate(token, Utc::now()) {
        Ok(claims) => Some(CallerContext::new(claims.principal())),
        Err(e) => {
            tracing::debug!(error = %e, "bearer token rejected");
            None
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
