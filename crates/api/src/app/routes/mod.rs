use axum::{routing::get, Router};

pub mod auth;
pub mod products;
pub mod system;
pub mod users;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/products", products::router())
}
