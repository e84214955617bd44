//! Application services: validation, defaults, hashing and token issuance
//! on top of the stores.

pub mod auth;
pub mod error;
pub mod products;
pub mod users;

pub use auth::{AuthService, Session, SessionUser};
pub use error::{ServiceError, conflict_message};
pub use products::ProductService;
pub use users::UserService;
