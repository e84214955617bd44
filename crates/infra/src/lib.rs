//! Infrastructure layer: configuration, database, stores and services.

pub mod config;
pub mod db;
pub mod services;
pub mod store;

pub use config::{AdminSeed, AppConfig, ConfigError, DatabaseConfig, JwtConfig};
pub use services::{AuthService, ProductService, ServiceError, Session, UserService};
pub use store::{ProductStore, StoreError, UniqueField, UserStore};
