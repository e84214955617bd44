//! Persistence boundary for users and products.
//!
//! Each store enforces its own uniqueness constraints atomically: a
//! colliding insert or update fails with [`StoreError::UniqueViolation`]
//! and leaves the stored state unchanged. Callers never pre-check.

pub mod in_memory;
pub mod postgres;

use thiserror::Error;

use stockroom_auth::{User, UserDraft};
use stockroom_core::{ProductId, UserId};
use stockroom_products::{Page, Product, ProductDraft, ProductFilter};

pub use in_memory::{InMemoryProductStore, InMemoryUserStore};
pub use postgres::{PostgresProductStore, PostgresUserStore};

/// Column protected by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Username,
    Email,
    Sku,
}

impl core::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UniqueField::Username => write!(f, "username"),
            UniqueField::Email => write!(f, "email"),
            UniqueField::Sku => write!(f, "sku"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    UniqueViolation(UniqueField),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account; the store assigns the id.
    async fn insert(&self, draft: UserDraft) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Exact, case-sensitive username match.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// All accounts ordered by id.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Case-insensitive substring match on username, ordered by id.
    async fn search_by_username(&self, fragment: &str) -> Result<Vec<User>, StoreError>;

    /// Replace the stored row with the same id. `Ok(None)` when it does not
    /// exist.
    async fn update(&self, user: User) -> Result<Option<User>, StoreError>;

    /// Set the active flag. `Ok(None)` when the account does not exist.
    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>, StoreError>;

    /// Physically remove the account. `Ok(false)` when it does not exist.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product; the store assigns the id.
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError>;

    /// Lookup by id, including soft-deleted rows.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Lookup by sku, including soft-deleted rows.
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    /// Active products matching `filter`, ordered by id, one page.
    async fn list(&self, filter: &ProductFilter, page: Page) -> Result<Vec<Product>, StoreError>;

    /// Replace the stored row with the same id. `Ok(None)` when it does not
    /// exist.
    async fn update(&self, product: Product) -> Result<Option<Product>, StoreError>;

    /// Set `is_active = false`. `Ok(None)` when the product does not exist.
    async fn soft_delete(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
}
