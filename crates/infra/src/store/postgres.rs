//! Postgres-backed user and product stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation on `users_username_key`) | `23505` | `UniqueViolation(Username)` |
//! | Database (unique violation on `users_email_key`) | `23505` | `UniqueViolation(Email)` |
//! | Database (unique violation on `products_sku_key`) | `23505` | `UniqueViolation(Sku)` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / Tls / other | N/A | `Backend` |

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use stockroom_auth::{Role, User, UserDraft};
use stockroom_core::{ProductId, UserId};
use stockroom_products::{Page, Product, ProductDraft, ProductFilter};

use super::{ProductStore, StoreError, UniqueField, UserStore};

const USER_COLUMNS: &str = "id, username, email, password, role, is_active, created_at";
const PRODUCT_COLUMNS: &str =
    "id, sku, name, brand, quantity, price, is_active, category, image_url, created_at";

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, draft), fields(username = %draft.username), err)]
    async fn insert(&self, draft: UserDraft) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, password, role, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&draft.username)
        .bind(&draft.email)
        .bind(&draft.password_hash)
        .bind(draft.role.as_str())
        .bind(draft.is_active)
        .bind(draft.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        user_from_row(&row)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_username", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn search_by_username(&self, fragment: &str) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username ILIKE $1 ESCAPE '\'
            ORDER BY id ASC
            "#
        ))
        .bind(format!("%{}%", escape_like(fragment)))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update(&self, user: User) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET username = $2, email = $3, password = $4, role = $5, is_active = $6
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id.get())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_active = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.get())
        .bind(is_active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_user_active", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, draft), fields(sku = %draft.sku), err)]
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (sku, name, brand, quantity, price, is_active, category, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&draft.sku)
        .bind(&draft.name)
        .bind(&draft.brand)
        .bind(draft.quantity)
        .bind(draft.price)
        .bind(draft.is_active)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(draft.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product_by_id", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"))
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product_by_sku", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(
        skip(self, filter),
        fields(brand = ?filter.brand, category = ?filter.category, page = page.page(), limit = page.limit()),
        err
    )]
    async fn list(&self, filter: &ProductFilter, page: Page) -> Result<Vec<Product>, StoreError> {
        let offset = i64::try_from(page.offset())
            .map_err(|_| StoreError::Backend("page offset out of range".to_string()))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = TRUE
                AND ($1::text IS NULL OR brand = $1)
                AND ($2::text IS NULL OR category = $2)
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.brand.as_deref())
        .bind(filter.category.as_deref())
        .bind(i64::from(page.limit()))
        .bind(offset)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update(&self, product: Product) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET sku = $2, name = $3, brand = $4, quantity = $5, price = $6,
                is_active = $7, category = $8, image_url = $9
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.get())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.quantity)
        .bind(product.price)
        .bind(product.is_active)
        .bind(&product.category)
        .bind(&product.image_url)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn soft_delete(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE products SET is_active = FALSE WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("soft_delete_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }
}

/// Escape `LIKE` metacharacters so the fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unique_field_for(constraint: &str) -> Option<UniqueField> {
    match constraint {
        "users_username_key" => Some(UniqueField::Username),
        "users_email_key" => Some(UniqueField::Email),
        "products_sku_key" => Some(UniqueField::Sku),
        _ => None,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                if let Some(field) = db_err.constraint().and_then(unique_field_for) {
                    return StoreError::UniqueViolation(field);
                }
            }
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            role: row.try_get("role")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|e| StoreError::Backend(format!("user {} has invalid role: {}", row.id, e)))?;
        Ok(User {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    UserRow::from_row(row)
        .map_err(|e| StoreError::Backend(format!("failed to decode user row: {}", e)))?
        .try_into()
}

#[derive(Debug)]
struct ProductRow {
    id: i64,
    sku: String,
    name: String,
    brand: String,
    quantity: i32,
    price: Decimal,
    is_active: bool,
    category: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            brand: row.try_get("brand")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            is_active: row.try_get("is_active")?,
            category: row.try_get("category")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            quantity: row.quantity,
            price: row.price,
            is_active: row.is_active,
            category: row.category,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    ProductRow::from_row(row)
        .map(Product::from)
        .map_err(|e| StoreError::Backend(format!("failed to decode product row: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("jo_hn%"), r"jo\_hn\%");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn known_constraints_map_to_fields() {
        assert_eq!(unique_field_for("users_username_key"), Some(UniqueField::Username));
        assert_eq!(unique_field_for("users_email_key"), Some(UniqueField::Email));
        assert_eq!(unique_field_for("products_sku_key"), Some(UniqueField::Sku));
        assert_eq!(unique_field_for("events_pkey"), None);
    }

    #[test]
    fn non_database_errors_are_backend_failures() {
        let err = map_sqlx_error("list_users", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("list_users")));
    }
}
