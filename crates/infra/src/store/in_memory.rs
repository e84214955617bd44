//! In-memory stores for tests and database-less development.
//!
//! Each store keeps its rows in a `BTreeMap` keyed by id behind one
//! `RwLock`, so uniqueness checks and the write that follows happen under
//! the same write guard.

use std::collections::BTreeMap;
use std::sync::RwLock;

use stockroom_auth::{User, UserDraft};
use stockroom_core::{Entity, ProductId, UserId};
use stockroom_products::{Page, Product, ProductDraft, ProductFilter};

use super::{ProductStore, StoreError, UniqueField, UserStore};

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Table<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// First unique column of `candidate` already held by another row.
fn user_collision<'a>(
    rows: impl Iterator<Item = &'a User>,
    candidate_id: Option<UserId>,
    username: &str,
    email: &str,
) -> Option<UniqueField> {
    for row in rows {
        if Some(row.id()) == candidate_id {
            continue;
        }
        if row.username == username {
            return Some(UniqueField::Username);
        }
        if row.email == email {
            return Some(UniqueField::Email);
        }
    }
    None
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, draft: UserDraft) -> Result<User, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if let Some(field) = user_collision(table.rows.values(), None, &draft.username, &draft.email) {
            return Err(StoreError::UniqueViolation(field));
        }

        let id = table.allocate_id();
        let user = draft.into_user(UserId::new(id));
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id.get()).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn search_by_username(&self, fragment: &str) -> Result<Vec<User>, StoreError> {
        let needle = fragment.to_lowercase();
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table
            .rows
            .values()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn update(&self, user: User) -> Result<Option<User>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if !table.rows.contains_key(&user.id.get()) {
            return Ok(None);
        }
        if let Some(field) = user_collision(table.rows.values(), Some(user.id), &user.username, &user.email) {
            return Err(StoreError::UniqueViolation(field));
        }

        table.rows.insert(user.id.get(), user.clone());
        Ok(Some(user))
    }

    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.get_mut(&id.get()).map(|user| {
            user.is_active = is_active;
            user.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.remove(&id.get()).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<Table<Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if table.rows.values().any(|p| p.sku == draft.sku) {
            return Err(StoreError::UniqueViolation(UniqueField::Sku));
        }

        let id = table.allocate_id();
        let product = draft.into_product(ProductId::new(id));
        table.rows.insert(id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id.get()).cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().find(|p| p.sku == sku).cloned())
    }

    async fn list(&self, filter: &ProductFilter, page: Page) -> Result<Vec<Product>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .skip(skip)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, product: Product) -> Result<Option<Product>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if !table.rows.contains_key(&product.id.get()) {
            return Ok(None);
        }
        if table
            .rows
            .values()
            .any(|p| p.id != product.id && p.sku == product.sku)
        {
            return Err(StoreError::UniqueViolation(UniqueField::Sku));
        }

        table.rows.insert(product.id.get(), product.clone());
        Ok(Some(product))
    }

    async fn soft_delete(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.get_mut(&id.get()).map(|product| {
            product.is_active = false;
            product.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use stockroom_auth::Role;
    use stockroom_products::NewProduct;

    fn user_draft(username: &str, email: &str) -> UserDraft {
        UserDraft {
            username: username.into(),
            email: email.into(),
            password_hash: "$2b$04$x".into(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn product_draft(sku: &str) -> ProductDraft {
        NewProduct {
            sku: sku.into(),
            name: "Widget".into(),
            brand: "Acme".into(),
            quantity: Some(1),
            price: Decimal::ONE,
            is_active: None,
            category: None,
            image_url: None,
        }
        .into_draft(Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = InMemoryUserStore::new();
        let a = store.insert(user_draft("a", "a@x.io")).await.unwrap();
        let b = store.insert(user_draft("b", "b@x.io")).await.unwrap();
        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() {
        let store = InMemoryUserStore::new();
        store.insert(user_draft("a", "a@x.io")).await.unwrap();

        assert_eq!(
            store.insert(user_draft("a", "other@x.io")).await,
            Err(StoreError::UniqueViolation(UniqueField::Username))
        );
        assert_eq!(
            store.insert(user_draft("b", "a@x.io")).await,
            Err(StoreError::UniqueViolation(UniqueField::Email))
        );
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_may_keep_its_own_unique_values() {
        let store = InMemoryUserStore::new();
        let mut user = store.insert(user_draft("a", "a@x.io")).await.unwrap();
        store.insert(user_draft("b", "b@x.io")).await.unwrap();

        user.role = Role::Admin;
        assert!(store.update(user.clone()).await.unwrap().is_some());

        user.email = "b@x.io".into();
        assert_eq!(
            store.update(user).await,
            Err(StoreError::UniqueViolation(UniqueField::Email))
        );
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let store = InMemoryUserStore::new();
        store.insert(user_draft("Johnny", "j@x.io")).await.unwrap();
        store.insert(user_draft("ajohn", "aj@x.io")).await.unwrap();
        store.insert(user_draft("mary", "m@x.io")).await.unwrap();

        let found = store.search_by_username("JOHN").await.unwrap();
        let names: Vec<_> = found.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["Johnny", "ajohn"]);
    }

    #[tokio::test]
    async fn missing_rows_report_none() {
        let store = InMemoryUserStore::new();
        assert_eq!(store.set_active(UserId::new(9), false).await, Ok(None));
        assert_eq!(store.delete(UserId::new(9)).await, Ok(false));
    }

    #[tokio::test]
    async fn soft_deleted_products_keep_their_sku() {
        let store = InMemoryProductStore::new();
        let p = store.insert(product_draft("A1")).await.unwrap();
        store.soft_delete(p.id).await.unwrap();

        assert_eq!(
            store.insert(product_draft("A1")).await,
            Err(StoreError::UniqueViolation(UniqueField::Sku))
        );
        assert!(!store.find_by_sku("A1").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn listing_pages_active_rows_in_id_order() {
        let store = InMemoryProductStore::new();
        for i in 0..5 {
            store.insert(product_draft(&format!("S{i}"))).await.unwrap();
        }
        store.soft_delete(ProductId::new(2)).await.unwrap();

        let filter = ProductFilter::default();
        let first = store.list(&filter, Page::new(Some(1), Some(2)).unwrap()).await.unwrap();
        let second = store.list(&filter, Page::new(Some(2), Some(2)).unwrap()).await.unwrap();

        let ids = |v: &[Product]| v.iter().map(|p| p.id.get()).collect::<Vec<_>>();
        assert_eq!(ids(&first), [1, 3]);
        assert_eq!(ids(&second), [4, 5]);
    }
}
