//! Catalog management over a [`ProductStore`].

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use stockroom_core::{DomainError, ProductId};
use stockroom_products::{NewProduct, Page, Product, ProductFilter, ProductPatch};

use crate::store::{ProductStore, StoreError, UniqueField};

use super::{ServiceError, conflict_message};

pub const PRODUCT_NOT_FOUND: &str = "Product not found";

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku), err)]
    pub async fn create(&self, input: NewProduct) -> Result<Product, ServiceError> {
        let draft = input.into_draft(Utc::now())?;
        let sku = draft.sku.clone();

        match self.store.insert(draft).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
                Ok(product)
            }
            Err(err) => Err(self.sku_conflict(err, &sku).await),
        }
    }

    /// Active products only, ordered by id.
    pub async fn find_all(&self, filter: ProductFilter, page: Page) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list(&filter, page).await?)
    }

    /// Lookup by id; soft-deleted products are returned too.
    pub async fn find_one(&self, id: ProductId) -> Result<Product, ServiceError> {
        Ok(self.store.find_by_id(id).await?.ok_or_else(not_found)?)
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, ServiceError> {
        let patch = patch.validated()?;
        let current = self.store.find_by_id(id).await?.ok_or_else(not_found)?;
        let new_sku = patch.changed_sku(&current).map(str::to_string);

        let merged = patch.merge(&current);
        match self.store.update(merged).await {
            Ok(Some(product)) => {
                tracing::info!(product_id = %product.id, "product updated");
                Ok(product)
            }
            Ok(None) => Err(not_found().into()),
            Err(err) => Err(match new_sku {
                Some(sku) => self.sku_conflict(err, &sku).await,
                None => err.into(),
            }),
        }
    }

    /// Soft delete: the row stays, `is_active` becomes false.
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn remove(&self, id: ProductId) -> Result<Product, ServiceError> {
        let product = self.store.soft_delete(id).await?.ok_or_else(not_found)?;
        tracing::info!(product_id = %product.id, "product deactivated");
        Ok(product)
    }

    /// Turn a sku violation into a conflict, naming the holder when it is
    /// a soft-deleted product.
    async fn sku_conflict(&self, err: StoreError, sku: &str) -> ServiceError {
        if err != StoreError::UniqueViolation(UniqueField::Sku) {
            return err.into();
        }
        match self.store.find_by_sku(sku).await {
            Ok(Some(holder)) if !holder.is_active => DomainError::conflict(format!(
                "{} (held by inactive product {})",
                conflict_message(UniqueField::Sku),
                holder.id
            ))
            .into(),
            Ok(_) => err.into(),
            Err(lookup) => {
                tracing::warn!(error = %lookup, "sku holder lookup failed");
                err.into()
            }
        }
    }
}

fn not_found() -> DomainError {
    DomainError::not_found(PRODUCT_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryProductStore;
    use rust_decimal::Decimal;
    use stockroom_core::ErrorKind;

    fn service() -> ProductService {
        ProductService::new(Arc::new(InMemoryProductStore::new()))
    }

    fn widget(sku: &str) -> NewProduct {
        NewProduct {
            sku: sku.into(),
            name: "Widget".into(),
            brand: "Acme".into(),
            quantity: Some(5),
            price: Decimal::new(999, 2),
            is_active: None,
            category: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn soft_delete_lifecycle() {
        let svc = service();
        let created = svc.create(widget("A1")).await.unwrap();
        assert!(svc.find_one(created.id).await.unwrap().is_active);

        svc.remove(created.id).await.unwrap();

        let listed = svc.find_all(ProductFilter::default(), Page::default()).await.unwrap();
        assert!(listed.is_empty());
        assert!(!svc.find_one(created.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() {
        let svc = service();
        svc.create(widget("A1")).await.unwrap();

        let err = svc.create(widget("A1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.public_message(), "SKU already exists");
    }

    #[tokio::test]
    async fn conflict_with_inactive_product_names_it() {
        let svc = service();
        let old = svc.create(widget("A1")).await.unwrap();
        svc.remove(old.id).await.unwrap();

        let err = svc.create(widget("A1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.public_message().starts_with("SKU already exists"));
        assert!(err.public_message().contains(&format!("inactive product {}", old.id)));
    }

    #[tokio::test]
    async fn update_changing_sku_into_collision_fails() {
        let svc = service();
        svc.create(widget("A1")).await.unwrap();
        let b = svc.create(widget("B2")).await.unwrap();

        let patch = ProductPatch { sku: Some("A1".into()), ..Default::default() };
        let err = svc.update(b.id, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Re-sending its own sku is fine.
        let patch = ProductPatch { sku: Some("B2".into()), quantity: Some(1), ..Default::default() };
        assert_eq!(svc.update(b.id, patch).await.unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn partial_update_preserves_absent_fields() {
        let svc = service();
        let created = svc.create(widget("A1")).await.unwrap();

        let patch = ProductPatch { name: Some("Gadget".into()), ..Default::default() };
        let updated = svc.update(created.id, patch).await.unwrap();

        assert_eq!(updated.name, "Gadget");
        assert_eq!(updated.sku, created.sku);
        assert_eq!(updated.price, created.price);
        assert_eq!(updated.quantity, created.quantity);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let svc = service();
        let id = ProductId::new(77);
        for err in [
            svc.find_one(id).await.unwrap_err(),
            svc.update(id, ProductPatch::default()).await.unwrap_err(),
            svc.remove(id).await.unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.public_message(), PRODUCT_NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn listing_filters_by_brand() {
        let svc = service();
        svc.create(widget("A1")).await.unwrap();
        svc.create(NewProduct { brand: "Other".into(), ..widget("B2") }).await.unwrap();

        let filter = ProductFilter::new(Some("Other".into()), None);
        let listed = svc.find_all(filter, Page::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sku, "B2");
    }
}
