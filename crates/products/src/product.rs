use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId};

pub const MAX_SKU_LENGTH: usize = 100;

/// Price scale (NUMERIC(10,2)).
pub const PRICE_SCALE: u32 = 2;

/// Largest price representable in NUMERIC(10,2): 99 999 999.99.
pub fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, PRICE_SCALE)
}

/// Stored product record.
///
/// Products are never physically deleted; `is_active = false` marks a
/// soft-deleted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub quantity: i32,
    pub price: Decimal,
    pub is_active: bool,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Product creation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub quantity: Option<i32>,
    pub price: Decimal,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Validate and normalize, producing a row ready for insertion.
    pub fn into_draft(self, now: DateTime<Utc>) -> DomainResult<ProductDraft> {
        Ok(ProductDraft {
            sku: normalize_sku(&self.sku)?,
            name: required_text("name", &self.name)?,
            brand: required_text("brand", &self.brand)?,
            quantity: validate_quantity(self.quantity.unwrap_or(0))?,
            price: normalize_price(self.price)?,
            is_active: self.is_active.unwrap_or(true),
            category: optional_text(self.category),
            image_url: optional_text(self.image_url),
            created_at: now,
        })
    }
}

/// A product ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub quantity: i32,
    pub price: Decimal,
    pub is_active: bool,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductDraft {
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            sku: self.sku,
            name: self.name,
            brand: self.brand,
            quantity: self.quantity,
            price: self.price,
            is_active: self.is_active,
            category: self.category,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

/// Partial product update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// Validate present fields and normalize them the same way creation does.
    pub fn validated(self) -> DomainResult<Self> {
        Ok(Self {
            sku: self.sku.as_deref().map(normalize_sku).transpose()?,
            name: self.name.as_deref().map(|v| required_text("name", v)).transpose()?,
            brand: self.brand.as_deref().map(|v| required_text("brand", v)).transpose()?,
            quantity: self.quantity.map(validate_quantity).transpose()?,
            price: self.price.map(normalize_price).transpose()?,
            is_active: self.is_active,
            category: optional_text(self.category),
            image_url: optional_text(self.image_url),
        })
    }

    /// The new sku, if the patch changes it relative to `current`.
    pub fn changed_sku<'a>(&'a self, current: &Product) -> Option<&'a str> {
        self.sku.as_deref().filter(|sku| *sku != current.sku)
    }

    pub fn merge(self, current: &Product) -> Product {
        Product {
            id: current.id,
            sku: self.sku.unwrap_or_else(|| current.sku.clone()),
            name: self.name.unwrap_or_else(|| current.name.clone()),
            brand: self.brand.unwrap_or_else(|| current.brand.clone()),
            quantity: self.quantity.unwrap_or(current.quantity),
            price: self.price.unwrap_or(current.price),
            is_active: self.is_active.unwrap_or(current.is_active),
            category: self.category.or_else(|| current.category.clone()),
            image_url: self.image_url.or_else(|| current.image_url.clone()),
            created_at: current.created_at,
        }
    }
}

/// Round half away from zero to two places and check the column bounds.
pub fn normalize_price(price: Decimal) -> DomainResult<Decimal> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation("price must not be negative"));
    }
    let mut rounded = price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded > max_price() {
        return Err(DomainError::validation("price cannot exceed 99999999.99"));
    }
    rounded.rescale(PRICE_SCALE);
    Ok(rounded.abs())
}

fn normalize_sku(raw: &str) -> DomainResult<String> {
    let sku = required_text("sku", raw)?;
    if sku.chars().count() > MAX_SKU_LENGTH {
        return Err(DomainError::validation(format!(
            "sku cannot exceed {MAX_SKU_LENGTH} characters"
        )));
    }
    Ok(sku)
}

fn validate_quantity(quantity: i32) -> DomainResult<i32> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity must not be negative"));
    }
    Ok(quantity)
}

fn required_text(field: &str, raw: &str) -> DomainResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
