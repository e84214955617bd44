//! Product catalog domain.
//!
//! Validation, normalization and partial-merge rules for products, plus the
//! listing filter and pagination types. No IO, no HTTP, no storage.

pub mod product;
pub mod query;

pub use product::{NewProduct, Product, ProductDraft, ProductPatch, normalize_price};
pub use query::{Page, ProductFilter};
