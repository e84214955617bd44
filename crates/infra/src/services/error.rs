use thiserror::Error;

use stockroom_auth::{PasswordError, TokenError};
use stockroom_core::{DomainError, ErrorKind};

use crate::store::{StoreError, UniqueField};

/// Message returned to clients for every internal failure.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Service-layer error.
///
/// Domain failures carry client-safe messages. Everything else is an
/// internal failure whose detail is logged and never returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Store(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(e) => e.kind(),
            _ => ErrorKind::Internal,
        }
    }

    /// Message safe to return to the client.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Domain(e) => e.to_string(),
            _ => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(field) => {
                ServiceError::Domain(DomainError::conflict(conflict_message(field)))
            }
            StoreError::Backend(detail) => ServiceError::Store(detail),
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Task(err.to_string())
    }
}

pub fn conflict_message(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Username => "Username already exists",
        UniqueField::Email => "Email already exists",
        UniqueField::Sku => "SKU already exists",
    }
}
