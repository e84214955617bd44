//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Coarse classification of a failure, used by the HTTP boundary to pick a
/// status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

/// Domain-level error.
///
/// Messages are fixed and safe to return to clients. Infrastructure failures
/// (storage, hashing, signing) are modelled elsewhere and never carry their
/// detail through this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("{0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Missing or rejected credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::BadRequest,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Unauthorized(_) => ErrorKind::Unauthorized,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(DomainError::validation("x").kind(), ErrorKind::BadRequest);
        assert_eq!(DomainError::invalid_id("x").kind(), ErrorKind::BadRequest);
        assert_eq!(DomainError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::conflict("x").kind(), ErrorKind::Conflict);
        assert_eq!(DomainError::unauthorized("x").kind(), ErrorKind::Unauthorized);
        assert_eq!(DomainError::forbidden("x").kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn messages_are_passed_through_verbatim() {
        assert_eq!(DomainError::not_found("User not found").to_string(), "User not found");
        assert_eq!(DomainError::conflict("SKU already exists").to_string(), "SKU already exists");
    }
}
