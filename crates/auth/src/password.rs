//! Password hashing and verification (bcrypt).
//!
//! Both operations are CPU-bound; async callers should run them on a
//! blocking thread (`tokio::task::spawn_blocking`).

use thiserror::Error;

/// Default bcrypt work factor.
pub const DEFAULT_COST: u32 = 10;

/// Work factor bounds accepted by bcrypt.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Minimum password length accepted on create/update.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length (bcrypt only reads the first 72 bytes).
pub const MAX_PASSWORD_LENGTH: usize = 72;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("bcrypt cost {0} is outside the supported range 4..=31")]
    InvalidCost(u32),

    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// One-way password hasher with a fixed work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `plaintext` with a fresh salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Compare `plaintext` against a stored digest.
    ///
    /// Any bcrypt failure, such as a malformed digest, counts as a mismatch
    /// so a corrupted row can never authenticate.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match bcrypt::verify(plaintext, digest) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "password verification failed");
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}
