use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::UserId;

use crate::{Principal, Role};

/// JWT claims model (transport-agnostic).
///
/// Timestamps travel as the registered `iat` / `exp` claims (seconds since
/// the epoch) so any standard JWT library can verify expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the account id.
    pub sub: UserId,

    pub username: String,

    pub role: Role,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    /// Claims for `principal`, valid from `now` for `ttl`.
    ///
    /// `None` when the expiry falls outside the representable date range.
    pub fn for_principal(principal: &Principal, now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        // Whole seconds only; the wire format cannot carry more.
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expires_at = issued_at.checked_add_signed(ttl)?;
        Some(Self {
            sub: principal.user_id,
            username: principal.username.clone(),
            role: principal.role,
            issued_at,
            expires_at,
        })
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token carries no username")]
    MissingUsername,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// lives in [`crate::token`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.username.trim().is_empty() {
        return Err(TokenValidationError::MissingUsername);
    }
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    // One second of slack: `iat` is truncated to whole seconds.
    if now + Duration::seconds(1) < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
