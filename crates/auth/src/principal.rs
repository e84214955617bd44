use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use crate::Role;

/// Identity of an authenticated caller, as carried by a verified token.
///
/// Downstream code trusts this value; it is only ever built from claims that
/// passed signature and expiry checks, or from a freshly verified login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when this caller is the owner of `user_id`.
    pub fn is_self(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
