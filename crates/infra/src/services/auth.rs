//! Login, session issuance and self-registration.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockroom_auth::{CreateUser, PublicUser, Role, TokenIssuer};
use stockroom_core::{DomainError, UserId};

use super::{ServiceError, UserService};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Identity summary returned alongside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: SessionUser,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(users: UserService, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    /// Check a username/password pair against an active account.
    ///
    /// Unknown user, inactive account and wrong password all fail with the
    /// same message.
    #[instrument(skip(self, password), err)]
    pub async fn validate_credentials(&self, username: &str, password: &str) -> Result<PublicUser, ServiceError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            tracing::info!("login rejected: unknown user");
            return Err(invalid_credentials());
        };
        if !user.is_active {
            tracing::info!(user_id = %user.id, "login rejected: account inactive");
            return Err(invalid_credentials());
        }

        let matches = self
            .users
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?;
        if !matches {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid_credentials());
        }

        Ok(user.to_public())
    }

    /// Sign a token for an already-verified account.
    pub fn issue_session(&self, user: &PublicUser) -> Result<Session, ServiceError> {
        if user.username.trim().is_empty() {
            return Err(invalid_credentials());
        }

        let access_token = self.tokens.issue(&user.principal(), Utc::now())?;
        Ok(Session {
            access_token,
            user: SessionUser {
                username: user.username.clone(),
                role: user.role,
                user_id: user.id,
            },
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        let user = self.validate_credentials(username, password).await?;
        let session = self.issue_session(&user)?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(session)
    }

    /// Public sign-up; the role is always [`Role::User`].
    pub async fn register(&self, input: CreateUser) -> Result<PublicUser, ServiceError> {
        self.users
            .create(CreateUser {
                role: Some(Role::User),
                is_active: None,
                ..input
            })
            .await
    }
}

fn invalid_credentials() -> ServiceError {
    DomainError::unauthorized(INVALID_CREDENTIALS).into()
}
