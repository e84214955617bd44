//! User accounts: stored record, public projection and write models.
//!
//! Plaintext passwords only ever live in [`CreateUser`], [`NewUser`] and
//! [`UserPatch`]; the stored [`User`] carries the bcrypt digest and the
//! outward [`PublicUser`] carries neither.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, UserId};

use crate::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::{Principal, Role};

const MAX_USERNAME_LENGTH: usize = 255;
const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

/// Stored account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Account as returned to clients: everything except the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

impl PublicUser {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Account creation input, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CreateUser {
    /// Validate the input and fill in server-side defaults.
    ///
    /// Role defaults to [`Role::User`], `is_active` to `true` and
    /// `created_at` to `now`. The username is trimmed and the email is
    /// trimmed and lower-cased.
    pub fn with_defaults(self, now: DateTime<Utc>) -> DomainResult<NewUser> {
        let username = normalize_username(&self.username)?;
        let email = normalize_email(&self.email)?;
        validate_password(&self.password)?;

        Ok(NewUser {
            username,
            email,
            password: self.password,
            role: self.role.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
        })
    }
}

/// Validated account input with every default resolved. Still holds the
/// plaintext password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Swap the plaintext password for its digest.
    pub fn into_draft(self, password_hash: String) -> UserDraft {
        UserDraft {
            username: self.username,
            email: self.email,
            password_hash,
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// A user ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserDraft {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Partial account update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Validate present fields and normalize them the same way creation does.
    pub fn validated(self) -> DomainResult<Self> {
        let username = self.username.as_deref().map(normalize_username).transpose()?;
        let email = self.email.as_deref().map(normalize_email).transpose()?;
        if let Some(password) = &self.password {
            validate_password(password)?;
        }

        Ok(Self {
            username,
            email,
            password: self.password,
            role: self.role,
            is_active: self.is_active,
        })
    }

    /// True when the patch changes fields only administrators may change.
    pub fn touches_privileged_fields(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }

    /// Merge onto `current`. `password_hash` is the digest of
    /// `self.password`, computed by the caller.
    pub fn merge(self, current: &User, password_hash: Option<String>) -> User {
        User {
            id: current.id,
            username: self.username.unwrap_or_else(|| current.username.clone()),
            email: self.email.unwrap_or_else(|| current.email.clone()),
            password_hash: password_hash.unwrap_or_else(|| current.password_hash.clone()),
            role: self.role.unwrap_or(current.role),
            is_active: self.is_active.unwrap_or(current.is_active),
            created_at: current.created_at,
        }
    }
}

fn normalize_username(raw: &str) -> DomainResult<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(DomainError::validation(format!(
            "username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(username.to_string())
}

fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation("email is required"));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(DomainError::validation(format!(
            "email cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !EMAIL_REGEX.is_match(&email) {
        return Err(DomainError::validation("email must be a valid email address"));
    }
    Ok(email)
}

fn validate_password(password: &str) -> DomainResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "password cannot exceed {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input() -> CreateUser {
        CreateUser {
            username: "  alice ".to_string(),
            email: " Alice@Example.COM ".to_string(),
            password: "hunter22".to_string(),
            role: None,
            is_active: None,
        }
    }

    fn stored() -> User {
        User {
            id: UserId::new(7),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$04$digest".to_string(),
            role: Role::User,
            is_active: true,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn defaults_are_applied() {
        let now = Utc::now();
        let new = input().with_defaults(now).unwrap();

        assert_eq!(new.username, "alice");
        assert_eq!(new.email, "alice@example.com");
        assert_eq!(new.role, Role::User);
        assert!(new.is_active);
        assert_eq!(new.created_at, now);
    }

    #[test]
    fn explicit_role_is_kept() {
        let new = CreateUser { role: Some(Role::Admin), ..input() }
            .with_defaults(Utc::now())
            .unwrap();
        assert_eq!(new.role, Role::Admin);
    }

    #[test]
    fn blank_username_is_rejected() {
        let err = CreateUser { username: "   ".into(), ..input() }
            .with_defaults(Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::validation("username is required"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["", "plain", "a@b", "a b@example.com", "@example.com"] {
            let result = CreateUser { email: bad.into(), ..input() }.with_defaults(Utc::now());
            assert!(result.is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn password_length_is_bounded() {
        let short = CreateUser { password: "12345".into(), ..input() }.with_defaults(Utc::now());
        assert!(short.is_err());

        let long = CreateUser { password: "x".repeat(73), ..input() }.with_defaults(Utc::now());
        assert!(long.is_err());

        let max = CreateUser { password: "x".repeat(72), ..input() }.with_defaults(Utc::now());
        assert!(max.is_ok());
    }

    #[test]
    fn public_projection_never_serializes_the_digest() {
        let json = serde_json::to_value(stored().to_public()).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["isActive"], true);
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("$2b$"));
    }

    #[test]
    fn patch_normalizes_email() {
        let patch = UserPatch { email: Some(" NEW@Example.org".into()), ..Default::default() }
            .validated()
            .unwrap();
        assert_eq!(patch.email.as_deref(), Some("new@example.org"));
    }

    #[test]
    fn patch_rejects_short_password() {
        let result = UserPatch { password: Some("abc".into()), ..Default::default() }.validated();
        assert!(result.is_err());
    }

    #[test]
    fn privileged_fields_are_detected() {
        assert!(!UserPatch { username: Some("x".into()), ..Default::default() }.touches_privileged_fields());
        assert!(UserPatch { role: Some(Role::Admin), ..Default::default() }.touches_privileged_fields());
        assert!(UserPatch { is_active: Some(false), ..Default::default() }.touches_privileged_fields());
    }

    #[test]
    fn merge_swaps_digest_only_when_given() {
        let current = stored();
        let merged = UserPatch::default().merge(&current, None);
        assert_eq!(merged, current);

        let merged = UserPatch { password: Some("newpass".into()), ..Default::default() }
            .merge(&current, Some("$2b$04$other".into()));
        assert_eq!(merged.password_hash, "$2b$04$other");
    }

    proptest! {
        #[test]
        fn merge_preserves_absent_fields(
            username in proptest::option::of("[a-z]{1,12}"),
            role in proptest::option::of(prop_oneof![Just(Role::Admin), Just(Role::User)]),
            is_active in proptest::option::of(any::<bool>()),
        ) {
            let current = stored();
            let patch = UserPatch { username: username.clone(), email: None, password: None, role, is_active };
            let merged = patch.merge(&current, None);

            prop_assert_eq!(merged.id, current.id);
            prop_assert_eq!(merged.created_at, current.created_at);
            prop_assert_eq!(&merged.email, &current.email);
            prop_assert_eq!(&merged.password_hash, &current.password_hash);
            prop_assert_eq!(merged.username, username.unwrap_or(current.username.clone()));
            prop_assert_eq!(merged.role, role.unwrap_or(current.role));
            prop_assert_eq!(merged.is_active, is_active.unwrap_or(current.is_active));
        }
    }
}
