//! Account management over a [`UserStore`].

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use stockroom_auth::{CreateUser, PasswordHasher, PublicUser, Role, User, UserPatch};
use stockroom_core::{DomainError, UserId};

use crate::config::AdminSeed;
use crate::store::UserStore;

use super::ServiceError;

pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Validate, apply defaults, hash the password and persist.
    #[instrument(skip(self, input), fields(username = %input.username), err)]
    pub async fn create(&self, input: CreateUser) -> Result<PublicUser, ServiceError> {
        let new_user = input.with_defaults(Utc::now())?;
        let digest = self.hash_password(new_user.password.clone()).await?;

        let user = self.store.insert(new_user.into_draft(digest)).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user.to_public())
    }

    /// Exact username lookup, returning the full record (digest included)
    /// for credential checks.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.store.find_by_username(username).await?)
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<PublicUser, ServiceError> {
        let user = self.store.find_by_id(id).await?.ok_or_else(not_found)?;
        Ok(user.to_public())
    }

    pub async fn list(&self) -> Result<Vec<PublicUser>, ServiceError> {
        let users = self.store.list().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    /// Case-insensitive substring match; may be empty.
    pub async fn search_by_username(&self, fragment: &str) -> Result<Vec<PublicUser>, ServiceError> {
        let users = self.store.search_by_username(fragment.trim()).await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    /// Partial update. A new password is re-hashed before the merge.
    #[instrument(skip(self, patch), fields(user_id = %id), err)]
    pub async fn update(&self, id: UserId, patch: UserPatch) -> Result<PublicUser, ServiceError> {
        let patch = patch.validated()?;
        let current = self.store.find_by_id(id).await?.ok_or_else(not_found)?;

        let digest = match patch.password.clone() {
            Some(plaintext) => Some(self.hash_password(plaintext).await?),
            None => None,
        };

        let merged = patch.merge(&current, digest);
        let user = self.store.update(merged).await?.ok_or_else(not_found)?;
        tracing::info!(user_id = %user.id, "user updated");
        Ok(user.to_public())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    pub async fn remove(&self, id: UserId) -> Result<(), ServiceError> {
        if !self.store.delete(id).await? {
            return Err(not_found().into());
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn activate(&self, id: UserId) -> Result<PublicUser, ServiceError> {
        self.set_active(id, true).await
    }

    pub async fn deactivate(&self, id: UserId) -> Result<PublicUser, ServiceError> {
        self.set_active(id, false).await
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn set_active(&self, id: UserId, is_active: bool) -> Result<PublicUser, ServiceError> {
        let user = self.store.set_active(id, is_active).await?.ok_or_else(not_found)?;
        tracing::info!(user_id = %user.id, is_active, "user active flag set");
        Ok(user.to_public())
    }

    /// Create the bootstrap administrator unless the username is taken.
    /// Returns the new account, or `None` when it already existed.
    #[instrument(skip(self, seed), fields(username = %seed.username), err)]
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<Option<PublicUser>, ServiceError> {
        if self.store.find_by_username(seed.username.trim()).await?.is_some() {
            tracing::debug!("bootstrap admin already present");
            return Ok(None);
        }

        let input = CreateUser {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            role: Some(Role::Admin),
            is_active: Some(true),
        };
        let admin = self.create(input).await?;
        tracing::info!(user_id = %admin.id, "bootstrap admin created");
        Ok(Some(admin))
    }

    /// bcrypt on the blocking pool.
    pub(crate) async fn hash_password(&self, plaintext: String) -> Result<String, ServiceError> {
        let hasher = self.hasher;
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&plaintext)).await??;
        Ok(digest)
    }

    pub(crate) async fn verify_password(&self, plaintext: String, digest: String) -> Result<bool, ServiceError> {
        let hasher = self.hasher;
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest)).await?)
    }
}

fn not_found() -> DomainError {
    DomainError::not_found(USER_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;
    use stockroom_auth::password::MIN_COST;
    use stockroom_core::ErrorKind;

    fn service() -> UserService {
        UserService::new(
            Arc::new(InMemoryUserStore::new()),
            PasswordHasher::new(MIN_COST).unwrap(),
        )
    }

    fn input(username: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.into(),
            email: email.into(),
            password: "secret1".into(),
            role: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_hashes() {
        let svc = service();
        let created = svc.create(input("alice", "Alice@Example.com")).await.unwrap();

        assert_eq!(created.role, Role::User);
        assert!(created.is_active);
        assert_eq!(created.email, "alice@example.com");

        let stored = svc.find_by_username("alice").await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$2"));
        assert!(svc.hasher().verify("secret1", &stored.password_hash));
    }

    #[tokio::test]
    async fn duplicates_are_conflicts() {
        let svc = service();
        svc.create(input("alice", "a@example.com")).await.unwrap();

        let err = svc.create(input("alice", "other@example.com")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.public_message(), "Username already exists");

        let err = svc.create(input("bob", "A@example.com")).await.unwrap_err();
        assert_eq!(err.public_message(), "Email already exists");
    }

    #[tokio::test]
    async fn update_rehashes_password_and_keeps_other_fields() {
        let svc = service();
        let created = svc.create(input("alice", "a@example.com")).await.unwrap();

        let patch = UserPatch {
            password: Some("brandnew".into()),
            ..Default::default()
        };
        let updated = svc.update(created.id, patch).await.unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "a@example.com");
        assert_eq!(updated.created_at, created.created_at);

        let stored = svc.find_by_username("alice").await.unwrap().unwrap();
        assert!(svc.hasher().verify("brandnew", &stored.password_hash));
        assert!(!svc.hasher().verify("secret1", &stored.password_hash));
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let svc = service();
        let id = UserId::new(404);

        for err in [
            svc.find_by_id(id).await.unwrap_err(),
            svc.update(id, UserPatch::default()).await.unwrap_err(),
            svc.remove(id).await.unwrap_err(),
            svc.activate(id).await.unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.public_message(), USER_NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn deactivate_is_idempotent() {
        let svc = service();
        let created = svc.create(input("alice", "a@example.com")).await.unwrap();

        assert!(!svc.deactivate(created.id).await.unwrap().is_active);
        assert!(!svc.deactivate(created.id).await.unwrap().is_active);
        assert!(svc.activate(created.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn remove_deletes_the_row() {
        let svc = service();
        let created = svc.create(input("alice", "a@example.com")).await.unwrap();
        svc.remove(created.id).await.unwrap();
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_admin_runs_once() {
        let svc = service();
        let seed = AdminSeed {
            username: "root".into(),
            email: "root@example.com".into(),
            password: "changeme".into(),
        };

        let admin = svc.ensure_admin(&seed).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(svc.ensure_admin(&seed).await.unwrap().is_none());
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }
}
