use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use stockroom_auth::{PasswordHasher, TokenIssuer};
use stockroom_infra::{
    AppConfig, AuthService, ProductService, UserService, db,
    store::{InMemoryProductStore, InMemoryUserStore, PostgresProductStore, PostgresUserStore},
};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub users: UserService,
    pub products: ProductService,
    pub auth: AuthService,
}

impl AppServices {
    pub fn new(users: UserService, products: ProductService, tokens: Arc<dyn TokenIssuer>) -> Self {
        let auth = AuthService::new(users.clone(), tokens);
        Self { users, products, auth }
    }

    /// Process-local stores; contents are lost on exit.
    pub fn in_memory(hasher: PasswordHasher, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self::new(
            UserService::new(Arc::new(InMemoryUserStore::new()), hasher),
            ProductService::new(Arc::new(InMemoryProductStore::new())),
            tokens,
        )
    }

    pub fn postgres(pool: PgPool, hasher: PasswordHasher, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self::new(
            UserService::new(Arc::new(PostgresUserStore::new(pool.clone())), hasher),
            ProductService::new(Arc::new(PostgresProductStore::new(pool))),
            tokens,
        )
    }
}

/// Wire stores and services from configuration, then seed the bootstrap
/// admin if one is configured.
pub async fn build_services(config: &AppConfig, tokens: Arc<dyn TokenIssuer>) -> anyhow::Result<AppServices> {
    let hasher = PasswordHasher::new(config.bcrypt_cost).context("invalid BCRYPT_COST")?;

    let services = match &config.database {
        Some(database) => {
            tracing::info!(database = %database.summary(), "connecting to postgres");
            let pool = db::connect(database)
                .await
                .context("failed to connect to postgres")?;
            AppServices::postgres(pool, hasher, tokens)
        }
        None => {
            tracing::warn!("DB_CONNECTION not set; using in-memory stores");
            AppServices::in_memory(hasher, tokens)
        }
    };

    if let Some(seed) = &config.admin {
        services
            .users
            .ensure_admin(seed)
            .await
            .context("failed to seed bootstrap admin")?;
    }

    Ok(services)
}
