//! Postgres pool construction and schema sync.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{ConnectOptions, PgPool, Row};
use tracing::instrument;

use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          BIGSERIAL PRIMARY KEY,
        username    TEXT NOT NULL,
        email       TEXT NOT NULL,
        password    TEXT NOT NULL,
        role        TEXT NOT NULL DEFAULT 'user',
        is_active   BOOLEAN NOT NULL DEFAULT TRUE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email),
        CONSTRAINT users_role_check CHECK (role IN ('admin', 'user'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        sku         VARCHAR(100) NOT NULL,
        name        TEXT NOT NULL,
        brand       TEXT NOT NULL,
        quantity    INTEGER NOT NULL DEFAULT 0,
        price       NUMERIC(10, 2) NOT NULL,
        is_active   BOOLEAN NOT NULL DEFAULT TRUE,
        category    TEXT NULL,
        image_url   TEXT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT products_sku_key UNIQUE (sku),
        CONSTRAINT products_quantity_check CHECK (quantity >= 0),
        CONSTRAINT products_price_check CHECK (price >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS products_active_id_idx ON products (is_active, id)",
];

/// SSL mode for the configured flags.
pub fn ssl_mode(config: &DatabaseConfig) -> PgSslMode {
    match (config.ssl, config.ssl_reject_unauthorized) {
        (false, _) => PgSslMode::Disable,
        (true, false) => PgSslMode::Require,
        (true, true) => PgSslMode::VerifyFull,
    }
}

/// Connect, verify the connection, and sync the schema when enabled.
#[instrument(skip(config), fields(db = %config.summary()), err)]
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(&config.url)?.ssl_mode(ssl_mode(config));
    if !config.logging {
        options = options.disable_statement_logging();
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    let row = sqlx::query("SELECT NOW() AS now").fetch_one(&pool).await?;
    let now: chrono::DateTime<chrono::Utc> = row.try_get("now")?;
    tracing::info!(server_time = %now, "database connection established");

    if config.sync {
        sync_schema(&pool).await?;
    }

    Ok(pool)
}

/// Create missing tables and indexes. Existing tables are left untouched.
#[instrument(skip(pool), err)]
pub async fn sync_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!(statements = SCHEMA.len(), "schema sync complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ssl: bool, reject: bool) -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://localhost/stock".into(),
            host: "localhost".into(),
            port: None,
            database: "stock".into(),
            sync: true,
            logging: true,
            ssl,
            ssl_reject_unauthorized: reject,
            max_connections: 1,
        }
    }

    #[test]
    fn ssl_flags_map_to_modes() {
        assert!(matches!(ssl_mode(&config(false, true)), PgSslMode::Disable));
        assert!(matches!(ssl_mode(&config(true, false)), PgSslMode::Require));
        assert!(matches!(ssl_mode(&config(true, true)), PgSslMode::VerifyFull));
    }

    #[test]
    fn schema_declares_named_unique_constraints() {
        let ddl = SCHEMA.join("\n");
        for name in ["users_username_key", "users_email_key", "products_sku_key"] {
            assert!(ddl.contains(name), "missing {name}");
        }
    }
}
