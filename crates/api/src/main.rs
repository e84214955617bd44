use std::sync::Arc;

use anyhow::Context;
use chrono::TimeDelta;

use stockroom_api::app::{build_app, services::build_services};
use stockroom_auth::Hs256Jwt;
use stockroom_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.jwt.uses_default_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let ttl = TimeDelta::try_seconds(config.jwt.expires_in_secs)
        .context("JWT_EXPIRES_IN is out of range")?;
    let jwt = Arc::new(Hs256Jwt::new(&config.jwt.secret, ttl));
    let services = Arc::new(build_services(&config, jwt.clone()).await?);
    let app = build_app(services, jwt);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
