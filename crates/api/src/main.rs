use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use orgadmin_api::app::{build_app, AppServices};
use orgadmin_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orgadmin_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(AppServices::in_memory(config.tokens));

    if let Some(seed) = config.superadmin {
        if services
            .users
            .ensure_superadmin(&seed.email, seed.password, Utc::now())
            .context("failed to seed superadmin")?
            .is_some()
        {
            tracing::info!("superadmin account created");
        }
    } else {
        tracing::warn!("SUPERADMIN_EMAIL/SUPERADMIN_PASSWORD not set; no superadmin seeded");
    }

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
