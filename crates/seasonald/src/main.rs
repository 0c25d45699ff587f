use anyhow::{Context, Result};
use seasonal_gateway::{AccessPolicy, GeminiClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod http_interface;

use http_interface::{AppState, Upstream};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("seasonald starting");

    let config = config::Config::from_env();

    let policy = AccessPolicy::new(config.access_password.as_deref());
    if !policy.is_configured() {
        tracing::warn!("SEASONAL_ACCESS_PASSWORD not set; all edit requests will be refused");
    }

    let upstream = match config.google_api_key.as_deref() {
        Some(key) => {
            let client = GeminiClient::new(key)
                .with_base_url(config.api_base_url.as_str())
                .with_models(config.hair_model.as_str(), config.fashion_model.as_str())
                .with_timeout(config.upstream_timeout());
            tracing::info!(
                hair_model = %config.hair_model,
                fashion_model = %config.fashion_model,
                timeout_ms = client.timeout().as_millis() as u64,
                "upstream configured"
            );
            Some(Arc::new(client) as Arc<dyn Upstream>)
        }
        None => {
            tracing::warn!("no upstream API key set; edit requests will fail with 500");
            None
        }
    };

    let app = http_interface::router(AppState { policy, upstream }, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "seasonald ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            // Keep running until signaled
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("seasonald shutting down");
    Ok(())
}
