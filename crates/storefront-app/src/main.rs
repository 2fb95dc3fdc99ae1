use std::sync::Arc;

use storefront_hex::application::checkout_service::CheckoutService;
use storefront_hex::auth::StaticTokenVerifier;
use storefront_hex::config::Config;
use storefront_hex::inbound::http::{HttpServer, HttpServerConfig};
use storefront_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / API_TOKENS when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    let service = CheckoutService::new(repo);

    let verifier = match config.api_tokens.as_deref() {
        Some(list) => StaticTokenVerifier::parse_tokens(list)?,
        None => {
            tracing::warn!("API_TOKENS not set; every request will be rejected as unauthorized");
            StaticTokenVerifier::new()
        }
    };

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let http = HttpServer::new(service, Arc::new(verifier), server_cfg).await?;
    http.run().await
}
