//! AutoStack - A car marketplace storefront

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autostack::{
    api::{self, toolkit_factory, AppState, SessionRegistry},
    config::Config,
    content::build_catalog,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autostack=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AutoStack storefront...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // One HTTP client shared by the CMS, identity and backend calls
    let http = reqwest::Client::builder().build()?;

    let catalog = build_catalog(http.clone(), &config.content)?;

    if config.identity.is_configured() {
        tracing::info!("Identity provider: {}", config.identity.auth_domain);
    } else {
        tracing::warn!("Identity provider not configured, sign-in is disabled");
    }
    let sessions = SessionRegistry::new(&config, http.clone(), toolkit_factory(http, &config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let cors_origin = config.server.cors_origin.clone();
    let state = AppState {
        config: Arc::new(config),
        catalog,
        sessions: Arc::new(sessions),
    };

    // Build router
    let app = api::build_router(state, &cors_origin);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
