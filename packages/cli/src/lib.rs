// ABOUTME: Wiring for the Keel server and maintenance commands
// ABOUTME: Builds the options store, integrity tokens and router from Config

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use keel_api::{create_router, AppState, SettingsEndpoint};
use keel_config::{BackendKind, Config};
use keel_security::IntegrityTokens;
use keel_settings::{
    builtin_defaults, load_defaults, MemoryOptionsBackend, OptionsBackend, OptionsStore,
    SqliteOptionsBackend,
};

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();
}

/// Open the configured backend and load or seed the settings document
pub async fn build_store(config: &Config) -> anyhow::Result<OptionsStore> {
    let defaults = match &config.defaults_path {
        Some(path) => load_defaults(path)
            .with_context(|| format!("Failed to load defaults from {}", path.display()))?,
        None => builtin_defaults(),
    };

    let backend: Arc<dyn OptionsBackend> = match &config.backend {
        BackendKind::Memory => {
            warn!("Using in-memory settings storage; changes are lost on exit");
            Arc::new(MemoryOptionsBackend::new())
        }
        BackendKind::Sqlite(url) => Arc::new(
            SqliteOptionsBackend::connect(url)
                .await
                .with_context(|| format!("Failed to open settings database {}", url))?,
        ),
    };

    let store = OptionsStore::new(backend, config.option_name.clone(), defaults);
    store.init().await.context("Failed to initialize settings")?;
    Ok(store)
}

pub fn build_tokens(config: &Config) -> anyhow::Result<IntegrityTokens> {
    let secret = match &config.nonce_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!("KEEL_NONCE_SECRET is not set; integrity tokens will not survive a restart");
            IntegrityTokens::generate_secret()
        }
    };

    IntegrityTokens::new(secret.as_bytes(), config.nonce_lifetime)
        .context("Invalid integrity token configuration")
}

pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store = build_store(config).await?;
    let tokens = build_tokens(config)?;

    if config.admin_token_hash.is_none() {
        warn!("KEEL_ADMIN_TOKEN_HASH is not set; settings routes will refuse every caller");
    }

    Ok(AppState::new(
        SettingsEndpoint::new(store, Arc::new(tokens)),
        config.admin_token_hash.clone(),
        config.menu_priority,
    ))
}

/// Run the HTTP server until ctrl-c
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, option = %config.option_name, "Keel settings server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
