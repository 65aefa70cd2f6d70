//! Webhook server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::signal;
use tracing::info;

use pizzabot::config::{self, Config};
use pizzabot::dialog::StateSet;
use pizzabot::messenger::TelegramMessenger;
use pizzabot::server::{self, AppState};
use pizzabot::session::{EvictionPolicy, SessionRegistry};

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let Some(telegram) = config.telegram.clone() else {
        bail!("telegram.bot_token must be configured");
    };

    // Load and validate state descriptors; a malformed descriptor is fatal.
    let config_path_ref = Path::new(config_path);
    let states_dir = config
        .states_dir
        .as_deref()
        .unwrap_or(Path::new(config::DEFAULT_STATES_DIR));
    let states_dir = config::resolve_path(config_path_ref, states_dir);
    let states = Arc::new(
        StateSet::load(&states_dir)
            .await
            .context("failed to load state descriptors")?,
    );
    info!(dir = %states_dir.display(), "Loaded state descriptors");

    let messenger = Arc::new(TelegramMessenger::new(&telegram.bot_token));
    let eviction = EvictionPolicy {
        poll_interval: Duration::from_secs(config.dialog.eviction_poll_seconds),
        idle_timeout: Duration::from_secs(config.dialog.idle_timeout_seconds),
    };
    let registry = SessionRegistry::new("telegram", states, messenger, eviction);

    let state = AppState {
        telegram: registry.clone(),
    };
    let app = server::build_app(
        state,
        &telegram.bot_token,
        config.server.request_timeout_seconds,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server host/port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
