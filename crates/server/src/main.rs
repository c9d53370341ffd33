use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediarelay_core::{
    load_config, validate_config, CloudinaryRelay, Orchestrator, ProcessRunner, ProxyPool, Relay,
    RetrievalDriver, ToolRunner,
};
use mediarelay_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    // Determine config path
    let config_path = std::env::var("MEDIARELAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Relay credential is required before any batch can run
    let relay: Arc<dyn Relay> = Arc::new(
        CloudinaryRelay::from_config(&config.relay).context("Failed to configure relay")?,
    );

    // Proxy pool is required for the proxied retrieval path
    let proxies = ProxyPool::load(&config.proxies.path, &config.proxies.allowed_ports)
        .with_context(|| format!("Failed to load proxies from {:?}", config.proxies.path))?;
    info!(
        "Loaded {} proxies from {}",
        proxies.len(),
        config.proxies.path.display()
    );

    let runner = ProcessRunner::new();
    match runner.tool_version(&config.retrieval.ytdlp_path).await {
        Ok(version) => info!("yt-dlp version: {}", version),
        Err(e) => warn!("Failed to get yt-dlp version: {}", e),
    }
    let runner: Arc<dyn ToolRunner> = Arc::new(runner);

    let driver = RetrievalDriver::new(config.retrieval.clone(), Arc::new(proxies), runner);
    let orchestrator = Arc::new(Orchestrator::new(
        config.orchestrator.clone(),
        driver,
        relay,
    ));
    info!(
        "Orchestrator ready (max {} concurrent tasks)",
        config.orchestrator.max_concurrent_tasks
    );

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
