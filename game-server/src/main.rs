use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use game_core::WordValidator;
use game_persistence::{GameRepository, GameStore, connect_and_migrate};
use game_server::{
    auth::{AuthService, IdentityVerifier},
    config::Config,
    create_routes,
    hub::Hub,
    invite::{self, InviteStore},
    service::{self, GameService, LiveService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting word rooms server...");

    let config = Config::from_env()?;

    info!("Loading words from directory: {}", config.words_directory);
    let words = WordValidator::from_directory(&config.words_directory).with_context(|| {
        format!(
            "the server needs word files; set WORDS_DIRECTORY to a directory of .txt lists (tried {})",
            config.words_directory
        )
    })?;
    let hub = Arc::new(Hub::new(words, config.hub_settings())?);

    // Initialize database connection and run migrations
    let db = connect_and_migrate(&config.database_url).await?;
    let store: Arc<dyn GameStore> = Arc::new(GameRepository::new(db));

    let auth_service = if config.auth_dev_mode {
        info!("Starting in development authentication mode - token signatures are not checked");
        AuthService::new_dev_mode()
    } else {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| anyhow!("JWT_SECRET must be set unless AUTH_DEV_MODE=true"))?;
        AuthService::new(secret)
    };
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(auth_service);

    let invites = Arc::new(InviteStore::new(config.invite_ttl()));
    let live_service = Arc::new(LiveService::new(hub.clone(), invites.clone(), store));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let invite_cleanup = invite::spawn_cleanup(
        invites,
        config.invite_cleanup_interval(),
        shutdown_rx.clone(),
    );
    let reaper = service::spawn_room_reaper(
        live_service.clone(),
        config.cleanup_policy(),
        config.reaper_interval(),
        shutdown_rx,
    );

    let game_service: Arc<dyn GameService> = live_service;
    let routes = create_routes(game_service, verifier);

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.host))?;
    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
        wait_for_signal().await;
    });

    info!("Server started successfully on {}. Press Ctrl+C to stop.", addr);
    server.await;

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(invite_cleanup, reaper);

    if !hub.is_empty() {
        info!("{} rooms were still open at shutdown", hub.len());
    }
    info!("Server shutdown complete.");
    Ok(())
}

async fn wait_for_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        let (Ok(mut sigint), Ok(mut sigterm)) = (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) else {
            tracing::error!("Failed to install signal handlers, falling back to Ctrl+C");
            let _ = signal::ctrl_c().await;
            return;
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }
}
