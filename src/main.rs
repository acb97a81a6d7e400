//! Blog API server binary.

use std::net::SocketAddr;

use blog_api::config::Config;
use blog_api::logging::{self, Logger, LoggerRegistry};
use blog_api::store::PostStore;
use blog_api::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    logging::init(&config);
    let loggers = LoggerRegistry::from_config(&config);

    // Load the post collection
    let posts = PostStore::open(config.data_path.as_deref()).await?;
    tracing::info!("Loaded {} posts", posts.len());

    let state = AppState::new(posts, &loggers);
    let logger = state.logger.clone();

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    logger.info(&format!(
        "Server running in {} mode on http://{} (started at {})",
        config.mode,
        config.bind_addr,
        chrono::Local::now().to_rfc3339()
    ));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(logger.clone()))
    .await?;

    logger.info("HTTP server closed");

    Ok(())
}

/// Wait for SIGINT, SIGTERM or SIGQUIT.
async fn shutdown_signal(logger: Logger) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger.error(&format!("Failed to listen for Ctrl+C: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::quit())) {
            (Ok(mut term), Ok(mut quit)) => {
                tokio::select! {
                    _ = term.recv() => "SIGTERM",
                    _ = quit.recv() => "SIGQUIT",
                }
            }
            _ => {
                logger.error("Failed to install SIGTERM/SIGQUIT handlers");
                std::future::pending::<&'static str>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let signal = tokio::select! {
        _ = ctrl_c => "SIGINT",
        signal = terminate => signal,
    };

    logger.info(&format!(
        "Received {}, starting graceful shutdown...",
        signal
    ));
}

