use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use mentat_api::config::Cli;
use mentat_api::telemetry::{init_tracing, LogSettings};
use mentat_api::{router, RPC_PATH};
use mentat_core::EntryGateway;
use mentat_db::{log_pool_metrics, Database, PoolConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = LogSettings::from_env();
    let _file_guard = init_tracing(&settings);
    info!(
        json = settings.json,
        log_file = settings.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = cli.into_config().map_err(|e| {
        error!(subsystem = "api", error = %e, "Invalid configuration");
        e
    })?;

    let db = Database::connect_with_config(
        &config.database_url,
        PoolConfig::new().max_connections(config.max_connections),
    )
    .await
    .map_err(|e| {
        error!(subsystem = "api", error = %e, "Cannot connect to database");
        e
    })?;
    db.migrate().await?;
    log_pool_metrics(db.pool());

    let gateway = EntryGateway::new(Arc::new(db.entries.clone()));
    let app = router(gateway);

    let addr: SocketAddr = config.listen_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(subsystem = "api", %addr, path = RPC_PATH, "mentat service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!(subsystem = "api", "service stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(subsystem = "api", "Shutdown signal received");
}
