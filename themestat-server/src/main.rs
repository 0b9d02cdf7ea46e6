use std::future::Future;
use std::sync::Arc;

use clap::Parser;
use themestat_core::aggregator::Aggregator;
use themestat_core::catalog::CatalogClient;
use themestat_core::config::Config;
use themestat_core::http::create_router;
use themestat_core::scheduler::Scheduler;
use themestat_core::snapshot::SnapshotStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Polls a Plex server for theme coverage and serves the latest counts as JSON.
#[derive(Parser)]
#[command(name = "themestat-server")]
struct Args {
    /// Base URL of the Plex server.
    #[arg(long, default_value = "http://localhost:32400", env = "PLEX_SERVER_URL")]
    server_url: String,

    /// Plex access token, sent as X-Plex-Token.
    #[arg(long, default_value = "", env = "PLEX_TOKEN", hide_env_values = true)]
    token: String,

    /// Seconds between the end of one refresh and the start of the next.
    #[arg(long, default_value = "300", env = "UPDATE_INTERVAL")]
    update_interval: u64,

    /// Upper bound in seconds for each request to the Plex server.
    #[arg(long, default_value = "30", env = "REQUEST_TIMEOUT")]
    request_timeout: u64,

    /// Port to listen on.
    #[arg(long, default_value = "80", env = "THEMESTAT_PORT")]
    port: u16,

    /// Address to bind to.
    #[arg(long, default_value = "0.0.0.0", env = "THEMESTAT_BIND")]
    bind: String,
}

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
///
/// The SIGTERM handler is installed before this returns.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        async move {
            sigterm.recv().await;
            info!("received SIGTERM");
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl-C"),
            Err(e) => {
                error!("failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    Ok(async move {
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }
    })
}

#[tokio::main]
async fn main() {
    configure_logging();
    let args = Args::parse();

    let config = Config::new(
        &args.server_url,
        &args.token,
        args.update_interval,
        args.request_timeout,
    )
    .unwrap_or_else(|e| {
        error!("invalid configuration: {e}");
        std::process::exit(1);
    });

    let client = CatalogClient::new(&config).unwrap_or_else(|e| {
        error!("failed to create HTTP client: {e}");
        std::process::exit(1);
    });

    let store = SnapshotStore::new();
    let shutdown = CancellationToken::new();

    info!(
        "refreshing from {} every {} seconds",
        config.server_url,
        config.update_interval.as_secs()
    );
    let scheduler = Scheduler::new(
        Aggregator::new(Arc::new(client)),
        store.clone(),
        config.update_interval,
    )
    .spawn(shutdown.clone());

    let app = create_router(store);
    let addr = format!("{}:{}", args.bind, args.port);

    info!("binding to {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!("failed to bind to {addr}: {e}");
            std::process::exit(1);
        });

    let signal = shutdown_signal().unwrap_or_else(|e| {
        error!("failed to install signal handlers: {e}");
        std::process::exit(1);
    });
    let token = shutdown.clone();
    tokio::spawn(async move {
        signal.await;
        info!("shutdown requested");
        token.cancel();
    });

    info!("themestat-server listening on http://{addr}");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;
    if let Err(e) = served {
        error!("server error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = scheduler.await {
        error!("scheduler task failed: {e}");
    }
    info!("themestat-server stopped");
}
