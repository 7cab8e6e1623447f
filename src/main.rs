use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use cidrgate::args::Args;
use cidrgate::config::EnvVarConfig;
use cidrgate::connection::ConnectionTracker;
use cidrgate::server;
use cidrgate_core::{RequestHistory, SystemClock};

/// How long in-flight connections may take to finish after shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(err) = args.validate() {
        eprintln!("❌ Configuration error: {err}");
        std::process::exit(1);
    }

    server::init_tracing(args.json_logs);

    let config = match EnvVarConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    server::print_startup_info(&args, config.as_ref());

    let bind_addr = match args.resolve_bind_addr().await {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("❌ Configuration error: {err}");
            std::process::exit(1);
        }
    };
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Failed to bind to {bind_addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(address = %bind_addr, "CidrGate is running");

    let tracker = ConnectionTracker::new();
    server::serve(
        listener,
        RequestHistory::new(),
        config,
        Arc::new(SystemClock),
        tracker.clone(),
        shutdown_signal(),
    )
    .await;

    if !tracker.wait_for_shutdown(SHUTDOWN_TIMEOUT).await {
        warn!(
            active = tracker.count(),
            "Shutdown timeout reached with connections still open"
        );
    }

    info!("Shutdown complete");
}

/// Completes on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
