//! Server utilities: logging setup, startup banner and the accept loop.

use std::env;
use std::future::Future;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::connection::ConnectionTracker;
use crate::{args::Args, env_vars};
use cidrgate_core::request_handler::handle_request;
use cidrgate_core::{Clock, ConfigProvider, RequestHistory};

/// Default log filter when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

/// Initializes the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` (default: `info`). With `json` set, each
/// event is written as one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // Ignore failure: a subscriber may already be installed (tests).
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Print startup banner with configuration
pub fn print_startup_info(args: &Args, config: &impl ConfigProvider) {
    if args.quiet {
        // Quiet mode: only essential information
        println!(
            "🚀 CidrGate v{} starting on {}:{}",
            env!("CARGO_PKG_VERSION"),
            args.bind,
            args.port
        );
        return;
    }

    println!("🛡️  {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("   {}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("📡 Network Configuration:");
    println!("   Listen:         {}:{}", args.bind, args.port);
    println!("   Network Prefix: /{}", config.network_prefix());
    println!();

    let rate_config = config.rate_limit_config();
    println!("⚡ Rate Limiting:");
    println!(
        "   Threshold:      {} requests per {} x {}",
        rate_config.threshold, rate_config.window_multiplier, rate_config.unit
    );
    println!(
        "   Cooldown:       {} x {}",
        rate_config.block_multiplier, rate_config.unit
    );

    let cleanup = config.rate_limit_cleanup_config();
    if cleanup.is_enabled() {
        println!(
            "   Cleanup:        above {} networks, every {} seconds at most",
            cleanup.threshold,
            cleanup.interval.as_secs()
        );
    } else {
        println!("   Cleanup:        disabled");
    }

    // Show environment configuration in verbose mode
    if args.verbose {
        print_env_config();
    }

    println!();
    println!("🚀 Server starting...");
}

/// Print environment variable configuration status (used in verbose mode)
fn print_env_config() {
    println!();
    println!("🔧 Environment Variables:");

    for &var_name in env_vars::all_env_vars() {
        match env::var(var_name) {
            Ok(value) => println!("   {:<33} = {}", var_name, value),
            Err(_) => println!("   {:<33} = [NOT SET]", var_name),
        }
    }
}

/// Accepts connections on `listener` until `shutdown` completes.
///
/// Each connection is served by its own task over HTTP/1.1 and is counted by
/// `tracker` until it closes. Once `shutdown` completes, every open
/// connection is told to finish its in-flight request and close; idle
/// keep-alive connections close at once. Returning does not wait for those
/// tasks; call [`ConnectionTracker::wait_for_shutdown`] to drain them.
pub async fn serve<C, F>(
    listener: TcpListener,
    history: RequestHistory,
    config: Arc<C>,
    clock: Arc<dyn Clock>,
    tracker: ConnectionTracker,
    shutdown: F,
) where
    C: ConfigProvider + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let (closing_tx, closing_rx) = watch::channel(());

    loop {
        let (stream, addr) = tokio::select! {
            () = &mut shutdown => {
                info!(active = tracker.count(), "Shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(error = %err, "Failed to accept connection");
                    continue;
                }
            },
        };

        debug!(client = %addr, "New connection");

        let io = TokioIo::new(stream);
        let history = history.clone();
        let config = config.clone();
        let clock = clock.clone();
        let guard = tracker.track();
        let mut closing = closing_rx.clone();

        tokio::task::spawn(async move {
            let _guard = guard;
            let service = service_fn(move |req| {
                handle_request(req, history.clone(), config.clone(), clock.clone())
            });

            let conn = http1::Builder::new().serve_connection(io, service);
            tokio::pin!(conn);

            // `changed` also resolves when the sender is dropped.
            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = closing.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };

            if let Err(err) = result {
                debug!(client = %addr, error = %err, "Connection error");
            }
        });
    }

    let _ = closing_tx.send(());
}
