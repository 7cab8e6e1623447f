//! Command line argument parsing for CidrGate.
//!
//! This module defines the CLI interface using [`clap`] for argument parsing.
//! The listener address falls back to the `HOST` and `PORT` environment
//! variables, then to `0.0.0.0:8000`. `HOST` may be a host name.
//!
//! # Example
//!
//! ```no_run
//! use cidrgate::args::Args;
//! use clap::Parser;
//!
//! let args = Args::parse();
//! if let Err(e) = args.validate() {
//!     eprintln!("Configuration error: {}", e);
//!     std::process::exit(1);
//! }
//! ```

use std::net::{IpAddr, SocketAddr};

use clap::Parser;

/// Command line arguments for CidrGate.
///
/// Arguments can be provided via command line flags or environment variables.
///
/// # Fields
///
/// * `bind` - Address to listen on (default: "0.0.0.0")
/// * `port` - Port to listen on (default: 8000)
/// * `verbose` - Enable detailed configuration output
/// * `quiet` - Suppress non-essential output (conflicts with verbose)
/// * `json_logs` - Output logs in JSON format for structured logging
#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Rate limits HTTP clients by the network block they come from.\nThe client address is the first X-Forwarded-For entry; every address in the\nsame /NETWORK_PREFIX block shares one budget.\n\nExample usage:\n  cidrgate --port 8000\n  NETWORK_PREFIX=16 NUMBER_OF_REQUESTS=500 cidrgate -b 127.0.0.1 -p 9000 --verbose"
)]
#[command(
    after_help = "Environment variables:\n  NETWORK_PREFIX                    Prefix length that groups addresses (default: 24)\n  NUMBER_OF_REQUESTS                Requests per window before cooldown (default: 100)\n  UNIT_TIME                         Second, Minute or Hour (default: Minute)\n  LIMIT_TIME                        Window length in UNIT_TIME (default: 1)\n  WAIT_TIME                         Cooldown length in UNIT_TIME (default: 2)\n  RATE_LIMIT_CLEANUP_THRESHOLD      Tracked networks before sweeping (default: 10000, 0 = off)\n  RATE_LIMIT_CLEANUP_INTERVAL_SECS  Minimum seconds between sweeps (default: 60)\n  HOST / PORT                       Listener address (default: 0.0.0.0:8000)"
)]
pub struct Args {
    /// Address to listen on
    #[arg(
        long,
        short = 'b',
        help = "Bind address (IP address or host name) for incoming connections",
        value_name = "ADDRESS",
        env = "HOST",
        default_value = cidrgate_core::defaults::HOST
    )]
    pub bind: String,

    /// Port to listen on
    #[arg(
        long,
        short = 'p',
        help = "Listen port for incoming connections",
        value_name = "PORT",
        env = "PORT",
        default_value_t = cidrgate_core::defaults::PORT
    )]
    pub port: u16,

    /// Enable verbose output
    #[arg(
        long,
        short = 'v',
        help = "Show detailed configuration and startup information"
    )]
    pub verbose: bool,

    /// Enable quiet mode (minimal output)
    #[arg(
        long,
        short = 'q',
        help = "Suppress configuration output, show only essential messages",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output logs in JSON format (for structured logging)
    #[arg(long, help = "Output logs in JSON format for structured logging")]
    pub json_logs: bool,
}

impl Args {
    /// Validates the parsed command line arguments.
    ///
    /// Performs the following validations:
    /// - Port must be greater than 0
    /// - Bind address must be a non-empty host name or IP address
    ///
    /// # Example
    ///
    /// ```
    /// use cidrgate::args::Args;
    /// use clap::Parser;
    ///
    /// let args = Args::try_parse_from(["cidrgate", "-b", "", "-p", "9000"]).unwrap();
    /// assert!(args.validate().is_err());
    ///
    /// let args = Args::try_parse_from(["cidrgate", "-b", "localhost", "-p", "9000"]).unwrap();
    /// assert!(args.validate().is_ok());
    ///
    /// let args = Args::try_parse_from(["cidrgate", "-b", "127.0.0.1", "-p", "9000"]).unwrap();
    /// assert!(args.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port must be greater than 0".to_string());
        }

        if self.bind.is_empty() || self.bind.chars().any(char::is_whitespace) {
            return Err(format!("Invalid bind address: '{}'", self.bind));
        }

        Ok(())
    }

    /// Resolves the bind address to the socket address to listen on.
    ///
    /// IP literals are used as is; host names such as `localhost` are
    /// resolved and the first address wins.
    pub async fn resolve_bind_addr(&self) -> Result<SocketAddr, String> {
        if let Ok(ip) = self.bind.parse::<IpAddr>() {
            return Ok(SocketAddr::from((ip, self.port)));
        }

        tokio::net::lookup_host((self.bind.as_str(), self.port))
            .await
            .map_err(|err| format!("Cannot resolve bind address '{}': {err}", self.bind))?
            .next()
            .ok_or_else(|| format!("Bind address '{}' resolves to nothing", self.bind))
    }
}
