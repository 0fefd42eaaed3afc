//! Shared utilities for demos.
//!
//! - Command-line argument parsing
//! - Logging initialization

#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// Default chromedriver / geckodriver endpoint.
pub const DEFAULT_REMOTE: &str = "http://localhost:9515";

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub headless: bool,
    pub firefox: bool,
    pub remote: String,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let remote = args
            .iter()
            .position(|a| a == "--remote")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string());
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            headless: args.iter().any(|a| a == "--headless"),
            firefox: args.iter().any(|a| a == "--firefox"),
            remote,
        }
    }
}

/// Initialize tracing. `RUST_LOG` overrides the default filter.
pub fn init_logging(debug: bool) {
    let fallback = if debug {
        "resilient_ui=debug"
    } else {
        "resilient_ui=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
