//! # Ampere - Network Compiler
//!
//! The main binary for the Ampere series/parallel network compiler.
//!
//! This application provides:
//! - HTTP REST API server holding a live schematic (axum-based)
//! - CLI interface for editing and compiling schematic files
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/ampere (THE BINARY)           │
//! │                                               │
//! │   ┌─────────────┐        ┌─────────────┐      │
//! │   │    CLI      │        │  HTTP API   │      │
//! │   │   (clap)    │        │   (axum)    │      │
//! │   └──────┬──────┘        └──────┬──────┘      │
//! │          └───────────┬──────────┘             │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │  ampere-core  │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Write the demo network and compile it
//! ampere init
//! ampere compile
//!
//! # Serve it over HTTP
//! ampere server --host 0.0.0.0 --port 8080
//! ```

use ampere::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // AMPERE_LOG_FORMAT=json switches to machine-parseable logs.
    let log_format = std::env::var("AMPERE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ampere=info,ampere_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
     _
    / \   _ __ ___  _ __   ___ _ __ ___
   / _ \ | '_ ` _ \| '_ \ / _ \ '__/ _ \
  / ___ \| | | | | | |_) |  __/ | |  __/
 /_/   \_\_| |_| |_| .__/ \___|_|  \___|
                   |_|

  Network Compiler v{}

  Series • Parallel • Solved
"#,
        env!("CARGO_PKG_VERSION")
    );
}
