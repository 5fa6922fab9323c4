//! # Ampere CLI Module
//!
//! Command-line access to schematic files.
//!
//! ## Available Commands
//!
//! - `init` - Write the demo schematic
//! - `status` - Summarize the schematic
//! - `compile` - Compile and print resistance, voltage and current
//! - `add-resistor` / `add-cell` - Add a component
//! - `connect` / `disconnect` - Edit connections
//! - `set` - Change a component's value or facing
//! - `remove` - Remove a component
//! - `head` - Designate the head component
//! - `server` - Serve the schematic over HTTP

mod commands;

use crate::config::Config;
use ampere_core::{AmpereError, ComponentUpdate, Orientation};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Ampere - series/parallel network compiler
///
/// Decomposes a schematic of resistors and cells into series and parallel
/// blocks and solves it for resistance, voltage and current.
#[derive(Parser, Debug)]
#[command(name = "ampere")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Schematic file (overrides AMPERE_SCHEMATIC and the config file;
    /// default: schematic.json)
    #[arg(short = 'S', long, global = true)]
    pub schematic: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'C', long, global = true, default_value = "ampere.toml")]
    pub config: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the demo schematic to the schematic file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Summarize the schematic
    Status,

    /// Compile the schematic and print the solved network
    Compile,

    /// Add a resistor
    AddResistor {
        /// Resistance in ohms
        #[arg(long, default_value_t = ampere_core::primitives::DEFAULT_RESISTANCE)]
        ohms: f64,

        /// Identifier (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Add a cell (voltage source)
    AddCell {
        /// Voltage in volts
        #[arg(long, default_value_t = ampere_core::primitives::DEFAULT_VOLTAGE)]
        volts: f64,

        /// Identifier (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Connect two components
    Connect {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Remove a connection
    Disconnect {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Change a component's value or facing
    Set {
        #[arg(long)]
        id: String,

        /// New resistance (resistors only)
        #[arg(long, conflicts_with = "volts")]
        ohms: Option<f64>,

        /// New voltage (cells only)
        #[arg(long)]
        volts: Option<f64>,

        /// New facing: N, E, S or W
        #[arg(long)]
        orientation: Option<Orientation>,
    },

    /// Remove a component and its connections
    Remove {
        #[arg(long)]
        id: String,
    },

    /// Designate the head component
    Head {
        #[arg(long)]
        id: String,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file, then environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<Config, AmpereError> {
    let mut config = Config::load(&cli.config)?;
    config.apply_env();
    if let Some(path) = &cli.schematic {
        config.schematic.path.clone_from(path);
    }
    if let Some(Commands::Server { host, port }) = &cli.command {
        if let Some(host) = host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AmpereError> {
    let config = resolve_config(&cli)?;
    let path = config.schematic.path.as_path();
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(
            schematic = %path.display(),
            address = %config.bind_address(),
            "resolved configuration"
        );
    }

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(path, force, json_mode),
        Some(Commands::Status) | None => cmd_status(path, json_mode, cli.verbose),
        Some(Commands::Compile) => cmd_compile(path, json_mode),
        Some(Commands::AddResistor { ohms, id }) => {
            cmd_add(path, json_mode, ampere_core::Component::resistor(ohms), id)
        }
        Some(Commands::AddCell { volts, id }) => {
            cmd_add(path, json_mode, ampere_core::Component::cell(volts), id)
        }
        Some(Commands::Connect { from, to }) => cmd_connect(path, json_mode, &from, &to),
        Some(Commands::Disconnect { from, to }) => cmd_disconnect(path, json_mode, &from, &to),
        Some(Commands::Set {
            id,
            ohms,
            volts,
            orientation,
        }) => {
            let update = ComponentUpdate {
                resistance: ohms,
                voltage: volts,
                orientation,
                position: None,
            };
            cmd_set(path, json_mode, &id, &update)
        }
        Some(Commands::Remove { id }) => cmd_remove(path, json_mode, &id),
        Some(Commands::Head { id }) => cmd_head(path, json_mode, &id),
        Some(Commands::Server { .. }) => cmd_server(&config).await,
    }
}
