//! # minuta CLI Module
//!
//! This module implements the CLI interface for minuta.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP JSON API
//! - `status` - Show catalog and override counters
//! - `analyze` - Analyze a menu for one or every school level
//! - `save` - Save a batch of edited weights for a (menu, level)
//! - `reset` - Discard the saved overrides of a (menu, level)
//! - `weekly` - Validate a week of menus against a modality's rules
//! - `init` - Create (or compact) the override database

mod commands;

use crate::config::{Backend, MinutaConfig};
use clap::{Parser, Subcommand};
use minuta_core::MinutaError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// minuta - nutritional menu analysis
///
/// Computes nutrient adequacy of school-feeding menus per school level and
/// validates weekly food-group frequency rules.
#[derive(Parser, Debug)]
#[command(name = "minuta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a minuta.toml configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the catalog JSON document
    #[arg(short = 'C', long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Path to the override database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Override backend
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (default from configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default from configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show catalog and override counters
    Status,

    /// Analyze a menu
    Analyze {
        /// Menu id
        #[arg(short, long)]
        menu: u64,

        /// School level id; every level when omitted
        #[arg(short, long)]
        level: Option<u64>,
    },

    /// Save edited ingredient weights
    Save {
        /// Menu id
        #[arg(short, long)]
        menu: u64,

        /// School level id
        #[arg(short, long)]
        level: u64,

        /// JSON file with `[{preparation, ingredient, net_weight}, ...]`
        #[arg(short, long)]
        file: PathBuf,

        /// Editor recorded on the summary
        #[arg(short, long)]
        user: String,
    },

    /// Discard saved overrides
    Reset {
        /// Menu id
        #[arg(short, long)]
        menu: u64,

        /// School level id
        #[arg(short, long)]
        level: u64,
    },

    /// Validate a week of menus
    Weekly {
        /// Modality id
        #[arg(short = 'M', long)]
        modality: u64,

        /// Day menus in order, comma-separated (Monday first)
        #[arg(short, long, value_delimiter = ',', required = true)]
        menus: Vec<u64>,
    },

    /// Create the override database
    Init {
        /// Delete an existing database first
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), MinutaError> {
    let config = MinutaConfig::load(cli.config.as_deref())?.with_overrides(
        cli.catalog,
        cli.database,
        cli.backend,
    );
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(config, host, port).await,
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Analyze { menu, level }) => cmd_analyze(&config, json_mode, menu, level),
        Some(Commands::Save {
            menu,
            level,
            file,
            user,
        }) => cmd_save(&config, json_mode, menu, level, &file, &user),
        Some(Commands::Reset { menu, level }) => cmd_reset(&config, json_mode, menu, level),
        Some(Commands::Weekly { modality, menus }) => {
            cmd_weekly(&config, json_mode, modality, &menus)
        }
        Some(Commands::Init { force }) => cmd_init(&config, force),
    }
}
