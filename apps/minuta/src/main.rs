//! # minuta
//!
//! The main binary for the minuta nutritional menu analysis engine.
//!
//! This application provides:
//! - CLI interface for analyses, saved weights and weekly validation
//! - HTTP JSON API server (axum-based)
//!
//! ## Usage
//!
//! ```bash
//! # Analyze menu 12 for every school level
//! minuta --catalog catalogo.json analyze --menu 12
//!
//! # Validate a week
//! minuta weekly --modality 2 --menus 12,13,14,15,16
//!
//! # Start the HTTP server
//! minuta --config minuta.toml server --port 8080
//! ```

use clap::Parser;
use minuta::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // MINUTA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("MINUTA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "minuta=info,minuta_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
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
  minuta v{}
  análisis nutricional de minutas escolares
"#,
        env!("CARGO_PKG_VERSION")
    );
}
