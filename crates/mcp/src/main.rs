//! Odoo MCP Server Binary
//!
//! Speaks MCP over stdio; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Configuration from ./odoo_config.json or ~/.config/odoo/config.json
//! odoo-mcp
//!
//! # Explicit file
//! odoo-mcp --config /etc/odoo/mcp.toml
//!
//! # Environment only
//! ODOO_URL=https://erp.example.com ODOO_DB=prod ODOO_USERNAME=bot \
//!   ODOO_PASSWORD=api-key odoo-mcp
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use odoo_mcp::bootstrap::{bootstrap_with_config, load_config};
use odoo_mcp_core::config::{AppConfig, LoadOptions};
use rmcp::{transport::stdio, ServiceExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "odoo-mcp", version, about = "MCP server for an Odoo instance over stdio")]
struct Args {
    #[arg(long, env = "ODOO_CONFIG", help = "Path to a JSON or TOML config file")]
    config: Option<PathBuf>,
}

fn init_logging(config: &AppConfig) {
    use odoo_mcp_core::config::LogFormat::*;

    // stdout carries the protocol
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let require_file = args.config.is_some();
    let config = load_config(LoadOptions {
        config_path: args.config,
        require_file,
        ..LoadOptions::default()
    })?;
    init_logging(&config);

    let app = bootstrap_with_config(config).await?;
    info!(
        event_name = "system.server.started",
        tools = odoo_mcp::TOTAL_TOOLS,
        "odoo-mcp serving on stdio"
    );

    let service = app.server.serve(stdio()).await?;
    service.waiting().await?;

    info!(event_name = "system.server.stopped", "odoo-mcp shut down");
    Ok(())
}
