pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "odoo-mcp-ctl",
    about = "odoo-mcp operator CLI",
    long_about = "Check Odoo connectivity and credentials, and inspect the effective odoo-mcp configuration.",
    after_help = "Examples:\n  odoo-mcp-ctl doctor --json\n  odoo-mcp-ctl config\n  odoo-mcp-ctl --config odoo_config.json version"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a JSON or TOML config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, endpoint reachability and authentication")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Report the Odoo server version without logging in")]
    Version,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = commands::load_options(cli.config);

    let result = match cli.command {
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json),
        Command::Version => commands::version::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
