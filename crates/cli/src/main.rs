use std::process::ExitCode;

fn main() -> ExitCode {
    odoo_mcp_cli::run()
}
