use odoo_mcp_core::config::{AppConfig, LoadOptions};
use odoo_mcp_core::OdooError;
use odoo_mcp_rpc::{json_rpc_transport, server_version, RpcTransport};
use serde_json::Value;

use super::CommandResult;

const COMMAND: &str = "version";

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let transport = match json_rpc_transport(&config.odoo) {
        Ok(transport) => transport,
        Err(error) => {
            return CommandResult::failure(COMMAND, error.error_class(), error.to_string(), 3)
        }
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    match runtime.block_on(describe_server(&transport)) {
        Ok(description) => {
            CommandResult::success(COMMAND, format!("{description} at {}", config.odoo.url))
        }
        Err(error) => CommandResult::failure(COMMAND, error.error_class(), error.to_string(), 3),
    }
}

/// `Odoo <server_version>` from `common.version`.
pub async fn describe_server(transport: &dyn RpcTransport) -> Result<String, OdooError> {
    let info = server_version(transport).await?;
    let version = info.get("server_version").and_then(Value::as_str).unwrap_or("unknown");
    Ok(format!("Odoo {version}"))
}
