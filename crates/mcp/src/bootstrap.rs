use std::sync::Arc;

use odoo_mcp_core::config::{AppConfig, ConfigError, LoadOptions};
use odoo_mcp_core::OdooError;
use thiserror::Error;
use tracing::info;

use crate::server::OdooMcpServer;

pub struct Application {
    pub config: AppConfig,
    pub server: OdooMcpServer,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("odoo connection failed: {0}")]
    Connect(#[source] OdooError),
}

pub fn load_config(options: LoadOptions) -> Result<AppConfig, BootstrapError> {
    Ok(AppConfig::load(options)?)
}

/// Authenticates against the configured server and builds the MCP handler
/// around the resulting session.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        host = config.odoo.hostname(),
        database = %config.odoo.database,
        "starting odoo-mcp bootstrap"
    );

    let client = odoo_mcp_rpc::connect(&config.odoo).await.map_err(BootstrapError::Connect)?;
    info!(
        event_name = "system.bootstrap.session_ready",
        uid = client.uid(),
        "odoo session established"
    );

    Ok(Application { config, server: OdooMcpServer::new(Arc::new(client)) })
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = load_config(options)?;
    bootstrap_with_config(config).await
}
