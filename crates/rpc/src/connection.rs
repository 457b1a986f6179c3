use std::sync::Arc;
use std::time::Duration;

use odoo_mcp_core::{ConnectionConfig, OdooError};
use tracing::{info, warn};

use crate::client::OdooClient;
use crate::transport::JsonRpcTransport;

const MAX_REDIRECTS: usize = 5;

/// HTTP client honouring the configured timeout, TLS verification flag and
/// proxy.
pub fn http_client(config: &ConnectionConfig) -> Result<reqwest::Client, OdooError> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(concat!("odoo-mcp/", env!("CARGO_PKG_VERSION")))
        .danger_accept_invalid_certs(!config.verify_ssl);

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|error| {
            OdooError::Authentication(format!("invalid configuration: proxy `{proxy}`: {error}"))
        })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|error| {
        OdooError::Authentication(format!("transport setup failed: http client: {error}"))
    })
}

pub fn json_rpc_transport(config: &ConnectionConfig) -> Result<JsonRpcTransport, OdooError> {
    Ok(JsonRpcTransport::new(http_client(config)?, &config.url))
}

/// Opens the process-wide session against the configured server.
pub async fn connect(config: &ConnectionConfig) -> Result<OdooClient, OdooError> {
    if config.is_https() && !config.verify_ssl {
        warn!(
            event_name = "odoo.tls.verification_disabled",
            host = config.hostname(),
            "tls certificate verification is disabled"
        );
    }
    info!(
        event_name = "odoo.session.connecting",
        host = config.hostname(),
        database = %config.database,
        username = %config.username,
        timeout_secs = config.timeout_secs,
        proxy = config.proxy.is_some(),
        "connecting to odoo"
    );

    let transport = json_rpc_transport(config)?;
    OdooClient::authenticate(Arc::new(transport), config).await
}
