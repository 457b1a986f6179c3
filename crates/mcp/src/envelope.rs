use odoo_mcp_core::OdooError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// The one shape every tool answers with: `{"success": true, "data": ..}` or
/// `{"success": false, "error": ".."}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let message =
            if message.trim().is_empty() { "unknown error".to_string() } else { message };
        Self { success: false, data: None, error: Some(message) }
    }

    /// Folds a handler outcome into an envelope, logging failures under the
    /// tool's name.
    pub fn from_result<T: Serialize>(tool: &str, result: Result<T, OdooError>) -> Self {
        match result {
            Ok(data) => match serde_json::to_value(data) {
                Ok(data) => {
                    debug!(event_name = "mcp.tool.succeeded", tool);
                    Self::ok(data)
                }
                Err(error) => {
                    warn!(event_name = "mcp.tool.serialize_failed", tool, error = %error);
                    Self::failure(format!("could not serialize result: {error}"))
                }
            },
            Err(error) => {
                warn!(
                    event_name = "mcp.tool.failed",
                    tool,
                    error_class = error.error_class(),
                    error = %error,
                    "tool call failed"
                );
                Self::failure(error.to_string())
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({"success": false, "error": "could not serialize envelope"})
        })
    }

    pub fn into_call_result(self) -> CallToolResult {
        let text = serde_json::to_string_pretty(&self.to_value())
            .unwrap_or_else(|_| r#"{"success": false, "error": "could not render"}"#.to_string());
        if self.success {
            CallToolResult::success(vec![Content::text(text)])
        } else {
            CallToolResult::error(vec![Content::text(text)])
        }
    }
}
