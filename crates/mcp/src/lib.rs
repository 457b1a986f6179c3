//! Odoo MCP (Model Context Protocol) Server
//!
//! Exposes one authenticated Odoo session to AI agents: generic record
//! access, model introspection, arbitrary method calls and a handful of
//! HR, partner, calendar and CRM helpers.
//!
//! ## Architecture
//!
//! - `OdooMcpServer`: the MCP handler, one tool per operation
//! - `handlers/`: tool implementations over [`odoo_mcp_rpc::OdooClient`]
//! - `envelope`: the `{success, data | error}` result shape
//! - `arguments`: tool arguments decoded inside the handler
//! - `resources`: `odoo://` resources
//! - `bootstrap`: config loading and session start-up
//!
//! ## Example Usage
//!
//! ```no_run
//! use odoo_mcp::bootstrap::bootstrap;
//! use odoo_mcp_core::LoadOptions;
//! use rmcp::{transport::stdio, ServiceExt};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = bootstrap(LoadOptions::default()).await?;
//!     app.server.serve(stdio()).await?.waiting().await?;
//!     Ok(())
//! }
//! ```

pub mod arguments;
pub mod bootstrap;
pub mod envelope;
pub mod handlers;
pub mod resources;
mod server;
pub mod tools;

pub use arguments::ToolArgs;
pub use envelope::Envelope;
pub use server::OdooMcpServer;
pub use tools::{ALL_TOOL_NAMES, TOTAL_TOOLS};
