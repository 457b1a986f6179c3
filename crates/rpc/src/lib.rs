//! Session-holding client for Odoo's external API.
//!
//! [`OdooClient`] owns one authenticated session and exposes typed model
//! operations. Calls go through the [`RpcTransport`] seam: the JSON-RPC
//! transport talks HTTP to a live server. With the `test-util` feature,
//! `InMemoryOdoo` answers from process memory for tests.

pub mod client;
pub mod connection;
pub mod records;
pub mod transport;

pub use client::{
    server_version, FieldDefinition, ModelDescription, ModelSummary, OdooClient, SearchOptions,
    Session,
};
pub use connection::{connect, http_client, json_rpc_transport};
pub use records::Record;
pub use transport::{JsonRpcTransport, RemoteFault, RpcTransport, TransportError};
#[cfg(any(test, feature = "test-util"))]
pub use transport::{FieldSpec, InMemoryOdoo};
