use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use http::JsonRpcTransport;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{FieldSpec, InMemoryOdoo, MethodHandler};

/// An exception raised on the Odoo side and reported back over the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFault {
    /// Fully qualified exception name, e.g. `odoo.exceptions.MissingError`.
    pub name: Option<String>,
    pub message: String,
}

impl RemoteFault {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: Some(name.into()), message: message.into() }
    }

    /// Matches on the unqualified exception name.
    pub fn is(&self, short_name: &str) -> bool {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('.').next())
            .map(|name| name == short_name)
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not reach {endpoint}: {message}")]
    Connect { endpoint: String, message: String },
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },
    #[error("{endpoint} answered with HTTP status {status}")]
    Http { endpoint: String, status: u16 },
    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("{}", .0.message)]
    Fault(RemoteFault),
}

/// One remote procedure call against an Odoo service (`common` or `object`).
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(
        &self,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::{RemoteFault, TransportError};

    #[test]
    fn fault_matches_unqualified_exception_name() {
        let fault = RemoteFault::new("odoo.exceptions.MissingError", "gone");
        assert!(fault.is("MissingError"));
        assert!(!fault.is("ValidationError"));

        let anonymous = RemoteFault { name: None, message: "boom".to_string() };
        assert!(!anonymous.is("MissingError"));
    }

    #[test]
    fn fault_display_is_the_remote_message() {
        let error = TransportError::Fault(RemoteFault::new(
            "odoo.exceptions.ValidationError",
            "Email must be unique",
        ));
        assert_eq!(error.to_string(), "Email must be unique");
    }
}
