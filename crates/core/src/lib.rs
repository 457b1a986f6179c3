pub mod config;
pub mod domain;
pub mod errors;

pub use config::{AppConfig, ConfigError, ConfigOverrides, ConnectionConfig, LoadOptions};
pub use domain::{Condition, Domain, DomainInput};
pub use errors::OdooError;
