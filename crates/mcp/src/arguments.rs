use std::borrow::Cow;

use odoo_mcp_core::OdooError;
use rmcp::schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Tool arguments whose decoding is deferred to the handler, so a missing or
/// mistyped field ends up in the envelope instead of failing the request.
///
/// The advertised input schema is the one of `T`.
#[derive(Debug)]
pub struct ToolArgs<T>(Result<T, String>);

impl<T> ToolArgs<T> {
    pub fn into_input(self) -> Result<T, OdooError> {
        self.0.map_err(|message| OdooError::validation(format!("invalid arguments: {message}")))
    }
}

impl<T> From<T> for ToolArgs<T> {
    fn from(input: T) -> Self {
        Self(Ok(input))
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ToolArgs<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(serde_json::from_value(value).map_err(|error| error.to_string())))
    }
}

impl<T: JsonSchema> JsonSchema for ToolArgs<T> {
    fn schema_name() -> Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        T::json_schema(generator)
    }
}
