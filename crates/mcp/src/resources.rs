//! `odoo://` resources: the model list, one model's fields, a single record
//! and a small search.

use std::str::FromStr;

use odoo_mcp_core::{Domain, OdooError};
use odoo_mcp_rpc::{OdooClient, SearchOptions};
use rmcp::model::{AnnotateAble, RawResource, RawResourceTemplate, Resource, ResourceTemplate};
use rmcp::ErrorData as McpError;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const SCHEME: &str = "odoo://";
pub const MODELS_URI: &str = "odoo://models";
const SEARCH_LIMIT: u32 = 10;
const JSON_MIME: &str = "application/json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceUri {
    Models,
    Model(String),
    Record { model: String, id: i64 },
    Search { model: String, domain: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResourceUriError {
    #[error("unsupported resource uri `{0}`")]
    Unsupported(String),
    #[error("invalid record id `{id}` in `{uri}`")]
    InvalidId { uri: String, id: String },
    #[error("could not decode domain in `{0}`")]
    Decode(String),
}

impl FromStr for ResourceUri {
    type Err = ResourceUriError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let unsupported = || ResourceUriError::Unsupported(uri.to_string());
        let path = uri.strip_prefix(SCHEME).ok_or_else(unsupported)?;
        let (kind, rest) = path.split_once('/').unwrap_or((path, ""));

        match kind {
            "models" if rest.is_empty() => Ok(Self::Models),
            "model" if !rest.is_empty() && !rest.contains('/') => Ok(Self::Model(rest.to_string())),
            "record" => {
                let (model, id) = rest.split_once('/').ok_or_else(unsupported)?;
                if model.is_empty() {
                    return Err(unsupported());
                }
                let id = id.parse::<i64>().map_err(|_| ResourceUriError::InvalidId {
                    uri: uri.to_string(),
                    id: id.to_string(),
                })?;
                Ok(Self::Record { model: model.to_string(), id })
            }
            "search" => {
                let (model, encoded) = rest.split_once('/').ok_or_else(unsupported)?;
                if model.is_empty() || encoded.is_empty() {
                    return Err(unsupported());
                }
                let domain = urlencoding::decode(encoded)
                    .map_err(|_| ResourceUriError::Decode(uri.to_string()))?
                    .into_owned();
                Ok(Self::Search { model: model.to_string(), domain })
            }
            _ => Err(unsupported()),
        }
    }
}

pub fn static_resources() -> Vec<Resource> {
    let mut models = RawResource::new(MODELS_URI, "models");
    models.description = Some("Every model installed in the Odoo database".to_string());
    models.mime_type = Some(JSON_MIME.to_string());
    vec![models.no_annotation()]
}

pub fn resource_templates() -> Vec<ResourceTemplate> {
    [
        ("odoo://model/{model_name}", "model", "Fields and attributes of one model"),
        ("odoo://record/{model_name}/{record_id}", "record", "One record by id"),
        (
            "odoo://search/{model_name}/{domain}",
            "search",
            "Up to 10 records matching a URL-encoded domain",
        ),
    ]
    .into_iter()
    .map(|(uri_template, name, description)| {
        RawResourceTemplate {
            uri_template: uri_template.to_string(),
            name: name.to_string(),
            title: None,
            description: Some(description.to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        }
        .no_annotation()
    })
    .collect()
}

pub async fn fetch(client: &OdooClient, uri: &ResourceUri) -> Result<Value, OdooError> {
    match uri {
        ResourceUri::Models => Ok(serde_json::to_value(client.list_models().await?)
            .map_err(|error| OdooError::RemoteCall(error.to_string()))?),
        ResourceUri::Model(model) => Ok(serde_json::to_value(client.describe_model(model).await?)
            .map_err(|error| OdooError::RemoteCall(error.to_string()))?),
        ResourceUri::Record { model, id } => {
            let mut records = client.read(model, &[*id], &[]).await?;
            records
                .pop()
                .map(Value::Object)
                .ok_or_else(|| OdooError::not_found(format!("{model} record(s) {id} do not exist")))
        }
        ResourceUri::Search { model, domain } => {
            let domain = Domain::parse(domain)?;
            let options = SearchOptions::default().limit(SEARCH_LIMIT);
            let records = client.search(model, &domain, &options).await?;
            Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
        }
    }
}

/// Resolves `uri` to the text of a JSON document. Missing records and models
/// are protocol errors; any other failure is reported inside the document.
pub async fn read_resource(client: &OdooClient, uri: &str) -> Result<String, McpError> {
    let parsed = uri.parse::<ResourceUri>().map_err(|error| match error {
        ResourceUriError::Unsupported(_) => McpError::resource_not_found(error.to_string(), None),
        _ => McpError::invalid_params(error.to_string(), None),
    })?;
    debug!(event_name = "mcp.resource.read", uri);

    let document = match fetch(client, &parsed).await {
        Ok(value) => value,
        Err(error) if error.is_not_found() => {
            return Err(McpError::resource_not_found(error.to_string(), None));
        }
        Err(error) => {
            warn!(
                event_name = "mcp.resource.failed",
                uri,
                error_class = error.error_class(),
                error = %error
            );
            json!({ "error": error.to_string() })
        }
    };
    serde_json::to_string_pretty(&document)
        .map_err(|error| McpError::internal_error(error.to_string(), None))
}
