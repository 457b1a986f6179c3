use odoo_mcp_core::{Domain, OdooError};
use odoo_mcp_rpc::{ModelDescription, OdooClient, Record, SearchOptions};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::require_text;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRecordsInput {
    #[schemars(description = "Technical model name, e.g. res.partner")]
    pub model: String,

    #[schemars(description = "Filter as [[field, operator, value], ...], \
        {\"conditions\": [{\"field\", \"operator\", \"value\"}]} or JSON text of either. \
        Conditions are combined with AND; omit to match every record")]
    #[serde(default)]
    pub domain: Option<Value>,

    #[schemars(description = "Fields to return; omit for the model's default fields")]
    #[serde(default)]
    pub fields: Option<Vec<String>>,

    #[schemars(description = "Maximum number of records")]
    #[serde(default)]
    pub limit: Option<u32>,

    #[schemars(description = "Number of records to skip")]
    #[serde(default)]
    pub offset: Option<u32>,

    #[schemars(description = "Sort order, e.g. \"name asc, id desc\"")]
    #[serde(default)]
    pub order: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadRecordsInput {
    #[schemars(description = "Technical model name")]
    pub model: String,

    #[schemars(description = "Record ids; every id must exist")]
    pub ids: Vec<i64>,

    #[schemars(description = "Fields to return; omit for the model's default fields")]
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRecordInput {
    #[schemars(description = "Technical model name")]
    pub model: String,

    #[schemars(description = "Field values for the new record")]
    pub values: Map<String, Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateRecordInput {
    #[schemars(description = "Technical model name")]
    pub model: String,

    #[schemars(description = "Id of the record to update")]
    pub id: i64,

    #[schemars(description = "Field values to write")]
    pub values: Map<String, Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteRecordInput {
    #[schemars(description = "Technical model name")]
    pub model: String,

    #[schemars(description = "Id of the record to delete")]
    pub id: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteMethodInput {
    #[schemars(description = "Technical model name")]
    pub model: String,

    #[schemars(description = "Method to call on the model")]
    pub method: String,

    #[schemars(description = "Positional arguments")]
    #[serde(default)]
    pub args: Option<Vec<Value>>,

    #[schemars(description = "Keyword arguments")]
    #[serde(default)]
    pub kwargs: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModelInput {
    #[schemars(description = "Technical model name, e.g. crm.lead")]
    pub model: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreatedRecord {
    pub id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdatedRecord {
    pub id: i64,
    pub updated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeletedRecord {
    pub id: i64,
    pub deleted: bool,
}

pub async fn search_records(
    client: &OdooClient,
    input: SearchRecordsInput,
) -> Result<Vec<Record>, OdooError> {
    let model = require_text("model", &input.model)?;
    let domain = match input.domain {
        None | Some(Value::Null) => Domain::match_all(),
        Some(raw) => Domain::from_value(raw)?,
    };
    let options = SearchOptions {
        fields: input.fields.unwrap_or_default(),
        limit: input.limit,
        offset: input.offset,
        order: input.order.filter(|order| !order.trim().is_empty()),
    };

    client.search(&model, &domain, &options).await
}

pub async fn read_records(
    client: &OdooClient,
    input: ReadRecordsInput,
) -> Result<Vec<Record>, OdooError> {
    let model = require_text("model", &input.model)?;
    client.read(&model, &input.ids, &input.fields.unwrap_or_default()).await
}

pub async fn create_record(
    client: &OdooClient,
    input: CreateRecordInput,
) -> Result<CreatedRecord, OdooError> {
    let model = require_text("model", &input.model)?;
    if input.values.is_empty() {
        return Err(OdooError::validation("values must contain at least one field"));
    }
    let id = client.create(&model, input.values).await?;
    Ok(CreatedRecord { id })
}

pub async fn update_record(
    client: &OdooClient,
    input: UpdateRecordInput,
) -> Result<UpdatedRecord, OdooError> {
    let model = require_text("model", &input.model)?;
    if input.values.is_empty() {
        return Err(OdooError::validation("values must contain at least one field"));
    }
    let updated = client.update(&model, input.id, input.values).await?;
    Ok(UpdatedRecord { id: input.id, updated })
}

pub async fn delete_record(
    client: &OdooClient,
    input: DeleteRecordInput,
) -> Result<DeletedRecord, OdooError> {
    let model = require_text("model", &input.model)?;
    let deleted = client.delete(&model, input.id).await?;
    Ok(DeletedRecord { id: input.id, deleted })
}

pub async fn execute_method(
    client: &OdooClient,
    input: ExecuteMethodInput,
) -> Result<Value, OdooError> {
    info!(
        event_name = "mcp.execute_method",
        model = %input.model,
        method = %input.method,
        "executing model method"
    );
    client
        .execute_method(
            &input.model,
            &input.method,
            input.args.unwrap_or_default(),
            input.kwargs.unwrap_or_default(),
        )
        .await
}

pub async fn get_model_fields(
    client: &OdooClient,
    input: ModelInput,
) -> Result<ModelDescription, OdooError> {
    let model = require_text("model", &input.model)?;
    client.describe_model(&model).await
}
