use std::sync::Arc;

use odoo_mcp_core::{ConnectionConfig, Domain, OdooError};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::records::{self, Record};
use crate::transport::{RpcTransport, TransportError};

const FIELD_ATTRIBUTES: &[&str] = &["string", "type", "required", "readonly", "relation"];

/// Authenticated identity, fixed for the lifetime of the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    pub uid: i64,
    pub database: String,
    pub username: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub order: Option<String>,
}

impl SearchOptions {
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelDescription {
    pub model: String,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// How a remote fault is interpreted depends on what the call was doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Search,
    Read,
    Write,
    Delete,
    Passthrough,
}

fn classify(operation: Operation, error: TransportError) -> OdooError {
    let fault = match error {
        TransportError::Fault(fault) => fault,
        other => return OdooError::RemoteCall(other.to_string()),
    };

    if operation == Operation::Passthrough {
        return OdooError::RemoteCall(fault.message);
    }
    if fault.is("AccessDenied") {
        return OdooError::Authentication(fault.message);
    }
    match operation {
        Operation::Read | Operation::Write | Operation::Delete if fault.is("MissingError") => {
            OdooError::NotFound(fault.message)
        }
        Operation::Write if fault.is("ValidationError") || fault.is("UserError") => {
            OdooError::Validation(fault.message)
        }
        _ => OdooError::RemoteCall(fault.message),
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

fn expect_records(model: &str, value: Value) -> Result<Vec<Record>, OdooError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(OdooError::RemoteCall(format!(
                "{model}: expected a list of records, got `{other}`"
            )));
        }
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            other => Err(OdooError::RemoteCall(format!(
                "{model}: expected a record object, got `{other}`"
            ))),
        })
        .collect()
}

/// `common.version`; needs no credentials.
pub async fn server_version(transport: &dyn RpcTransport) -> Result<Value, OdooError> {
    transport
        .call("common", "version", Vec::new())
        .await
        .map_err(|error| OdooError::RemoteCall(error.to_string()))
}

/// Typed operations over an authenticated Odoo session.
pub struct OdooClient {
    transport: Arc<dyn RpcTransport>,
    password: SecretString,
    session: Session,
}

impl std::fmt::Debug for OdooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooClient").field("session", &self.session).finish_non_exhaustive()
    }
}

impl OdooClient {
    /// Logs in with the configured credentials. Bad credentials, an
    /// unreachable host and TLS failures all surface as
    /// [`OdooError::Authentication`].
    pub async fn authenticate(
        transport: Arc<dyn RpcTransport>,
        config: &ConnectionConfig,
    ) -> Result<Self, OdooError> {
        let args = vec![
            json!(config.database),
            json!(config.username),
            json!(config.password.expose_secret()),
            json!({}),
        ];
        let response = transport.call("common", "authenticate", args).await.map_err(|error| {
            OdooError::Authentication(format!(
                "could not authenticate `{}` on database `{}` at {}: {error}",
                config.username, config.database, config.url
            ))
        })?;

        let uid = match response {
            Value::Number(uid) => uid.as_i64(),
            _ => None,
        }
        .filter(|uid| *uid > 0)
        .ok_or_else(|| {
            OdooError::Authentication(format!(
                "invalid credentials for `{}` on database `{}`",
                config.username, config.database
            ))
        })?;

        info!(
            event_name = "odoo.session.opened",
            host = config.hostname(),
            database = %config.database,
            uid,
            "authenticated against odoo"
        );

        Ok(Self {
            transport,
            password: config.password.clone(),
            session: Session {
                uid,
                database: config.database.clone(),
                username: config.username.clone(),
            },
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn uid(&self) -> i64 {
        self.session.uid
    }

    pub async fn server_version(&self) -> Result<Value, OdooError> {
        server_version(self.transport.as_ref()).await
    }

    async fn execute_kw(
        &self,
        operation: Operation,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, OdooError> {
        debug!(event_name = "odoo.rpc.call", model, method);
        let params = vec![
            json!(self.session.database),
            json!(self.session.uid),
            json!(self.password.expose_secret()),
            json!(model),
            json!(method),
            Value::Array(args),
            Value::Object(kwargs),
        ];

        self.transport.call("object", "execute_kw", params).await.map_err(|error| {
            let error = classify(operation, error);
            warn!(
                event_name = "odoo.rpc.failed",
                model,
                method,
                error_class = error.error_class(),
                error = %error,
                "odoo call failed"
            );
            error
        })
    }

    pub async fn list_models(&self) -> Result<Vec<ModelSummary>, OdooError> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".into(), json!(["model", "name"]));
        kwargs.insert("order".into(), json!("model"));
        let value =
            self.execute_kw(Operation::Search, "ir.model", "search_read", vec![json!([])], kwargs)
                .await?;

        Ok(expect_records("ir.model", value)?
            .into_iter()
            .filter_map(|record| {
                Some(ModelSummary {
                    model: records::text_field(&record, "model")?,
                    name: records::text_field(&record, "name").unwrap_or_default(),
                })
            })
            .collect())
    }

    /// Field definitions, limited to attributes every Odoo version reports.
    pub async fn describe_model(&self, model: &str) -> Result<ModelDescription, OdooError> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".into(), json!(["model", "name"]));
        kwargs.insert("limit".into(), json!(1));
        let found = self
            .execute_kw(
                Operation::Search,
                "ir.model",
                "search_read",
                vec![json!([["model", "=", model]])],
                kwargs,
            )
            .await?;
        let summary = expect_records("ir.model", found)?
            .into_iter()
            .next()
            .ok_or_else(|| OdooError::NotFound(format!("model `{model}` does not exist")))?;

        let mut kwargs = Map::new();
        kwargs.insert("attributes".into(), json!(FIELD_ATTRIBUTES));
        let value =
            self.execute_kw(Operation::Read, model, "fields_get", Vec::new(), kwargs).await?;
        let raw_fields = match value {
            Value::Object(raw_fields) => raw_fields,
            other => {
                return Err(OdooError::RemoteCall(format!(
                    "{model}: fields_get returned `{other}` instead of an object"
                )));
            }
        };

        let mut fields: Vec<FieldDefinition> = raw_fields
            .into_iter()
            .map(|(name, attributes)| parse_field(name, &attributes))
            .collect();
        fields.sort_by(|left, right| left.name.cmp(&right.name));

        Ok(ModelDescription {
            model: model.to_string(),
            name: records::text_field(&summary, "name").unwrap_or_else(|| model.to_string()),
            fields,
        })
    }

    pub async fn search(
        &self,
        model: &str,
        domain: &Domain,
        options: &SearchOptions,
    ) -> Result<Vec<Record>, OdooError> {
        let value = self
            .execute_kw(
                Operation::Search,
                model,
                "search_read",
                vec![domain.to_value()],
                search_kwargs(options),
            )
            .await?;
        expect_records(model, value)
    }

    pub async fn search_ids(
        &self,
        model: &str,
        domain: &Domain,
        options: &SearchOptions,
    ) -> Result<Vec<i64>, OdooError> {
        let mut kwargs = search_kwargs(options);
        kwargs.remove("fields");
        let value = self
            .execute_kw(Operation::Search, model, "search", vec![domain.to_value()], kwargs)
            .await?;
        match value {
            Value::Array(ids) => Ok(ids.iter().filter_map(Value::as_i64).collect()),
            other => Err(OdooError::RemoteCall(format!(
                "{model}: search returned `{other}` instead of an id list"
            ))),
        }
    }

    pub async fn search_count(&self, model: &str, domain: &Domain) -> Result<u64, OdooError> {
        let value = self
            .execute_kw(
                Operation::Search,
                model,
                "search_count",
                vec![domain.to_value()],
                Map::new(),
            )
            .await?;
        value.as_u64().ok_or_else(|| {
            OdooError::RemoteCall(format!("{model}: search_count returned `{value}`"))
        })
    }

    /// All requested ids must exist; there is no partial result.
    pub async fn read(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[String],
    ) -> Result<Vec<Record>, OdooError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut kwargs = Map::new();
        if !fields.is_empty() {
            kwargs.insert("fields".into(), json!(fields));
        }
        let value = self
            .execute_kw(Operation::Read, model, "read", vec![json!(ids)], kwargs)
            .await
            .map_err(|error| match error {
                OdooError::NotFound(_) => missing_records(model, ids),
                other => other,
            })?;

        let found = expect_records(model, value)?;
        let missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !found.iter().any(|record| records::record_id(record) == Some(*id)))
            .collect();
        if !missing.is_empty() {
            return Err(missing_records(model, &missing));
        }
        Ok(found)
    }

    pub async fn create(&self, model: &str, values: Map<String, Value>) -> Result<i64, OdooError> {
        let value = self
            .execute_kw(Operation::Write, model, "create", vec![Value::Object(values)], Map::new())
            .await?;
        let id = records::created_id(&value).ok_or_else(|| {
            OdooError::RemoteCall(format!("{model}: create returned `{value}` instead of an id"))
        })?;
        info!(event_name = "odoo.record.created", model, id, "record created");
        Ok(id)
    }

    pub async fn update(
        &self,
        model: &str,
        id: i64,
        values: Map<String, Value>,
    ) -> Result<bool, OdooError> {
        let value = self
            .execute_kw(
                Operation::Write,
                model,
                "write",
                vec![json!([id]), Value::Object(values)],
                Map::new(),
            )
            .await?;
        info!(event_name = "odoo.record.updated", model, id, "record updated");
        Ok(value.as_bool().unwrap_or(true))
    }

    pub async fn delete(&self, model: &str, id: i64) -> Result<bool, OdooError> {
        let value = self
            .execute_kw(Operation::Delete, model, "unlink", vec![json!([id])], Map::new())
            .await?;
        info!(event_name = "odoo.record.deleted", model, id, "record deleted");
        Ok(value.as_bool().unwrap_or(true))
    }

    /// `name_search`: `(id, display_name)` pairs in the model's default order.
    pub async fn name_search(
        &self,
        model: &str,
        name: &str,
        limit: u32,
    ) -> Result<Vec<(i64, String)>, OdooError> {
        let mut kwargs = Map::new();
        kwargs.insert("name".into(), json!(name));
        kwargs.insert("limit".into(), json!(limit));
        let value =
            self.execute_kw(Operation::Search, model, "name_search", Vec::new(), kwargs).await?;

        let pairs = match value {
            Value::Array(pairs) => pairs,
            other => {
                return Err(OdooError::RemoteCall(format!(
                    "{model}: name_search returned `{other}` instead of a list"
                )));
            }
        };
        Ok(pairs
            .iter()
            .filter_map(|pair| {
                let id = pair.get(0)?.as_i64()?;
                let label = pair.get(1)?.as_str()?.to_string();
                Some((id, label))
            })
            .collect())
    }

    /// Partner record backing the session user.
    pub async fn current_partner_id(&self) -> Result<i64, OdooError> {
        let users = self.read("res.users", &[self.session.uid], &["partner_id".to_string()]).await?;
        users
            .first()
            .and_then(|user| records::many2one_id(user, "partner_id"))
            .ok_or_else(|| {
                OdooError::NotFound(format!("user {} has no related partner", self.session.uid))
            })
    }

    /// Any model method, unvalidated. Every failure is a remote-call error
    /// carrying the upstream text.
    pub async fn execute_method(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, OdooError> {
        self.execute_kw(Operation::Passthrough, model, method, args, kwargs).await
    }
}

fn missing_records(model: &str, ids: &[i64]) -> OdooError {
    OdooError::NotFound(format!("{model} record(s) {} do not exist", join_ids(ids)))
}

fn search_kwargs(options: &SearchOptions) -> Map<String, Value> {
    let mut kwargs = Map::new();
    if !options.fields.is_empty() {
        kwargs.insert("fields".into(), json!(options.fields));
    }
    if let Some(limit) = options.limit {
        kwargs.insert("limit".into(), json!(limit));
    }
    if let Some(offset) = options.offset.filter(|offset| *offset > 0) {
        kwargs.insert("offset".into(), json!(offset));
    }
    if let Some(order) = &options.order {
        kwargs.insert("order".into(), json!(order));
    }
    kwargs
}

fn parse_field(name: String, attributes: &Value) -> FieldDefinition {
    let text = |key: &str| attributes.get(key).and_then(Value::as_str).map(str::to_string);
    let flag = |key: &str| attributes.get(key).and_then(Value::as_bool).unwrap_or(false);

    FieldDefinition {
        field_type: text("type").unwrap_or_else(|| "unknown".to_string()),
        label: text("string").unwrap_or_else(|| name.clone()),
        required: flag("required"),
        readonly: flag("readonly"),
        relation: text("relation").filter(|relation| !relation.is_empty()),
        name,
    }
}
