//! An in-process stand-in for an Odoo server.
//!
//! It speaks the same `common`/`object` services as the HTTP transport and
//! implements just enough ORM behaviour for the adapter to be exercised end to
//! end: AND-only domain evaluation, `search_read`, `read`, `create`, `write`,
//! `unlink`, `fields_get`, `name_search`, a virtual `ir.model`, many2one
//! rendering as `[id, display_name]` and Odoo-named exceptions.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

use super::{RemoteFault, RpcTransport, TransportError};

const MISSING_ERROR: &str = "odoo.exceptions.MissingError";
const VALIDATION_ERROR: &str = "odoo.exceptions.ValidationError";
const USER_ERROR: &str = "odoo.exceptions.UserError";
const ACCESS_DENIED: &str = "odoo.exceptions.AccessDenied";
const VALUE_ERROR: &str = "builtins.ValueError";
const KEY_ERROR: &str = "builtins.KeyError";
const ATTRIBUTE_ERROR: &str = "builtins.AttributeError";

pub type MethodHandler =
    Box<dyn Fn(&[Value], &Map<String, Value>) -> Result<Value, RemoteFault> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: String,
    pub label: String,
    pub required: bool,
    pub readonly: bool,
    pub relation: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            label: title_case(name),
            required: false,
            readonly: false,
            relation: None,
        }
    }

    pub fn char(name: &str) -> Self {
        Self::new(name, "char")
    }

    pub fn many2one(name: &str, relation: &str) -> Self {
        Self { relation: Some(relation.to_string()), ..Self::new(name, "many2one") }
    }

    pub fn many2many(name: &str, relation: &str) -> Self {
        Self { relation: Some(relation.to_string()), ..Self::new(name, "many2many") }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    fn is_many2one(&self) -> bool {
        self.field_type == "many2one"
    }

    fn is_x2many(&self) -> bool {
        self.field_type == "many2many" || self.field_type == "one2many"
    }
}

#[derive(Debug)]
struct ModelState {
    label: String,
    fields: Vec<FieldSpec>,
    records: BTreeMap<i64, Map<String, Value>>,
}

impl ModelState {
    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug)]
struct User {
    uid: i64,
    login: String,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    models: BTreeMap<String, ModelState>,
    users: Vec<User>,
    next_id: i64,
}

pub struct InMemoryOdoo {
    database: String,
    server_version: String,
    state: RwLock<State>,
    methods: HashMap<(String, String), MethodHandler>,
}

impl std::fmt::Debug for InMemoryOdoo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOdoo")
            .field("database", &self.database)
            .field("server_version", &self.server_version)
            .finish_non_exhaustive()
    }
}

impl InMemoryOdoo {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            server_version: "17.0".to_string(),
            state: RwLock::new(State { next_id: 1, ..State::default() }),
            methods: HashMap::new(),
        }
    }

    /// A database with the partner, user, HR, calendar, CRM and activity
    /// models the tool layer talks to.
    pub fn with_standard_models(database: &str) -> Self {
        let mut odoo = Self::new(database);
        odoo.define_model(
            "res.country",
            "Country",
            vec![FieldSpec::char("name").required(), FieldSpec::char("code")],
        );
        odoo.define_model(
            "res.partner",
            "Contact",
            vec![
                FieldSpec::char("name").required(),
                FieldSpec::new("is_company", "boolean").label("Is a Company"),
                FieldSpec::char("email"),
                FieldSpec::char("phone"),
                FieldSpec::char("mobile"),
                FieldSpec::char("street"),
                FieldSpec::char("city"),
                FieldSpec::many2one("country_id", "res.country").label("Country"),
                FieldSpec::new("comment", "html").label("Notes"),
                FieldSpec::new("customer_rank", "integer"),
                FieldSpec::new("supplier_rank", "integer"),
            ],
        );
        odoo.define_model(
            "res.users",
            "User",
            vec![
                FieldSpec::char("name").required(),
                FieldSpec::char("login").required(),
                FieldSpec::many2one("partner_id", "res.partner")
                    .required()
                    .label("Related Partner"),
            ],
        );
        odoo.define_model(
            "hr.employee",
            "Employee",
            vec![
                FieldSpec::char("name").required().label("Employee Name"),
                FieldSpec::char("work_email"),
                FieldSpec::many2one("user_id", "res.users").label("User"),
            ],
        );
        odoo.define_model(
            "hr.leave.report.calendar",
            "Time Off Calendar",
            vec![
                FieldSpec::char("name").readonly(),
                FieldSpec::many2one("employee_id", "hr.employee").readonly().label("Employee"),
                FieldSpec::new("start_datetime", "datetime").readonly().label("From"),
                FieldSpec::new("stop_datetime", "datetime").readonly().label("To"),
                FieldSpec::new("state", "selection").readonly().label("Status"),
            ],
        );
        odoo.define_model(
            "crm.lead",
            "Lead/Opportunity",
            vec![
                FieldSpec::char("name").required().label("Opportunity"),
                FieldSpec::new("type", "selection"),
                FieldSpec::many2one("partner_id", "res.partner").label("Customer"),
                FieldSpec::char("contact_name"),
                FieldSpec::char("partner_name").label("Company Name"),
                FieldSpec::char("email_from").label("Email"),
                FieldSpec::char("phone"),
                FieldSpec::char("mobile"),
                FieldSpec::char("street"),
                FieldSpec::char("city"),
                FieldSpec::many2one("country_id", "res.country").label("Country"),
                FieldSpec::new("expected_revenue", "monetary"),
                FieldSpec::new("probability", "float"),
                FieldSpec::new("description", "html").label("Notes"),
                FieldSpec::many2one("source_id", "utm.source").label("Source"),
                FieldSpec::many2one("user_id", "res.users").label("Salesperson"),
            ],
        );
        odoo.define_model(
            "calendar.event",
            "Calendar Event",
            vec![
                FieldSpec::char("name").required().label("Meeting Subject"),
                FieldSpec::new("start", "datetime").required(),
                FieldSpec::new("stop", "datetime").required(),
                FieldSpec::new("allday", "boolean").label("All Day"),
                FieldSpec::char("location"),
                FieldSpec::new("description", "html"),
                FieldSpec::many2many("partner_ids", "res.partner").label("Attendees"),
                FieldSpec::many2one("user_id", "res.users").label("Organizer"),
                FieldSpec::many2one("opportunity_id", "crm.lead").label("Opportunity"),
                FieldSpec::char("res_model").label("Document Model Name"),
                FieldSpec::many2one("res_model_id", "ir.model").label("Document Model"),
                FieldSpec::new("res_id", "many2one_reference").label("Document ID"),
            ],
        );
        odoo.define_model(
            "mail.activity.type",
            "Activity Type",
            vec![FieldSpec::char("name").required()],
        );
        odoo.define_model(
            "mail.activity",
            "Activity",
            vec![
                FieldSpec::char("summary"),
                FieldSpec::new("note", "html"),
                FieldSpec::new("date_deadline", "date").required().label("Due Date"),
                FieldSpec::many2one("res_model_id", "ir.model").required().label("Document Model"),
                FieldSpec::new("res_id", "many2one_reference")
                    .required()
                    .label("Related Document ID"),
                FieldSpec::many2one("activity_type_id", "mail.activity.type"),
                FieldSpec::many2one("user_id", "res.users").label("Assigned to"),
            ],
        );
        odoo
    }

    pub fn define_model(&mut self, model: &str, label: &str, fields: Vec<FieldSpec>) {
        self.state.get_mut().models.insert(
            model.to_string(),
            ModelState { label: label.to_string(), fields, records: BTreeMap::new() },
        );
    }

    /// Seeds a record without going through `create` validation.
    pub fn insert(&mut self, model: &str, values: Value) -> i64 {
        let state = self.state.get_mut();
        let id = state.next_id;
        state.next_id += 1;

        let mut record = match values {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        record.insert("id".to_string(), json!(id));
        if let Some(model_state) = state.models.get_mut(model) {
            model_state.records.insert(id, record);
        }
        id
    }

    /// Creates a login plus its `res.users` and `res.partner` records.
    /// Returns `(uid, partner_id)`.
    pub fn add_user(&mut self, login: &str, password: &str, name: &str) -> (i64, i64) {
        let partner_id = self.insert("res.partner", json!({"name": name, "email": login}));
        let uid = self.insert(
            "res.users",
            json!({"name": name, "login": login, "partner_id": partner_id}),
        );
        self.state.get_mut().users.push(User {
            uid,
            login: login.to_string(),
            password: password.to_string(),
        });
        (uid, partner_id)
    }

    /// Registers a custom model method, reachable through `execute_kw`.
    pub fn register_method<F>(&mut self, model: &str, method: &str, handler: F)
    where
        F: Fn(&[Value], &Map<String, Value>) -> Result<Value, RemoteFault> + Send + Sync + 'static,
    {
        self.methods.insert((model.to_string(), method.to_string()), Box::new(handler));
    }

    pub async fn record(&self, model: &str, id: i64) -> Option<Map<String, Value>> {
        let state = self.state.read().await;
        state.models.get(model).and_then(|model_state| model_state.records.get(&id).cloned())
    }

    async fn dispatch_common(&self, method: &str, args: &[Value]) -> Result<Value, RemoteFault> {
        match method {
            "version" => Ok(json!({
                "server_version": self.server_version,
                "server_version_info": [17, 0, 0, "final", 0, ""],
                "server_serie": self.server_version,
                "protocol_version": 1
            })),
            "authenticate" | "login" => {
                let database = args.first().and_then(Value::as_str).unwrap_or_default();
                let login = args.get(1).and_then(Value::as_str).unwrap_or_default();
                let password = args.get(2).and_then(Value::as_str).unwrap_or_default();
                if database != self.database {
                    return Err(RemoteFault::new(
                        KEY_ERROR,
                        format!("database \"{database}\" does not exist"),
                    ));
                }
                let state = self.state.read().await;
                Ok(state
                    .users
                    .iter()
                    .find(|user| user.login == login && user.password == password)
                    .map(|user| json!(user.uid))
                    .unwrap_or(Value::Bool(false)))
            }
            other => Err(RemoteFault::new(
                ATTRIBUTE_ERROR,
                format!("The method '{other}' does not exist on the service 'common'"),
            )),
        }
    }

    async fn check_access(&self, args: &[Value]) -> Result<(), RemoteFault> {
        let database = args.first().and_then(Value::as_str).unwrap_or_default();
        let uid = args.get(1).and_then(Value::as_i64);
        let password = args.get(2).and_then(Value::as_str).unwrap_or_default();

        let state = self.state.read().await;
        let granted = database == self.database
            && state
                .users
                .iter()
                .any(|user| Some(user.uid) == uid && user.password == password);
        if granted {
            Ok(())
        } else {
            Err(RemoteFault::new(ACCESS_DENIED, "Access Denied"))
        }
    }

    async fn dispatch_model(
        &self,
        model: &str,
        method: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Value, RemoteFault> {
        if let Some(handler) = self.methods.get(&(model.to_string(), method.to_string())) {
            return handler(args, kwargs);
        }

        if model == "ir.model" {
            let state = self.state.read().await;
            let records = ir_model_records(&state);
            return match method {
                "search_read" => {
                    let domain = positional_or_kw(args, 0, kwargs, "domain");
                    let matched = filter_records(&state, model, &records, domain)?;
                    Ok(Value::Array(project_all(&state, model, matched, kwargs)))
                }
                "search_count" => {
                    let domain = positional_or_kw(args, 0, kwargs, "domain");
                    Ok(json!(filter_records(&state, model, &records, domain)?.len()))
                }
                _ => Err(unknown_method(model, method)),
            };
        }

        match method {
            "search_read" => {
                let state = self.state.read().await;
                let matched = self.search_records(&state, model, args, kwargs)?;
                Ok(Value::Array(project_all(&state, model, matched, kwargs)))
            }
            "search" => {
                let state = self.state.read().await;
                let matched = self.search_records(&state, model, args, kwargs)?;
                Ok(Value::Array(matched.iter().map(|record| record["id"].clone()).collect()))
            }
            "search_count" => {
                let state = self.state.read().await;
                let model_state = model_state(&state, model)?;
                let records: Vec<Map<String, Value>> =
                    model_state.records.values().cloned().collect();
                let domain = positional_or_kw(args, 0, kwargs, "domain");
                Ok(json!(filter_records(&state, model, &records, domain)?.len()))
            }
            "read" => {
                let state = self.state.read().await;
                let model_state = model_state(&state, model)?;
                let ids = id_list(args.first());
                let missing: Vec<i64> = ids
                    .iter()
                    .copied()
                    .filter(|id| !model_state.records.contains_key(id))
                    .collect();
                if !missing.is_empty() {
                    return Err(missing_error(model, &missing));
                }
                let fields = args.get(1).cloned().or_else(|| kwargs.get("fields").cloned());
                let records: Vec<Map<String, Value>> = ids
                    .iter()
                    .filter_map(|id| model_state.records.get(id).cloned())
                    .collect();
                Ok(Value::Array(
                    records
                        .iter()
                        .map(|record| project(&state, model, record, fields.as_ref()))
                        .collect(),
                ))
            }
            "create" => {
                let mut state = self.state.write().await;
                match args.first() {
                    Some(Value::Array(batch)) => {
                        let mut ids = Vec::with_capacity(batch.len());
                        for values in batch {
                            ids.push(json!(create_record(&mut state, model, values)?));
                        }
                        Ok(Value::Array(ids))
                    }
                    Some(values) => Ok(json!(create_record(&mut state, model, values)?)),
                    None => Err(RemoteFault::new(
                        VALUE_ERROR,
                        "create() missing 1 required positional argument: 'vals_list'",
                    )),
                }
            }
            "write" => {
                let mut state = self.state.write().await;
                let ids = id_list(args.first());
                let values = args.get(1).and_then(Value::as_object).cloned().unwrap_or_default();
                write_records(&mut state, model, &ids, &values)?;
                Ok(Value::Bool(true))
            }
            "unlink" => {
                let mut state = self.state.write().await;
                let ids = id_list(args.first());
                unlink_records(&mut state, model, &ids)?;
                Ok(Value::Bool(true))
            }
            "fields_get" => {
                let state = self.state.read().await;
                let model_state = model_state(&state, model)?;
                let attributes = args.get(1).or_else(|| kwargs.get("attributes"));
                Ok(fields_get(model_state, attributes))
            }
            "name_search" => {
                let state = self.state.read().await;
                let model_state = model_state(&state, model)?;
                let needle = positional_or_kw(args, 0, kwargs, "name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                let limit = kwargs.get("limit").and_then(Value::as_u64).unwrap_or(100) as usize;
                Ok(Value::Array(
                    model_state
                        .records
                        .values()
                        .filter(|record| {
                            display_name(model, record).to_lowercase().contains(&needle)
                        })
                        .take(limit)
                        .map(|record| json!([record["id"], display_name(model, record)]))
                        .collect(),
                ))
            }
            _ => {
                let state = self.state.read().await;
                model_state(&state, model)?;
                Err(unknown_method(model, method))
            }
        }
    }

    fn search_records(
        &self,
        state: &State,
        model: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Vec<Map<String, Value>>, RemoteFault> {
        let model_state = model_state(state, model)?;
        let records: Vec<Map<String, Value>> = model_state.records.values().cloned().collect();
        let domain = positional_or_kw(args, 0, kwargs, "domain");
        let mut matched = filter_records(state, model, &records, domain)?;

        if let Some(order) = kwargs.get("order").and_then(Value::as_str) {
            sort_records(&mut matched, order);
        }
        let offset = kwargs.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = kwargs.get("limit").and_then(Value::as_u64).map(|limit| limit as usize);

        let paged = matched.into_iter().skip(offset);
        Ok(match limit {
            Some(limit) if limit > 0 => paged.take(limit).collect(),
            _ => paged.collect(),
        })
    }
}

#[async_trait]
impl RpcTransport for InMemoryOdoo {
    async fn call(
        &self,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, TransportError> {
        match (service, method) {
            ("common", _) => {
                self.dispatch_common(method, &args).await.map_err(TransportError::Fault)
            }
            ("object", "execute_kw") => {
                self.check_access(&args).await.map_err(TransportError::Fault)?;
                let model = args.get(3).and_then(Value::as_str).unwrap_or_default().to_string();
                let model_method =
                    args.get(4).and_then(Value::as_str).unwrap_or_default().to_string();
                let positional = match args.get(5) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                let kwargs = args.get(6).and_then(Value::as_object).cloned().unwrap_or_default();

                self.dispatch_model(&model, &model_method, &positional, &kwargs)
                    .await
                    .map_err(TransportError::Fault)
            }
            _ => Err(TransportError::Fault(RemoteFault::new(
                ATTRIBUTE_ERROR,
                format!("unknown service method {service}.{method}"),
            ))),
        }
    }
}

fn title_case(name: &str) -> String {
    name.trim_end_matches("_id")
        .trim_end_matches("_ids")
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn unknown_method(model: &str, method: &str) -> RemoteFault {
    RemoteFault::new(
        ATTRIBUTE_ERROR,
        format!("The method '{method}' does not exist on the model '{model}'"),
    )
}

fn missing_error(model: &str, ids: &[i64]) -> RemoteFault {
    let ids = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    RemoteFault::new(
        MISSING_ERROR,
        format!("Record does not exist or has been deleted.\n(Record: {model}({ids},))"),
    )
}

fn model_state<'a>(state: &'a State, model: &str) -> Result<&'a ModelState, RemoteFault> {
    state
        .models
        .get(model)
        .ok_or_else(|| RemoteFault::new(KEY_ERROR, format!("Object {model} doesn't exist")))
}

fn positional_or_kw<'a>(
    args: &'a [Value],
    index: usize,
    kwargs: &'a Map<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    args.get(index).or_else(|| kwargs.get(key))
}

fn id_list(value: Option<&Value>) -> Vec<i64> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_i64).collect(),
        Some(Value::Number(number)) => number.as_i64().into_iter().collect(),
        _ => Vec::new(),
    }
}

fn ir_model_records(state: &State) -> Vec<Map<String, Value>> {
    state
        .models
        .iter()
        .enumerate()
        .filter_map(|(index, (model, model_state))| {
            json!({
                "id": index as i64 + 1,
                "model": model,
                "name": model_state.label,
                "transient": false,
            })
            .as_object()
            .cloned()
        })
        .collect()
}

fn display_name(model: &str, record: &Map<String, Value>) -> String {
    match record.get("name").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => {
            let id = record.get("id").and_then(Value::as_i64).unwrap_or_default();
            format!("{model},{id}")
        }
    }
}

fn related_display_name(state: &State, relation: &str, id: i64) -> String {
    if relation == "ir.model" {
        return ir_model_records(state)
            .into_iter()
            .find(|record| record.get("id").and_then(Value::as_i64) == Some(id))
            .map(|record| display_name(relation, &record))
            .unwrap_or_else(|| format!("{relation},{id}"));
    }
    state
        .models
        .get(relation)
        .and_then(|model_state| model_state.records.get(&id))
        .map(|record| display_name(relation, record))
        .unwrap_or_else(|| format!("{relation},{id}"))
}

fn render_value(state: &State, field: Option<&FieldSpec>, stored: Option<&Value>) -> Value {
    let stored = match stored {
        None | Some(Value::Null) => {
            return match field {
                Some(field) if field.is_x2many() => Value::Array(Vec::new()),
                _ => Value::Bool(false),
            };
        }
        Some(value) => value,
    };

    match field {
        Some(field) if field.is_many2one() => match (stored.as_i64(), field.relation.as_deref()) {
            (Some(id), Some(relation)) => json!([id, related_display_name(state, relation, id)]),
            _ => Value::Bool(false),
        },
        _ => stored.clone(),
    }
}

fn project(
    state: &State,
    model: &str,
    record: &Map<String, Value>,
    fields: Option<&Value>,
) -> Value {
    let requested: Vec<String> = match fields {
        Some(Value::Array(names)) if !names.is_empty() => {
            names.iter().filter_map(Value::as_str).map(str::to_string).collect()
        }
        _ => state
            .models
            .get(model)
            .map(|model_state| model_state.fields.iter().map(|field| field.name.clone()).collect())
            .unwrap_or_else(|| record.keys().filter(|key| *key != "id").cloned().collect()),
    };

    let model_state = state.models.get(model);
    let mut projected = Map::new();
    projected.insert("id".to_string(), record.get("id").cloned().unwrap_or(Value::Null));
    for name in requested {
        if name == "id" {
            continue;
        }
        if name == "display_name" {
            projected.insert(name, Value::String(display_name(model, record)));
            continue;
        }
        let field = model_state.and_then(|model_state| model_state.field(&name));
        let value = render_value(state, field, record.get(&name));
        projected.insert(name, value);
    }
    Value::Object(projected)
}

fn project_all(
    state: &State,
    model: &str,
    records: Vec<Map<String, Value>>,
    kwargs: &Map<String, Value>,
) -> Vec<Value> {
    let fields = kwargs.get("fields");
    records.iter().map(|record| project(state, model, record, fields)).collect()
}

fn filter_records(
    state: &State,
    model: &str,
    records: &[Map<String, Value>],
    domain: Option<&Value>,
) -> Result<Vec<Map<String, Value>>, RemoteFault> {
    let leaves = match domain {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            return Err(RemoteFault::new(VALUE_ERROR, format!("Invalid domain: {other}")));
        }
    };

    let mut conditions = Vec::new();
    for leaf in &leaves {
        match leaf {
            Value::String(op) if op == "&" => continue,
            Value::String(op) => {
                return Err(RemoteFault::new(
                    VALUE_ERROR,
                    format!("Unsupported domain operator {op:?}"),
                ));
            }
            Value::Array(parts) if parts.len() == 3 => {
                let field = parts[0].as_str().unwrap_or_default();
                let operator = parts[1].as_str().unwrap_or_default();
                check_leaf(state, model, field, operator, leaf)?;
                conditions.push((field.to_string(), operator.to_string(), parts[2].clone()));
            }
            other => {
                return Err(RemoteFault::new(VALUE_ERROR, format!("Invalid leaf {other}")));
            }
        }
    }

    Ok(records
        .iter()
        .filter(|record| {
            conditions
                .iter()
                .all(|(field, operator, value)| leaf_matches(record.get(field), operator, value))
        })
        .cloned()
        .collect())
}

fn check_leaf(
    state: &State,
    model: &str,
    field: &str,
    operator: &str,
    leaf: &Value,
) -> Result<(), RemoteFault> {
    const OPERATORS: &[&str] = &[
        "=", "!=", "<", "<=", ">", ">=", "like", "ilike", "not like", "not ilike", "in", "not in",
    ];
    if !OPERATORS.contains(&operator) {
        return Err(RemoteFault::new(VALUE_ERROR, format!("Invalid leaf {leaf}")));
    }
    let known = field == "id"
        || field == "display_name"
        || model == "ir.model"
        || state.models.get(model).is_some_and(|model_state| model_state.field(field).is_some());
    if known {
        Ok(())
    } else {
        Err(RemoteFault::new(VALUE_ERROR, format!("Invalid field {model}.{field} in leaf {leaf}")))
    }
}

fn is_falsy(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

fn leaf_matches(stored: Option<&Value>, operator: &str, expected: &Value) -> bool {
    match operator {
        "=" => values_equal(stored, expected),
        "!=" => !values_equal(stored, expected),
        "<" | "<=" | ">" | ">=" => {
            let Some(stored) = stored.filter(|value| !is_falsy(Some(*value))) else {
                return false;
            };
            match compare_values(stored, expected) {
                Some(ordering) => match operator {
                    "<" => ordering == Ordering::Less,
                    "<=" => ordering != Ordering::Greater,
                    ">" => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
                None => false,
            }
        }
        "like" | "ilike" | "not like" | "not ilike" => {
            let needle = expected.as_str().unwrap_or_default();
            let haystack = stored.and_then(Value::as_str).unwrap_or_default();
            let found = if operator.ends_with("ilike") {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            } else {
                haystack.contains(needle)
            };
            if operator.starts_with("not") {
                !found
            } else {
                found
            }
        }
        "in" | "not in" => {
            let candidates = match expected {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            let found = match stored {
                Some(Value::Array(ids)) => ids.iter().any(|id| candidates.contains(id)),
                other => candidates.iter().any(|candidate| values_equal(other, candidate)),
            };
            if operator == "in" {
                found
            } else {
                !found
            }
        }
        _ => false,
    }
}

fn values_equal(stored: Option<&Value>, expected: &Value) -> bool {
    if matches!(expected, Value::Bool(false) | Value::Null) {
        return is_falsy(stored);
    }
    match (stored, expected) {
        (Some(Value::Number(left)), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Some(stored), expected) => stored == expected,
        (None, _) => false,
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

fn sort_records(records: &mut [Map<String, Value>], order: &str) {
    let keys: Vec<(String, bool)> = order
        .split(',')
        .filter_map(|part| {
            let mut words = part.split_whitespace();
            let field = words.next()?.to_string();
            let descending = words.next().is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
            Some((field, descending))
        })
        .collect();

    records.sort_by(|left, right| {
        for (field, descending) in &keys {
            let ordering = match (left.get(field), right.get(field)) {
                (Some(left), Some(right)) => compare_values(left, right).unwrap_or(Ordering::Equal),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn normalize_stored(field: &FieldSpec, value: &Value, current: Option<&Value>) -> Value {
    if field.is_many2one() {
        return match value {
            Value::Array(parts) => parts.first().cloned().unwrap_or(Value::Bool(false)),
            other => other.clone(),
        };
    }
    if !field.is_x2many() {
        return value.clone();
    }

    // x2many: a plain id list, or `(6, 0, ids)` / `(4, id)` / `(3, id)` commands.
    let mut ids: Vec<Value> = match current {
        Some(Value::Array(existing)) => existing.clone(),
        _ => Vec::new(),
    };
    let Value::Array(items) = value else {
        return Value::Array(ids);
    };
    if items.iter().all(Value::is_number) {
        return Value::Array(items.clone());
    }
    for command in items {
        let Value::Array(parts) = command else {
            continue;
        };
        match parts.first().and_then(Value::as_i64) {
            Some(6) => {
                ids = match parts.get(2) {
                    Some(Value::Array(replacement)) => replacement.clone(),
                    _ => Vec::new(),
                };
            }
            Some(4) => {
                if let Some(id) = parts.get(1) {
                    if !ids.contains(id) {
                        ids.push(id.clone());
                    }
                }
            }
            Some(3) => {
                if let Some(id) = parts.get(1) {
                    ids.retain(|existing| existing != id);
                }
            }
            Some(5) => ids.clear(),
            _ => {}
        }
    }
    Value::Array(ids)
}

fn apply_values(
    model: &str,
    model_state: &ModelState,
    record: &mut Map<String, Value>,
    values: &Map<String, Value>,
) -> Result<(), RemoteFault> {
    for (name, value) in values {
        let field = model_state.field(name).ok_or_else(|| {
            RemoteFault::new(VALUE_ERROR, format!("Invalid field '{name}' on model '{model}'"))
        })?;
        let stored = normalize_stored(field, value, record.get(name));
        record.insert(name.clone(), stored);
    }
    Ok(())
}

fn check_required(
    model_state: &ModelState,
    record: &Map<String, Value>,
) -> Result<(), RemoteFault> {
    let missing: Vec<&str> = model_state
        .fields
        .iter()
        .filter(|field| field.required)
        .filter(|field| {
            let value = record.get(&field.name);
            let blank = value.and_then(Value::as_str).is_some_and(|text| text.trim().is_empty());
            is_falsy(value) || blank
        })
        .map(|field| field.label.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RemoteFault::new(
            VALIDATION_ERROR,
            format!(
                "The operation cannot be completed: Missing required fields on {}: {}",
                model_state.label,
                missing.join(", ")
            ),
        ))
    }
}

fn create_record(state: &mut State, model: &str, values: &Value) -> Result<i64, RemoteFault> {
    let values = values.as_object().cloned().ok_or_else(|| {
        RemoteFault::new(VALUE_ERROR, format!("create() expects a dict of values, got {values}"))
    })?;

    let id = state.next_id;
    let model_state = state
        .models
        .get_mut(model)
        .ok_or_else(|| RemoteFault::new(KEY_ERROR, format!("Object {model} doesn't exist")))?;

    let mut record = Map::new();
    record.insert("id".to_string(), json!(id));
    apply_values(model, model_state, &mut record, &values)?;
    check_required(model_state, &record)?;

    model_state.records.insert(id, record);
    state.next_id += 1;
    Ok(id)
}

fn write_records(
    state: &mut State,
    model: &str,
    ids: &[i64],
    values: &Map<String, Value>,
) -> Result<(), RemoteFault> {
    let model_state = state
        .models
        .get_mut(model)
        .ok_or_else(|| RemoteFault::new(KEY_ERROR, format!("Object {model} doesn't exist")))?;

    let missing: Vec<i64> =
        ids.iter().copied().filter(|id| !model_state.records.contains_key(id)).collect();
    if !missing.is_empty() {
        return Err(missing_error(model, &missing));
    }

    let mut updated = Vec::with_capacity(ids.len());
    for id in ids {
        let mut record = model_state.records.get(id).cloned().unwrap_or_default();
        apply_values(model, model_state, &mut record, values)?;
        check_required(model_state, &record)?;
        updated.push((*id, record));
    }
    model_state.records.extend(updated);
    Ok(())
}

fn unlink_records(state: &mut State, model: &str, ids: &[i64]) -> Result<(), RemoteFault> {
    let model_state = model_state(state, model)?;
    let missing: Vec<i64> =
        ids.iter().copied().filter(|id| !model_state.records.contains_key(id)).collect();
    if !missing.is_empty() {
        return Err(missing_error(model, &missing));
    }

    // Required many2one links from surviving records block the delete.
    let referenced = state.models.iter().any(|(other_model, other_state)| {
        let being_deleted = |record: &Map<String, Value>| {
            other_model == model
                && record.get("id").and_then(Value::as_i64).is_some_and(|id| ids.contains(&id))
        };
        other_state
            .fields
            .iter()
            .filter(|field| field.required && field.relation.as_deref() == Some(model))
            .filter(|field| field.is_many2one())
            .any(|field| {
                other_state.records.values().filter(|record| !being_deleted(record)).any(|record| {
                    record
                        .get(&field.name)
                        .and_then(Value::as_i64)
                        .is_some_and(|target| ids.contains(&target))
                })
            })
    });
    if referenced {
        return Err(RemoteFault::new(
            USER_ERROR,
            format!(
                "The operation cannot be completed: another model requires the record being \
                 deleted. If possible, archive it instead.\n\nModel: {}",
                model_state.label
            ),
        ));
    }

    if let Some(model_state) = state.models.get_mut(model) {
        for id in ids {
            model_state.records.remove(id);
        }
    }
    Ok(())
}

fn fields_get(model_state: &ModelState, attributes: Option<&Value>) -> Value {
    let wanted: Option<Vec<&str>> = match attributes {
        Some(Value::Array(names)) if !names.is_empty() => {
            Some(names.iter().filter_map(Value::as_str).collect())
        }
        _ => None,
    };
    let keep = |attribute: &str| wanted.as_ref().map_or(true, |names| names.contains(&attribute));

    let mut fields = Map::new();
    for field in &model_state.fields {
        let mut description = Map::new();
        if keep("type") {
            description.insert("type".to_string(), json!(field.field_type));
        }
        if keep("string") {
            description.insert("string".to_string(), json!(field.label));
        }
        if keep("required") {
            description.insert("required".to_string(), json!(field.required));
        }
        if keep("readonly") {
            description.insert("readonly".to_string(), json!(field.readonly));
        }
        if keep("relation") {
            if let Some(relation) = &field.relation {
                description.insert("relation".to_string(), json!(relation));
            }
        }
        fields.insert(field.name.clone(), Value::Object(description));
    }
    Value::Object(fields)
}
