use std::sync::OnceLock;

use odoo_mcp_core::{Domain, OdooError};
use odoo_mcp_rpc::{records, OdooClient, Record, SearchOptions};
use regex::Regex;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use super::{optional_text, require_text};
use crate::handlers::records::CreatedRecord;

const PARTNER_MODEL: &str = "res.partner";
const PARTNER_FIELDS: [&str; 4] = ["name", "email", "phone", "comment"];
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

fn default_partner_limit() -> u32 {
    5
}

fn default_by_name_limit() -> i64 {
    10
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchPartnerInput {
    #[schemars(description = "Part of the company name; omit to list companies")]
    #[serde(default)]
    pub name: Option<String>,

    #[schemars(description = "Maximum number of results (default 5)")]
    #[serde(default = "default_partner_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchPartnerByNameInput {
    #[schemars(description = "Part of the company name")]
    pub name: String,

    #[schemars(description = "Maximum number of results (default 10); 0 or less returns all")]
    #[serde(default = "default_by_name_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCustomerInput {
    #[schemars(description = "Customer name")]
    pub name: String,

    #[schemars(description = "Whether the customer is a company (default true)")]
    #[serde(default = "default_true")]
    pub is_company: bool,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub mobile: Option<String>,

    #[serde(default)]
    pub street: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[schemars(description = "Id of a res.country record")]
    #[serde(default)]
    pub country_id: Option<i64>,

    #[schemars(description = "Internal notes")]
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartnerSummary {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub comment: Option<String>,
}

impl PartnerSummary {
    fn from_record(record: &Record) -> Self {
        Self {
            id: records::record_id(record),
            name: records::text_field(record, "name"),
            email: records::text_field(record, "email"),
            phone: records::text_field(record, "phone"),
            comment: records::text_field(record, "comment"),
        }
    }
}

pub async fn search_partner(
    client: &OdooClient,
    input: SearchPartnerInput,
) -> Result<Vec<PartnerSummary>, OdooError> {
    let name = optional_text(input.name.as_deref());
    search_companies(client, name.as_deref(), Some(input.limit)).await
}

pub async fn search_partner_by_name(
    client: &OdooClient,
    input: SearchPartnerByNameInput,
) -> Result<Vec<PartnerSummary>, OdooError> {
    let name = require_text("name", &input.name)?;
    let limit = u32::try_from(input.limit).ok().filter(|limit| *limit > 0);
    search_companies(client, Some(&name), limit).await
}

async fn search_companies(
    client: &OdooClient,
    name: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<PartnerSummary>, OdooError> {
    let mut domain = Domain::match_all().with("is_company", "=", true);
    if let Some(name) = name {
        domain = domain.with("name", "ilike", name);
    }
    let mut options = SearchOptions::default().fields(PARTNER_FIELDS);
    options.limit = limit;

    let partners = client.search(PARTNER_MODEL, &domain, &options).await?;
    Ok(partners.iter().map(PartnerSummary::from_record).collect())
}

pub async fn create_customer(
    client: &OdooClient,
    input: CreateCustomerInput,
) -> Result<CreatedRecord, OdooError> {
    let values = customer_values(input)?;
    let id = client.create(PARTNER_MODEL, values).await?;
    info!(event_name = "mcp.customer.created", id, "customer created");
    Ok(CreatedRecord { id })
}

pub(crate) fn customer_values(input: CreateCustomerInput) -> Result<Map<String, Value>, OdooError> {
    let mut values = Map::new();
    values.insert("name".into(), json!(require_text("name", &input.name)?));
    values.insert("is_company".into(), json!(input.is_company));
    values.insert("customer_rank".into(), json!(1));
    values.insert("supplier_rank".into(), json!(0));

    if let Some(email) = optional_text(input.email.as_deref()) {
        validate_email(&email)?;
        values.insert("email".into(), json!(email));
    }
    let optional = [
        ("phone", input.phone),
        ("mobile", input.mobile),
        ("street", input.street),
        ("city", input.city),
        ("comment", input.comment),
    ];
    for (field, value) in optional {
        if let Some(text) = optional_text(value.as_deref()) {
            values.insert(field.into(), json!(text));
        }
    }
    if let Some(country_id) = input.country_id {
        values.insert("country_id".into(), json!(country_id));
    }
    Ok(values)
}

fn email_regex() -> Result<&'static Regex, OdooError> {
    static EMAIL: OnceLock<Result<Regex, String>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).map_err(|error| error.to_string()))
        .as_ref()
        .map_err(|error| OdooError::validation(format!("email pattern unavailable: {error}")))
}

pub(crate) fn validate_email(email: &str) -> Result<(), OdooError> {
    if email_regex()?.is_match(email) {
        Ok(())
    } else {
        Err(OdooError::validation(format!("invalid email address `{email}`")))
    }
}
