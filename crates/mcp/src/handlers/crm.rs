use odoo_mcp_core::OdooError;
use odoo_mcp_rpc::{records, OdooClient, Record};
use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::partner::validate_email;
use super::{optional_text, require_text};
use crate::handlers::records::CreatedRecord;

const LEAD_MODEL: &str = "crm.lead";
const DEFAULT_PROBABILITY: f64 = 10.0;

/// Contact fields copied from the linked partner when the caller leaves them
/// empty: `(lead field, partner field)`.
const PARTNER_FALLBACKS: [(&str, &str); 5] = [
    ("email_from", "email"),
    ("phone", "phone"),
    ("mobile", "mobile"),
    ("street", "street"),
    ("city", "city"),
];

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreateLeadInput {
    #[schemars(description = "Opportunity title")]
    pub name: String,

    #[schemars(description = "Customer (res.partner id); fills contact fields left empty")]
    #[serde(default)]
    pub partner_id: Option<i64>,

    #[serde(default)]
    pub contact_name: Option<String>,

    #[serde(default)]
    pub email_from: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub mobile: Option<String>,

    #[serde(default)]
    pub company_name: Option<String>,

    #[serde(default)]
    pub street: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub country_id: Option<i64>,

    #[schemars(description = "Expected revenue, not negative")]
    #[serde(default)]
    pub expected_revenue: Option<f64>,

    #[schemars(description = "Success probability between 0 and 100 (default 10)")]
    #[serde(default)]
    pub probability: Option<f64>,

    #[serde(default)]
    pub description: Option<String>,

    #[schemars(description = "Lead source (utm.source id)")]
    #[serde(default)]
    pub source_id: Option<i64>,
}

pub async fn create_lead(
    client: &OdooClient,
    input: CreateLeadInput,
) -> Result<CreatedRecord, OdooError> {
    let partner = match input.partner_id {
        Some(partner_id) => Some(read_partner(client, partner_id).await?),
        None => None,
    };
    let values = lead_values(input, partner.as_ref())?;
    let id = client.create(LEAD_MODEL, values).await?;
    info!(event_name = "mcp.lead.created", id, "opportunity created");
    Ok(CreatedRecord { id })
}

async fn read_partner(client: &OdooClient, partner_id: i64) -> Result<Record, OdooError> {
    let fields = ["name", "is_company", "email", "phone", "mobile", "street", "city", "country_id"]
        .map(str::to_string);
    let mut partners = client.read("res.partner", &[partner_id], &fields).await?;
    partners.pop().ok_or_else(|| {
        OdooError::not_found(format!("res.partner record(s) {partner_id} do not exist"))
    })
}

pub(crate) fn lead_values(
    input: CreateLeadInput,
    partner: Option<&Record>,
) -> Result<Map<String, Value>, OdooError> {
    let name = require_text("name", &input.name)?;
    let probability = input.probability.unwrap_or(DEFAULT_PROBABILITY);
    if !(0.0..=100.0).contains(&probability) {
        return Err(OdooError::validation(format!(
            "probability must be between 0 and 100, got {probability}"
        )));
    }
    if let Some(revenue) = input.expected_revenue {
        if !revenue.is_finite() || revenue < 0.0 {
            return Err(OdooError::validation(format!(
                "expected_revenue must not be negative, got {revenue}"
            )));
        }
    }
    let email = optional_text(input.email_from.as_deref());
    if let Some(email) = &email {
        validate_email(email)?;
    }

    let mut values = Map::new();
    values.insert("name".into(), json!(name));
    values.insert("type".into(), json!("opportunity"));
    values.insert("probability".into(), json!(probability));
    if let Some(revenue) = input.expected_revenue {
        values.insert("expected_revenue".into(), json!(revenue));
    }

    let given = [
        ("contact_name", optional_text(input.contact_name.as_deref())),
        ("partner_name", optional_text(input.company_name.as_deref())),
        ("email_from", email),
        ("phone", optional_text(input.phone.as_deref())),
        ("mobile", optional_text(input.mobile.as_deref())),
        ("street", optional_text(input.street.as_deref())),
        ("city", optional_text(input.city.as_deref())),
        ("description", optional_text(input.description.as_deref())),
    ];
    for (field, value) in given {
        if let Some(text) = value {
            values.insert(field.into(), json!(text));
        }
    }
    if let Some(country_id) = input.country_id {
        values.insert("country_id".into(), json!(country_id));
    }
    if let Some(source_id) = input.source_id {
        values.insert("source_id".into(), json!(source_id));
    }

    if let Some(partner) = partner {
        fill_from_partner(&mut values, partner);
    }
    Ok(values)
}

fn fill_from_partner(values: &mut Map<String, Value>, partner: &Record) {
    if let Some(partner_id) = records::record_id(partner) {
        values.insert("partner_id".into(), json!(partner_id));
    }
    let is_company = records::bool_field(partner, "is_company");
    if let Some(name) = records::text_field(partner, "name") {
        let field = if is_company { "partner_name" } else { "contact_name" };
        values.entry(field).or_insert_with(|| json!(name));
    }
    for (lead_field, partner_field) in PARTNER_FALLBACKS {
        if let Some(text) = records::text_field(partner, partner_field) {
            values.entry(lead_field).or_insert_with(|| json!(text));
        }
    }
    if let Some(country_id) = records::many2one_id(partner, "country_id") {
        values.entry("country_id").or_insert_with(|| json!(country_id));
    }
}
