//! Tool implementations. Each handler validates its input, talks to the
//! client and returns a serializable payload; the server wraps the outcome in
//! an [`Envelope`](crate::envelope::Envelope).

pub mod calendar;
pub mod crm;
pub mod hr;
pub mod partner;
pub mod records;

use chrono::{NaiveDate, NaiveTime};
use odoo_mcp_core::OdooError;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, OdooError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        OdooError::validation(format!("invalid {field} `{value}`, expected YYYY-MM-DD"))
    })
}

pub(crate) fn parse_time(field: &str, value: &str) -> Result<NaiveTime, OdooError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| OdooError::validation(format!("invalid {field} `{value}`, expected HH:MM")))
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<String, OdooError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OdooError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trimmed text, or `None` for absent and blank values.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
}
