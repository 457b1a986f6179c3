use chrono::Duration;
use odoo_mcp_core::{Domain, OdooError};
use odoo_mcp_rpc::{records, OdooClient, SearchOptions};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use super::{parse_date, require_text, DATE_FORMAT};

const EMPLOYEE_MODEL: &str = "hr.employee";
const LEAVE_CALENDAR_MODEL: &str = "hr.leave.report.calendar";

// Leave boundaries are stored in UTC; these bounds cover a UTC+1 working day.
const WINDOW_END_TIME: &str = "22:59:59";
const WINDOW_START_TIME: &str = "23:00:00";

fn default_employee_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchEmployeeInput {
    #[schemars(description = "Name, or part of the name, to search for")]
    pub name: String,

    #[schemars(description = "Maximum number of results (default 20)")]
    #[serde(default = "default_employee_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchHolidaysInput {
    #[schemars(description = "First day of the range, YYYY-MM-DD")]
    pub start_date: String,

    #[schemars(description = "Last day of the range, YYYY-MM-DD")]
    pub end_date: String,

    #[schemars(description = "Only return time off of this employee")]
    #[serde(default)]
    pub employee_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmployeeMatch {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Holiday {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub employee_id: Option<i64>,
    pub employee: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub status: Option<String>,
}

pub async fn search_employee(
    client: &OdooClient,
    input: SearchEmployeeInput,
) -> Result<Vec<EmployeeMatch>, OdooError> {
    let matches = client.name_search(EMPLOYEE_MODEL, input.name.trim(), input.limit).await?;
    Ok(matches.into_iter().map(|(id, name)| EmployeeMatch { id, name }).collect())
}

/// Time off overlapping `[start_date, end_date]`.
pub async fn search_holidays(
    client: &OdooClient,
    input: SearchHolidaysInput,
) -> Result<Vec<Holiday>, OdooError> {
    let domain = holiday_domain(&input)?;
    let options = SearchOptions::default().fields([
        "name",
        "employee_id",
        "start_datetime",
        "stop_datetime",
        "state",
    ]);

    let leaves = client.search(LEAVE_CALENDAR_MODEL, &domain, &options).await?;
    Ok(leaves
        .iter()
        .map(|leave| Holiday {
            id: records::record_id(leave),
            name: records::text_field(leave, "name"),
            employee_id: records::many2one_id(leave, "employee_id"),
            employee: records::many2one_name(leave, "employee_id"),
            start: records::text_field(leave, "start_datetime"),
            end: records::text_field(leave, "stop_datetime"),
            status: records::text_field(leave, "state"),
        })
        .collect())
}

pub(crate) fn holiday_domain(input: &SearchHolidaysInput) -> Result<Domain, OdooError> {
    let start = parse_date("start_date", &require_text("start_date", &input.start_date)?)?;
    let end = parse_date("end_date", &require_text("end_date", &input.end_date)?)?;
    if end < start {
        return Err(OdooError::validation(format!(
            "end_date {end} is before start_date {start}"
        )));
    }
    let day_before_start = start - Duration::days(1);

    let mut domain = Domain::match_all()
        .with("start_datetime", "<=", format!("{} {WINDOW_END_TIME}", end.format(DATE_FORMAT)))
        .with(
            "stop_datetime",
            ">=",
            format!("{} {WINDOW_START_TIME}", day_before_start.format(DATE_FORMAT)),
        );
    if let Some(employee_id) = input.employee_id {
        domain = domain.with("employee_id", "=", employee_id);
    }
    Ok(domain)
}
