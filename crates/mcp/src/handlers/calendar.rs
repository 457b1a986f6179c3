use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use odoo_mcp_core::{Domain, OdooError};
use odoo_mcp_rpc::{records, OdooClient, Record, SearchOptions};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{optional_text, parse_date, parse_time, require_text, DATETIME_FORMAT, DATE_FORMAT};

const EVENT_MODEL: &str = "calendar.event";
const LEAD_MODEL: &str = "crm.lead";
const ACTIVITY_MODEL: &str = "mail.activity";
const ACTIVITY_TYPE_MODEL: &str = "mail.activity.type";
const EVENT_FIELDS: [&str; 8] =
    ["name", "start", "stop", "allday", "location", "description", "partner_ids", "opportunity_id"];
const TODO_TYPE_NAMES: [&str; 3] = ["To-Do", "To Do", "Todo"];

fn default_calendar_limit() -> u32 {
    50
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchCalendarInput {
    #[schemars(description = "First day to search, YYYY-MM-DD")]
    pub start_date: String,

    #[schemars(description = "Last day to search, YYYY-MM-DD (defaults to start_date)")]
    #[serde(default)]
    pub end_date: Option<String>,

    #[schemars(description = "Maximum number of events (default 50)")]
    #[serde(default = "default_calendar_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCalendarInput {
    #[schemars(description = "Day of the event, YYYY-MM-DD")]
    pub date: String,

    #[schemars(description = "Event title")]
    pub name: String,

    #[schemars(description = "Opportunity (crm.lead id) to link the event to")]
    #[serde(default)]
    pub lead_id: Option<i64>,

    #[schemars(description = "Start time, HH:MM; omit both times for an all-day event")]
    #[serde(default)]
    pub start_time: Option<String>,

    #[schemars(description = "End time, HH:MM; defaults to one hour after start_time")]
    #[serde(default)]
    pub end_time: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub name: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub allday: bool,
    pub location: Option<String>,
    pub description: Option<String>,
    pub attendees: Vec<String>,
    pub opportunity_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatedEvent {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EventWindow {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub allday: bool,
}

/// Start and stop of a new event on `date`.
pub(crate) fn event_window(
    date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<EventWindow, OdooError> {
    let (start, stop) = match (start_time, end_time) {
        (None, None) => {
            let start = date.and_time(NaiveTime::MIN);
            let stop = start + Duration::days(1) - Duration::seconds(1);
            return Ok(EventWindow { start, stop, allday: true });
        }
        (Some(start), None) => {
            let start = date.and_time(start);
            (start, start + Duration::hours(1))
        }
        (None, Some(end)) => (date.and_time(default_start_time()), date.and_time(end)),
        (Some(start), Some(end)) => (date.and_time(start), date.and_time(end)),
    };
    if stop <= start {
        return Err(OdooError::validation(format!(
            "end time {} must be after start time {}",
            stop.format("%H:%M"),
            start.format("%H:%M")
        )));
    }
    Ok(EventWindow { start, stop, allday: false })
}

fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Events the session user organizes or attends, ascending by start.
pub async fn search_calendar(
    client: &OdooClient,
    input: SearchCalendarInput,
) -> Result<Vec<CalendarEvent>, OdooError> {
    let start = parse_date("start_date", &input.start_date)?;
    let end = match optional_text(input.end_date.as_deref()) {
        Some(end) => parse_date("end_date", &end)?,
        None => start,
    };
    if end < start {
        return Err(OdooError::validation(format!(
            "end_date {end} is before start_date {start}"
        )));
    }

    let partner_id = client.current_partner_id().await?;
    let within_range = |domain: Domain| {
        domain
            .with("start", ">=", format!("{} 00:00:00", start.format(DATE_FORMAT)))
            .with("start", "<=", format!("{} 23:59:59", end.format(DATE_FORMAT)))
    };
    let organized = within_range(Domain::match_all().with("user_id", "=", client.uid()));
    let attended = within_range(Domain::match_all().with("partner_ids", "in", vec![partner_id]));

    let mut options = SearchOptions::default().fields(EVENT_FIELDS).order("start asc, id asc");
    options.limit = Some(input.limit);

    let mut events: BTreeMap<i64, Record> = BTreeMap::new();
    for domain in [organized, attended] {
        for event in client.search(EVENT_MODEL, &domain, &options).await? {
            if let Some(id) = records::record_id(&event) {
                events.entry(id).or_insert(event);
            }
        }
    }

    let mut events: Vec<(i64, Record)> = events.into_iter().collect();
    events.sort_by(|(left_id, left), (right_id, right)| {
        records::text_field(left, "start")
            .cmp(&records::text_field(right, "start"))
            .then(left_id.cmp(right_id))
    });
    // Odoo reads a zero limit as unlimited.
    if input.limit > 0 {
        events.truncate(input.limit as usize);
    }

    let names = attendee_names(client, &events).await?;
    Ok(events
        .iter()
        .map(|(id, event)| CalendarEvent {
            id: *id,
            name: records::text_field(event, "name"),
            start: records::text_field(event, "start"),
            stop: records::text_field(event, "stop"),
            allday: records::bool_field(event, "allday"),
            location: records::text_field(event, "location"),
            description: records::text_field(event, "description"),
            attendees: records::id_list(event, "partner_ids")
                .iter()
                .filter_map(|partner_id| names.get(partner_id).cloned())
                .collect(),
            opportunity_id: records::many2one_id(event, "opportunity_id"),
        })
        .collect())
}

async fn attendee_names(
    client: &OdooClient,
    events: &[(i64, Record)],
) -> Result<HashMap<i64, String>, OdooError> {
    let mut partner_ids: Vec<i64> =
        events.iter().flat_map(|(_, event)| records::id_list(event, "partner_ids")).collect();
    partner_ids.sort_unstable();
    partner_ids.dedup();
    if partner_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let domain = Domain::match_all().with("id", "in", partner_ids);
    let options = SearchOptions::default().fields(["name"]);
    let partners = client.search("res.partner", &domain, &options).await?;
    Ok(partners
        .iter()
        .filter_map(|partner| {
            Some((records::record_id(partner)?, records::text_field(partner, "name")?))
        })
        .collect())
}

pub async fn create_calendar(
    client: &OdooClient,
    input: CreateCalendarInput,
) -> Result<CreatedEvent, OdooError> {
    let name = require_text("name", &input.name)?;
    let date = parse_date("date", &input.date)?;
    let start_time = optional_text(input.start_time.as_deref())
        .map(|time| parse_time("start_time", &time))
        .transpose()?;
    let end_time = optional_text(input.end_time.as_deref())
        .map(|time| parse_time("end_time", &time))
        .transpose()?;
    let window = event_window(date, start_time, end_time)?;

    let lead = match input.lead_id {
        Some(lead_id) => Some(read_lead(client, lead_id).await?),
        None => None,
    };

    let mut attendees = vec![client.current_partner_id().await?];
    let lead_partner = lead.as_ref().and_then(|lead| records::many2one_id(lead, "partner_id"));
    if let Some(partner_id) = lead_partner {
        if !attendees.contains(&partner_id) {
            attendees.push(partner_id);
        }
    }

    let description = optional_text(input.description.as_deref());
    let mut values = Map::new();
    values.insert("name".into(), json!(name));
    values.insert("start".into(), json!(window.start.format(DATETIME_FORMAT).to_string()));
    values.insert("stop".into(), json!(window.stop.format(DATETIME_FORMAT).to_string()));
    values.insert("allday".into(), json!(window.allday));
    values.insert("user_id".into(), json!(client.uid()));
    values.insert("partner_ids".into(), json!([[6, 0, attendees]]));
    if let Some(description) = &description {
        values.insert("description".into(), json!(description));
    }
    if let Some(location) = optional_text(input.location.as_deref()) {
        values.insert("location".into(), json!(location));
    }

    let lead_model_id = match lead {
        Some(_) => lead_model_id(client).await,
        None => None,
    };
    if let Some(lead_id) = input.lead_id {
        values.insert("opportunity_id".into(), json!(lead_id));
        values.insert("res_model".into(), json!(LEAD_MODEL));
        values.insert("res_id".into(), json!(lead_id));
        if let Some(model_id) = lead_model_id {
            values.insert("res_model_id".into(), json!(model_id));
        }
    }

    let id = client.create(EVENT_MODEL, values).await?;
    info!(
        event_name = "mcp.calendar.created",
        id,
        lead_id = ?input.lead_id,
        "calendar event created"
    );

    let activity_id = match (&lead, input.lead_id, lead_model_id) {
        (Some(lead), Some(lead_id), Some(model_id)) => {
            let activity = ActivityRequest {
                lead_id,
                lead_model_id: model_id,
                user_id: records::many2one_id(lead, "user_id").unwrap_or_else(|| client.uid()),
                summary: &name,
                note: description.as_deref(),
                deadline: date,
            };
            schedule_activity(client, activity).await
        }
        _ => None,
    };

    Ok(CreatedEvent { id, activity_id })
}

async fn read_lead(client: &OdooClient, lead_id: i64) -> Result<Record, OdooError> {
    let fields = ["name", "partner_id", "user_id"].map(str::to_string);
    let mut leads = client.read(LEAD_MODEL, &[lead_id], &fields).await?;
    leads.pop().ok_or_else(|| {
        OdooError::not_found(format!("{LEAD_MODEL} record(s) {lead_id} do not exist"))
    })
}

async fn lead_model_id(client: &OdooClient) -> Option<i64> {
    let domain = Domain::match_all().with("model", "=", LEAD_MODEL);
    let options = SearchOptions::default().fields(["model"]).limit(1);
    match client.search("ir.model", &domain, &options).await {
        Ok(models) => models.first().and_then(records::record_id),
        Err(error) => {
            warn!(event_name = "mcp.calendar.model_lookup_failed", error = %error);
            None
        }
    }
}

struct ActivityRequest<'a> {
    lead_id: i64,
    lead_model_id: i64,
    user_id: i64,
    summary: &'a str,
    note: Option<&'a str>,
    deadline: NaiveDate,
}

/// Schedules a to-do on the lead. Failures are logged and reported as `None`.
async fn schedule_activity(client: &OdooClient, request: ActivityRequest<'_>) -> Option<i64> {
    let mut values = Map::new();
    values.insert("res_model_id".into(), json!(request.lead_model_id));
    values.insert("res_id".into(), json!(request.lead_id));
    values.insert("summary".into(), json!(request.summary));
    values.insert("date_deadline".into(), json!(request.deadline.format(DATE_FORMAT).to_string()));
    values.insert("user_id".into(), json!(request.user_id));
    if let Some(note) = request.note {
        values.insert("note".into(), json!(note));
    }
    if let Some(type_id) = todo_activity_type(client).await {
        values.insert("activity_type_id".into(), Value::from(type_id));
    }

    match client.create(ACTIVITY_MODEL, values).await {
        Ok(id) => Some(id),
        Err(error) => {
            warn!(
                event_name = "mcp.calendar.activity_failed",
                lead_id = request.lead_id,
                error = %error,
                "could not schedule follow-up activity"
            );
            None
        }
    }
}

async fn todo_activity_type(client: &OdooClient) -> Option<i64> {
    for name in TODO_TYPE_NAMES {
        let domain = Domain::match_all().with("name", "ilike", name);
        let options = SearchOptions::default().limit(1);
        match client.search_ids(ACTIVITY_TYPE_MODEL, &domain, &options).await {
            Ok(ids) if !ids.is_empty() => return ids.first().copied(),
            Ok(_) => continue,
            Err(error) => {
                warn!(event_name = "mcp.calendar.activity_type_lookup_failed", error = %error);
                return None;
            }
        }
    }
    None
}
