//! Tool and resource behaviour of the MCP server against the in-memory Odoo.

use std::sync::Arc;

use odoo_mcp::handlers::calendar::{CreateCalendarInput, SearchCalendarInput};
use odoo_mcp::handlers::crm::CreateLeadInput;
use odoo_mcp::handlers::hr::{SearchEmployeeInput, SearchHolidaysInput};
use odoo_mcp::handlers::partner::{
    CreateCustomerInput, SearchPartnerByNameInput, SearchPartnerInput,
};
use odoo_mcp::handlers::records::{
    CreateRecordInput, DeleteRecordInput, ExecuteMethodInput, ModelInput, ReadRecordsInput,
    SearchRecordsInput, UpdateRecordInput,
};
use odoo_mcp::resources::read_resource;
use odoo_mcp::{OdooMcpServer, ToolArgs, ALL_TOOL_NAMES};
use odoo_mcp_core::ConnectionConfig;
use odoo_mcp_rpc::{InMemoryOdoo, OdooClient, RpcTransport};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolRequestParam, CallToolResult, ErrorCode};
use rmcp::ServiceExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

struct Fixture {
    odoo: Arc<InMemoryOdoo>,
    server: OdooMcpServer,
    admin_partner: i64,
    demo_uid: i64,
    demo_partner: i64,
    azure: i64,
    lead: i64,
    abigail: i64,
}

fn config() -> ConnectionConfig {
    ConnectionConfig {
        url: "http://odoo.test".to_string(),
        database: "test".to_string(),
        username: "admin".to_string(),
        password: "admin".to_string().into(),
        timeout_secs: 5,
        verify_ssl: true,
        proxy: None,
    }
}

async fn fixture() -> Fixture {
    let mut odoo = InMemoryOdoo::with_standard_models("test");
    let (admin_uid, admin_partner) = odoo.add_user("admin", "admin", "Mitchell Admin");
    let (demo_uid, demo_partner) = odoo.add_user("demo", "demo", "Marc Demo");

    let azure = odoo.insert(
        "res.partner",
        json!({
            "name": "Azure Interior",
            "is_company": true,
            "email": "azure.Interior24@example.com",
            "phone": "(870)-931-0505",
            "city": "Fremont",
        }),
    );
    odoo.insert("res.partner", json!({"name": "Azure Logistics", "is_company": true}));
    odoo.insert("res.partner", json!({"name": "Azure Freelancer", "is_company": false}));

    let abigail = odoo.insert("hr.employee", json!({"name": "Abigail Peterson"}));
    let anita = odoo.insert("hr.employee", json!({"name": "Anita Oliver"}));
    odoo.insert(
        "hr.leave.report.calendar",
        json!({
            "name": "Abigail Peterson on Time Off",
            "employee_id": abigail,
            "start_datetime": "2025-03-03 07:00:00",
            "stop_datetime": "2025-03-05 16:00:00",
            "state": "validate",
        }),
    );
    odoo.insert(
        "hr.leave.report.calendar",
        json!({
            "name": "Anita Oliver on Time Off",
            "employee_id": anita,
            "start_datetime": "2025-04-10 07:00:00",
            "stop_datetime": "2025-04-11 16:00:00",
            "state": "confirm",
        }),
    );

    let lead = odoo.insert(
        "crm.lead",
        json!({
            "name": "Office Design",
            "type": "opportunity",
            "partner_id": azure,
            "user_id": admin_uid,
        }),
    );
    odoo.insert("mail.activity.type", json!({"name": "Email"}));
    odoo.insert("mail.activity.type", json!({"name": "To-Do"}));

    odoo.insert(
        "calendar.event",
        json!({
            "name": "Pipeline review",
            "start": "2025-03-10 09:00:00",
            "stop": "2025-03-10 10:00:00",
            "user_id": admin_uid,
            "partner_ids": [admin_partner],
        }),
    );
    odoo.insert(
        "calendar.event",
        json!({
            "name": "Customer call",
            "start": "2025-03-10 08:00:00",
            "stop": "2025-03-10 08:30:00",
            "user_id": demo_uid,
            "partner_ids": [demo_partner, admin_partner],
        }),
    );
    odoo.insert(
        "calendar.event",
        json!({
            "name": "Demo one-on-one",
            "start": "2025-03-10 11:00:00",
            "stop": "2025-03-10 11:30:00",
            "user_id": demo_uid,
            "partner_ids": [demo_partner],
        }),
    );

    let odoo = Arc::new(odoo);
    let transport: Arc<dyn RpcTransport> = odoo.clone();
    let client = OdooClient::authenticate(transport, &config()).await.expect("login");
    Fixture {
        odoo,
        server: OdooMcpServer::new(Arc::new(client)),
        admin_partner,
        demo_uid,
        demo_partner,
        azure,
        lead,
        abigail,
    }
}

type Args<T> = Parameters<ToolArgs<T>>;

fn params<T: DeserializeOwned>(value: Value) -> Args<T> {
    Parameters(serde_json::from_value(value).expect("tool input"))
}

fn envelope(result: CallToolResult) -> Value {
    let text = result
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .expect("text content");
    serde_json::from_str(&text).expect("json envelope")
}

fn assert_envelope_shape(value: &Value) {
    let object = value.as_object().expect("envelope object");
    match object.get("success") {
        Some(Value::Bool(true)) => {
            assert!(object.contains_key("data"), "success without data: {value}");
            assert!(!object.contains_key("error"), "success with error: {value}");
        }
        Some(Value::Bool(false)) => {
            let error = object.get("error").and_then(Value::as_str).unwrap_or_default();
            assert!(!error.trim().is_empty(), "failure without message: {value}");
            assert!(!object.contains_key("data"), "failure with data: {value}");
        }
        other => panic!("missing success flag: {other:?}"),
    }
}

fn data(value: Value) -> Value {
    assert_eq!(value["success"], json!(true), "expected success, got {value}");
    value["data"].clone()
}

fn error(value: Value) -> String {
    assert_eq!(value["success"], json!(false), "expected failure, got {value}");
    value["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn registered_tools_match_the_catalog() {
    let fx = fixture().await;
    let mut expected: Vec<String> = ALL_TOOL_NAMES.iter().map(|name| name.to_string()).collect();
    expected.sort();
    assert_eq!(fx.server.tool_names(), expected);
}

#[tokio::test]
async fn unknown_employee_is_an_empty_success() {
    let fx = fixture().await;
    let input: Args<SearchEmployeeInput> = params(json!({"name": "nonexistent-name-xyz"}));
    let result = envelope(fx.server.search_employee(input).await.expect("call"));
    assert_eq!(result, json!({"success": true, "data": []}));
}

#[tokio::test]
async fn employee_search_matches_name_fragments() {
    let fx = fixture().await;
    let input: Args<SearchEmployeeInput> = params(json!({"name": "abig", "limit": 5}));
    let result = data(envelope(fx.server.search_employee(input).await.expect("call")));
    assert_eq!(result, json!([{"id": fx.abigail, "name": "Abigail Peterson"}]));
}

#[tokio::test]
async fn holidays_overlapping_the_range_are_returned() {
    let fx = fixture().await;
    let input: Args<SearchHolidaysInput> =
        params(json!({"start_date": "2025-03-05", "end_date": "2025-03-07"}));
    let result = data(envelope(fx.server.search_holidays(input).await.expect("call")));
    let holidays = result.as_array().expect("list");
    assert_eq!(holidays.len(), 1);
    assert_eq!(holidays[0]["employee_id"], json!(fx.abigail));
    assert_eq!(holidays[0]["employee"], json!("Abigail Peterson"));
    assert_eq!(holidays[0]["status"], json!("validate"));

    let filtered: Args<SearchHolidaysInput> = params(json!({
        "start_date": "2025-03-01",
        "end_date": "2025-04-30",
        "employee_id": fx.abigail,
    }));
    let result = data(envelope(fx.server.search_holidays(filtered).await.expect("call")));
    assert_eq!(result.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn holidays_reject_malformed_dates() {
    let fx = fixture().await;
    let input: Args<SearchHolidaysInput> =
        params(json!({"start_date": "05/03/2025", "end_date": "2025-03-07"}));
    let message = error(envelope(fx.server.search_holidays(input).await.expect("call")));
    assert!(message.contains("YYYY-MM-DD"));
}

#[tokio::test]
async fn calendar_only_shows_the_session_users_events() {
    let fx = fixture().await;
    let input: Args<SearchCalendarInput> = params(json!({
        "start_date": "2025-03-10",
        "employee_id": fx.demo_uid,
        "user_id": fx.demo_uid,
    }));
    let result = data(envelope(fx.server.search_calendar(input).await.expect("call")));
    let names: Vec<&str> = result
        .as_array()
        .expect("list")
        .iter()
        .filter_map(|event| event["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Customer call", "Pipeline review"]);

    let call = &result[0];
    assert_eq!(call["attendees"], json!(["Marc Demo", "Mitchell Admin"]));
    assert_eq!(call["allday"], json!(false));
}

#[tokio::test]
async fn calendar_respects_the_date_range_and_limit() {
    let fx = fixture().await;
    let empty: Args<SearchCalendarInput> =
        params(json!({"start_date": "2025-03-11", "end_date": "2025-03-31"}));
    let result = data(envelope(fx.server.search_calendar(empty).await.expect("call")));
    assert_eq!(result, json!([]));

    let limited: Args<SearchCalendarInput> =
        params(json!({"start_date": "2025-03-10", "limit": 1}));
    let result = data(envelope(fx.server.search_calendar(limited).await.expect("call")));
    assert_eq!(result.as_array().map(Vec::len), Some(1));
    assert_eq!(result[0]["name"], json!("Customer call"));

    let unlimited: Args<SearchCalendarInput> =
        params(json!({"start_date": "2025-03-10", "limit": 0}));
    let result = data(envelope(fx.server.search_calendar(unlimited).await.expect("call")));
    assert_eq!(result.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn create_calendar_invites_the_lead_customer_and_schedules_a_todo() {
    let fx = fixture().await;
    let input: Args<CreateCalendarInput> = params(json!({
        "date": "2025-03-20",
        "name": "Design workshop",
        "lead_id": fx.lead,
        "start_time": "14:00",
        "location": "Fremont office",
    }));
    let result = data(envelope(fx.server.create_calendar(input).await.expect("call")));
    let event_id = result["id"].as_i64().expect("event id");
    let activity_id = result["activity_id"].as_i64().expect("activity id");

    let event = fx.odoo.record("calendar.event", event_id).await.expect("event stored");
    assert_eq!(event["start"], json!("2025-03-20 14:00:00"));
    assert_eq!(event["stop"], json!("2025-03-20 15:00:00"));
    assert_eq!(event["allday"], json!(false));
    assert_eq!(event["partner_ids"], json!([fx.admin_partner, fx.azure]));
    assert_eq!(event["opportunity_id"], json!(fx.lead));
    assert_eq!(event["res_model"], json!("crm.lead"));

    let activity = fx.odoo.record("mail.activity", activity_id).await.expect("activity stored");
    assert_eq!(activity["res_id"], json!(fx.lead));
    assert_eq!(activity["date_deadline"], json!("2025-03-20"));
    assert_eq!(activity["summary"], json!("Design workshop"));
}

#[tokio::test]
async fn create_calendar_without_times_is_all_day() {
    let fx = fixture().await;
    let input: Args<CreateCalendarInput> =
        params(json!({"date": "2025-03-21", "name": "Offsite"}));
    let result = data(envelope(fx.server.create_calendar(input).await.expect("call")));
    assert!(result.get("activity_id").is_none());

    let event_id = result["id"].as_i64().expect("event id");
    let event = fx.odoo.record("calendar.event", event_id).await.expect("event stored");
    assert_eq!(event["allday"], json!(true));
    assert_eq!(event["partner_ids"], json!([fx.admin_partner]));
}

#[tokio::test]
async fn create_calendar_rejects_bad_input() {
    let fx = fixture().await;
    let missing_lead: Args<CreateCalendarInput> =
        params(json!({"date": "2025-03-21", "name": "Call", "lead_id": 9999}));
    let message = error(envelope(fx.server.create_calendar(missing_lead).await.expect("call")));
    assert!(message.contains("not found"));

    let backwards: Args<CreateCalendarInput> = params(json!({
        "date": "2025-03-21",
        "name": "Call",
        "start_time": "15:00",
        "end_time": "14:00",
    }));
    let message = error(envelope(fx.server.create_calendar(backwards).await.expect("call")));
    assert!(message.contains("after start time"));
}

#[tokio::test]
async fn partner_searches_only_return_companies() {
    let fx = fixture().await;
    let input: Args<SearchPartnerByNameInput> = params(json!({"name": "azure", "limit": 0}));
    let result = data(envelope(fx.server.search_partner_by_name(input).await.expect("call")));
    let names: Vec<&str> =
        result.as_array().expect("list").iter().filter_map(|p| p["name"].as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(!names.contains(&"Azure Freelancer"));

    let azure = result
        .as_array()
        .and_then(|partners| partners.iter().find(|p| p["id"] == json!(fx.azure)))
        .expect("azure");
    assert_eq!(azure["email"], json!("azure.Interior24@example.com"));
    assert_eq!(azure["comment"], json!(null));

    let limited: Args<SearchPartnerInput> = params(json!({"limit": 1}));
    let result = data(envelope(fx.server.search_partner(limited).await.expect("call")));
    assert_eq!(result.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn create_customer_marks_the_partner_as_customer() {
    let fx = fixture().await;
    let input: Args<CreateCustomerInput> =
        params(json!({"name": "Ready Mat", "email": "info@readymat.example.com", "city": "Ghent"}));
    let result = data(envelope(fx.server.create_customer(input).await.expect("call")));
    let id = result["id"].as_i64().expect("id");

    let partner = fx.odoo.record("res.partner", id).await.expect("stored");
    assert_eq!(partner["customer_rank"], json!(1));
    assert_eq!(partner["is_company"], json!(true));

    let bad: Args<CreateCustomerInput> = params(json!({"name": "X", "email": "nope"}));
    let message = error(envelope(fx.server.create_customer(bad).await.expect("call")));
    assert!(message.contains("invalid email"));
}

#[tokio::test]
async fn create_lead_copies_partner_contact_data() {
    let fx = fixture().await;
    let input: Args<CreateLeadInput> = params(json!({
        "name": "Chairs for Azure",
        "partner_id": fx.azure,
        "expected_revenue": 12000.0,
    }));
    let result = data(envelope(fx.server.create_lead(input).await.expect("call")));
    let id = result["id"].as_i64().expect("id");

    let lead = fx.odoo.record("crm.lead", id).await.expect("stored");
    assert_eq!(lead["type"], json!("opportunity"));
    assert_eq!(lead["partner_name"], json!("Azure Interior"));
    assert_eq!(lead["email_from"], json!("azure.Interior24@example.com"));
    assert_eq!(lead["city"], json!("Fremont"));
    assert_eq!(lead["probability"], json!(10.0));

    let missing: Args<CreateLeadInput> =
        params(json!({"name": "Ghost", "partner_id": 424242}));
    let message = error(envelope(fx.server.create_lead(missing).await.expect("call")));
    assert!(message.contains("424242"));
}

#[tokio::test]
async fn create_then_read_round_trips_through_the_tools() {
    let fx = fixture().await;
    let create: Args<CreateRecordInput> = params(json!({
        "model": "res.partner",
        "values": {"name": "Gemini Furniture", "email": "gemini@example.com"},
    }));
    let id = data(envelope(fx.server.create_record(create).await.expect("call")))["id"]
        .as_i64()
        .expect("id");

    let read: Args<ReadRecordsInput> =
        params(json!({"model": "res.partner", "ids": [id], "fields": ["name", "email"]}));
    let records = data(envelope(fx.server.read_records(read).await.expect("call")));
    assert_eq!(records[0]["name"], json!("Gemini Furniture"));
    assert_eq!(records[0]["email"], json!("gemini@example.com"));
}

#[tokio::test]
async fn read_of_a_missing_id_is_a_not_found_failure() {
    let fx = fixture().await;
    let read: Args<ReadRecordsInput> = params(json!({"model": "res.partner", "ids": [99999]}));
    let message = error(envelope(fx.server.read_records(read).await.expect("call")));
    assert!(message.contains("not found"));
    assert!(message.contains("99999"));
}

#[tokio::test]
async fn search_records_accepts_every_domain_shape() {
    let fx = fixture().await;
    let shapes = [
        json!([["is_company", "=", true]]),
        json!({"conditions": [{"field": "is_company", "operator": "=", "value": true}]}),
        json!(r#"[["is_company", "=", true]]"#),
    ];
    for domain in shapes {
        let input: Args<SearchRecordsInput> = params(json!({
            "model": "res.partner",
            "domain": domain,
            "fields": ["name"],
            "order": "name asc",
        }));
        let result = data(envelope(fx.server.search_records(input).await.expect("call")));
        let names: Vec<&str> =
            result.as_array().expect("list").iter().filter_map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["Azure Interior", "Azure Logistics"]);
    }

    let invalid: Args<SearchRecordsInput> =
        params(json!({"model": "res.partner", "domain": {"foo": 1}}));
    let message = error(envelope(fx.server.search_records(invalid).await.expect("call")));
    assert!(message.contains("invalid domain"));
}

#[tokio::test]
async fn update_delete_and_describe_report_through_the_envelope() {
    let fx = fixture().await;
    let update: Args<UpdateRecordInput> =
        params(json!({"model": "res.partner", "id": fx.azure, "values": {"city": "San Jose"}}));
    let result = data(envelope(fx.server.update_record(update).await.expect("call")));
    assert_eq!(result, json!({"id": fx.azure, "updated": true}));

    let delete: Args<DeleteRecordInput> =
        params(json!({"model": "res.partner", "id": 424242}));
    let message = error(envelope(fx.server.delete_record(delete).await.expect("call")));
    assert!(message.contains("not found"));

    let describe: Args<ModelInput> = params(json!({"model": "crm.lead"}));
    let result = data(envelope(fx.server.get_model_fields(describe).await.expect("call")));
    assert_eq!(result["model"], json!("crm.lead"));
    assert!(result["fields"].as_array().is_some_and(|fields| !fields.is_empty()));
}

#[tokio::test]
async fn execute_method_passes_through_and_wraps_failures() {
    let fx = fixture().await;
    let ok: Args<ExecuteMethodInput> = params(json!({
        "model": "hr.employee",
        "method": "search_count",
        "args": [[["name", "ilike", "a"]]],
    }));
    let result = data(envelope(fx.server.execute_method(ok).await.expect("call")));
    assert_eq!(result, json!(2));

    let unknown: Args<ExecuteMethodInput> =
        params(json!({"model": "hr.employee", "method": "fire_everyone"}));
    let message = error(envelope(fx.server.execute_method(unknown).await.expect("call")));
    assert!(message.contains("fire_everyone"));
}

#[tokio::test]
async fn every_tool_answers_with_one_envelope_shape() {
    let fx = fixture().await;
    let server = &fx.server;
    let email_only = json!({"model": "res.partner", "values": {"email": "x@y.zz"}});
    let missing_id = json!({"model": "res.partner", "id": 0, "values": {"name": "x"}});
    let passthrough = json!({
        "model": "res.partner",
        "method": "name_search",
        "kwargs": {"name": "azure"},
    });
    let reversed = json!({"start_date": "2025-03-08", "end_date": "2025-03-01"});
    let mut results = vec![
        server.search_records(params(json!({"model": "res.partner"}))).await,
        server.search_records(params(json!({"model": "no.such.model"}))).await,
        server.read_records(params(json!({"model": "res.partner", "ids": [fx.azure]}))).await,
        server.read_records(params(json!({"model": "res.partner", "ids": [0]}))).await,
        server.create_record(params(json!({"model": "res.partner", "values": {}}))).await,
        server.read_records(params(json!({"model": "res.partner"}))).await,
        server.create_record(params(email_only)).await,
        server.update_record(params(missing_id)).await,
        server.update_record(params(json!({"model": "res.partner", "id": "one"}))).await,
        server.delete_record(params(json!({"model": "res.partner", "id": fx.demo_partner}))).await,
        server.get_model_fields(params(json!({"model": "no.such.model"}))).await,
        server.execute_method(params(passthrough)).await,
        server.search_employee(params(json!({"name": ""}))).await,
        server.search_holidays(params(reversed)).await,
        server.search_holidays(params(json!({}))).await,
        server.search_partner(params(json!({}))).await,
        server.search_partner_by_name(params(json!({"name": "   "}))).await,
        server.create_customer(params(json!({"name": ""}))).await,
        server.search_calendar(params(json!({"start_date": "tomorrow"}))).await,
        server.create_calendar(params(json!({"date": "2025-03-21", "name": "   "}))).await,
        server.create_lead(params(json!({"name": "Too likely", "probability": 150.0}))).await,
        server.create_lead(params(json!({"name": "Typed", "probability": "high"}))).await,
    ];
    for result in results.drain(..) {
        assert_envelope_shape(&envelope(result.expect("tool call never errors at protocol level")));
    }
}

#[tokio::test]
async fn resources_resolve_models_records_and_searches() {
    let fx = fixture().await;
    let client = fx.server.client();

    let models: Value =
        serde_json::from_str(&read_resource(client, "odoo://models").await.expect("models"))
            .expect("json");
    let has_leads = models.as_array().is_some_and(|models| {
        models.iter().any(|model| model["model"] == "crm.lead")
    });
    assert!(has_leads);

    let record: Value = serde_json::from_str(
        &read_resource(client, &format!("odoo://record/res.partner/{}", fx.azure))
            .await
            .expect("record"),
    )
    .expect("json");
    assert_eq!(record["name"], json!("Azure Interior"));

    let search: Value = serde_json::from_str(
        &read_resource(
            client,
            "odoo://search/res.partner/%5B%5B%22is_company%22%2C%22%3D%22%2Ctrue%5D%5D",
        )
        .await
        .expect("search"),
    )
    .expect("json");
    assert_eq!(search.as_array().map(Vec::len), Some(2));

    let invalid: Value = serde_json::from_str(
        &read_resource(client, "odoo://search/res.partner/%7B%22foo%22%3A1%7D")
            .await
            .expect("error document"),
    )
    .expect("json");
    assert!(invalid["error"].as_str().is_some_and(|message| message.contains("invalid domain")));
}

#[tokio::test]
async fn missing_resources_are_protocol_not_found_errors() {
    let fx = fixture().await;
    let client = fx.server.client();

    let missing = read_resource(client, "odoo://record/res.partner/99999").await;
    assert_eq!(missing.map_err(|error| error.code), Err(ErrorCode::RESOURCE_NOT_FOUND));

    let unknown_model = read_resource(client, "odoo://model/no.such.model").await;
    assert_eq!(unknown_model.map_err(|error| error.code), Err(ErrorCode::RESOURCE_NOT_FOUND));

    let unsupported = read_resource(client, "odoo://invoices").await;
    assert_eq!(unsupported.map_err(|error| error.code), Err(ErrorCode::RESOURCE_NOT_FOUND));
}

#[tokio::test]
async fn malformed_arguments_over_the_wire_are_failure_envelopes() {
    let fx = fixture().await;
    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let server = fx.server.clone();
    tokio::spawn(async move {
        if let Ok(running) = server.serve(server_io).await {
            let _ = running.waiting().await;
        }
    });
    let client = ().serve(client_io).await.expect("client handshake");

    let malformed = [json!({"model": "res.partner"}), json!({"model": "res.partner", "ids": "7"})];
    for arguments in malformed {
        let result = client
            .call_tool(CallToolRequestParam {
                name: "read_records".into(),
                arguments: arguments.as_object().cloned(),
            })
            .await
            .expect("bad arguments must not be a protocol error");
        let value = envelope(result);
        assert_envelope_shape(&value);
        assert!(error(value).contains("invalid arguments"));
    }

    let result = client
        .call_tool(CallToolRequestParam { name: "search_partner".into(), arguments: None })
        .await
        .expect("call");
    assert!(data(envelope(result)).as_array().is_some_and(|companies| !companies.is_empty()));

    let ok = client
        .call_tool(CallToolRequestParam {
            name: "read_records".into(),
            arguments: json!({"model": "res.partner", "ids": [fx.azure]}).as_object().cloned(),
        })
        .await
        .expect("call");
    assert_eq!(data(envelope(ok))[0]["name"], json!("Azure Interior"));

    let tools = client.list_all_tools().await.expect("list tools");
    let read = tools.iter().find(|tool| tool.name == "read_records").expect("read_records");
    let properties = read.input_schema.get("properties").expect("properties");
    assert!(properties.get("ids").is_some());
    assert!(properties.get("model").is_some());

    client.cancel().await.expect("shutdown");
}
