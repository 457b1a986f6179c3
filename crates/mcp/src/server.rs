//! MCP server: one `#[tool]` per operation, each answering with an
//! [`Envelope`], plus the `odoo://` resources.

use std::future::Future;
use std::sync::Arc;

use odoo_mcp_core::OdooError;
use odoo_mcp_rpc::OdooClient;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Serialize;

use crate::arguments::ToolArgs;
use crate::envelope::Envelope;
use crate::handlers::calendar::{self, CreateCalendarInput, SearchCalendarInput};
use crate::handlers::crm::{self, CreateLeadInput};
use crate::handlers::hr::{self, SearchEmployeeInput, SearchHolidaysInput};
use crate::handlers::partner::{
    self, CreateCustomerInput, SearchPartnerByNameInput, SearchPartnerInput,
};
use crate::handlers::records::{
    self, CreateRecordInput, DeleteRecordInput, ExecuteMethodInput, ModelInput, ReadRecordsInput,
    SearchRecordsInput, UpdateRecordInput,
};
use crate::{resources, tools};

/// Exposes one authenticated Odoo session over MCP.
#[derive(Clone)]
pub struct OdooMcpServer {
    client: Arc<OdooClient>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for OdooMcpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooMcpServer").field("client", &self.client).finish_non_exhaustive()
    }
}

/// Decodes the arguments and runs the handler; both kinds of failure end up
/// in the envelope.
async fn run<I, T, F, Fut>(
    tool: &str,
    args: ToolArgs<I>,
    handler: F,
) -> Result<CallToolResult, McpError>
where
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = Result<T, OdooError>>,
    T: Serialize,
{
    let result = match args.into_input() {
        Ok(input) => handler(input).await,
        Err(error) => Err(error),
    };
    Ok(Envelope::from_result(tool, result).into_call_result())
}

#[tool_router]
impl OdooMcpServer {
    pub fn new(client: Arc<OdooClient>) -> Self {
        Self { client, tool_router: Self::tool_router() }
    }

    pub fn client(&self) -> &OdooClient {
        &self.client
    }

    /// Names of the registered tools, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.tool_router.list_all().into_iter().map(|tool| tool.name.to_string()).collect();
        names.sort();
        names
    }

    #[tool(
        name = "search_records",
        description = "Search records of any model with a domain filter, optional field list, limit, offset and order"
    )]
    pub async fn search_records(
        &self,
        Parameters(args): Parameters<ToolArgs<SearchRecordsInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("search_records", args, |input| records::search_records(&self.client, input)).await
    }

    #[tool(name = "read_records", description = "Read records of any model by id")]
    pub async fn read_records(
        &self,
        Parameters(args): Parameters<ToolArgs<ReadRecordsInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("read_records", args, |input| records::read_records(&self.client, input)).await
    }

    #[tool(name = "create_record", description = "Create a record and return its id")]
    pub async fn create_record(
        &self,
        Parameters(args): Parameters<ToolArgs<CreateRecordInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("create_record", args, |input| records::create_record(&self.client, input)).await
    }

    #[tool(name = "update_record", description = "Write field values on an existing record")]
    pub async fn update_record(
        &self,
        Parameters(args): Parameters<ToolArgs<UpdateRecordInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("update_record", args, |input| records::update_record(&self.client, input)).await
    }

    #[tool(name = "delete_record", description = "Delete a record by id")]
    pub async fn delete_record(
        &self,
        Parameters(args): Parameters<ToolArgs<DeleteRecordInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("delete_record", args, |input| records::delete_record(&self.client, input)).await
    }

    #[tool(
        name = "get_model_fields",
        description = "Describe a model: its label and every field with type, label, required, readonly and relation"
    )]
    pub async fn get_model_fields(
        &self,
        Parameters(args): Parameters<ToolArgs<ModelInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("get_model_fields", args, |input| records::get_model_fields(&self.client, input)).await
    }

    #[tool(
        name = "execute_method",
        description = "Call any model method with positional and keyword arguments and return its raw result"
    )]
    pub async fn execute_method(
        &self,
        Parameters(args): Parameters<ToolArgs<ExecuteMethodInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("execute_method", args, |input| records::execute_method(&self.client, input)).await
    }

    #[tool(
        name = "search_employee",
        description = "Find employees whose name contains the given text"
    )]
    pub async fn search_employee(
        &self,
        Parameters(args): Parameters<ToolArgs<SearchEmployeeInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("search_employee", args, |input| hr::search_employee(&self.client, input)).await
    }

    #[tool(
        name = "search_holidays",
        description = "List time off overlapping a date range, optionally for one employee"
    )]
    pub async fn search_holidays(
        &self,
        Parameters(args): Parameters<ToolArgs<SearchHolidaysInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("search_holidays", args, |input| hr::search_holidays(&self.client, input)).await
    }

    #[tool(name = "search_partner", description = "List companies, optionally filtered by name")]
    pub async fn search_partner(
        &self,
        Parameters(args): Parameters<ToolArgs<SearchPartnerInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("search_partner", args, |input| partner::search_partner(&self.client, input)).await
    }

    #[tool(
        name = "search_partner_by_name",
        description = "Find companies whose name contains the given text"
    )]
    pub async fn search_partner_by_name(
        &self,
        Parameters(args): Parameters<ToolArgs<SearchPartnerByNameInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("search_partner_by_name", args, |input| {
            partner::search_partner_by_name(&self.client, input)
        })
        .await
    }

    #[tool(name = "create_customer", description = "Create a customer contact or company")]
    pub async fn create_customer(
        &self,
        Parameters(args): Parameters<ToolArgs<CreateCustomerInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("create_customer", args, |input| partner::create_customer(&self.client, input)).await
    }

    #[tool(
        name = "search_calendar",
        description = "List your own calendar events (organized or attended) between two dates"
    )]
    pub async fn search_calendar(
        &self,
        Parameters(args): Parameters<ToolArgs<SearchCalendarInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("search_calendar", args, |input| calendar::search_calendar(&self.client, input)).await
    }

    #[tool(
        name = "create_calendar",
        description = "Create a calendar event, optionally linked to an opportunity whose customer is invited"
    )]
    pub async fn create_calendar(
        &self,
        Parameters(args): Parameters<ToolArgs<CreateCalendarInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("create_calendar", args, |input| calendar::create_calendar(&self.client, input)).await
    }

    #[tool(name = "create_lead", description = "Create a CRM opportunity")]
    pub async fn create_lead(
        &self,
        Parameters(args): Parameters<ToolArgs<CreateLeadInput>>,
    ) -> Result<CallToolResult, McpError> {
        run("create_lead", args, |input| crm::create_lead(&self.client, input)).await
    }
}

#[tool_handler]
impl ServerHandler for OdooMcpServer {
    fn get_info(&self) -> ServerInfo {
        let session = self.client.session();
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().enable_resources().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "Odoo database `{}` as user `{}`. Every tool answers with \
                 {{\"success\": true, \"data\": ...}} or {{\"success\": false, \"error\": ...}}. \
                 Tools by area: {}. Resources: odoo://models, odoo://model/{{model}}, \
                 odoo://record/{{model}}/{{id}}, odoo://search/{{model}}/{{domain}}.",
                session.database,
                session.username,
                tools::summary()
            )),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult { resources: resources::static_resources(), next_cursor: None })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            resource_templates: resources::resource_templates(),
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = resources::read_resource(&self.client, &request.uri).await?;
        Ok(ReadResourceResult { contents: vec![ResourceContents::text(text, request.uri)] })
    }
}
