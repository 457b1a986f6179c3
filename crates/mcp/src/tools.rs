//! Tool catalog, grouped by the Odoo area each tool works on:
//! - Records: generic CRUD, model introspection and method calls
//! - HR: employees and time off
//! - Partners: company lookup and customer creation
//! - Calendar: the session user's meetings
//! - CRM: opportunities

/// A named group of tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolCategory {
    pub name: &'static str,
    pub tools: &'static [&'static str],
}

pub const RECORD_TOOLS: ToolCategory = ToolCategory {
    name: "records",
    tools: &[
        "search_records",
        "read_records",
        "create_record",
        "update_record",
        "delete_record",
        "get_model_fields",
        "execute_method",
    ],
};

pub const HR_TOOLS: ToolCategory =
    ToolCategory { name: "hr", tools: &["search_employee", "search_holidays"] };

pub const PARTNER_TOOLS: ToolCategory = ToolCategory {
    name: "partners",
    tools: &["search_partner", "search_partner_by_name", "create_customer"],
};

pub const CALENDAR_TOOLS: ToolCategory =
    ToolCategory { name: "calendar", tools: &["search_calendar", "create_calendar"] };

pub const CRM_TOOLS: ToolCategory = ToolCategory { name: "crm", tools: &["create_lead"] };

pub const CATEGORIES: &[ToolCategory] =
    &[RECORD_TOOLS, HR_TOOLS, PARTNER_TOOLS, CALENDAR_TOOLS, CRM_TOOLS];

/// All tool names
pub const ALL_TOOL_NAMES: &[&str] = &[
    "search_records",
    "read_records",
    "create_record",
    "update_record",
    "delete_record",
    "get_model_fields",
    "execute_method",
    "search_employee",
    "search_holidays",
    "search_partner",
    "search_partner_by_name",
    "create_customer",
    "search_calendar",
    "create_calendar",
    "create_lead",
];

pub const TOTAL_TOOLS: usize = ALL_TOOL_NAMES.len();

/// Category a tool belongs to, if it is one of ours.
pub fn category_of(tool: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|category| category.tools.contains(&tool))
        .map(|category| category.name)
}

/// One-line summary of the catalog, used in the server instructions.
pub fn summary() -> String {
    CATEGORIES
        .iter()
        .map(|category| format!("{}: {}", category.name, category.tools.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
