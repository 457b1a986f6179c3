use std::sync::Arc;

use odoo_mcp_core::config::{AppConfig, LoadOptions};
use odoo_mcp_rpc::{json_rpc_transport, OdooClient, RpcTransport};
use serde::Serialize;
use serde_json::json;

use super::version::describe_server;
use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub overall_status: CheckStatus,
    pub summary: String,
    pub checks: Vec<DoctorCheck>,
}

const CONFIG_CHECK: &str = "config_validation";
const REACHABILITY_CHECK: &str = "endpoint_reachability";
const AUTH_CHECK: &str = "authentication";

pub fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };
    CommandResult { exit_code, output: render(&report, json_output) }
}

pub fn render(report: &DoctorReport, json_output: bool) -> String {
    if json_output {
        return serde_json::to_string_pretty(report).unwrap_or_else(|error| {
            json!({
                "overall_status": "fail",
                "summary": "doctor serialization failed",
                "error": error.to_string(),
            })
            .to_string()
        });
    }

    render_human(report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return summarize(vec![
                DoctorCheck {
                    name: CONFIG_CHECK,
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
                skipped(REACHABILITY_CHECK, "configuration did not load"),
                skipped(AUTH_CHECK, "configuration did not load"),
            ]);
        }
    };

    let transport: Arc<dyn RpcTransport> = match json_rpc_transport(&config.odoo) {
        Ok(transport) => Arc::new(transport),
        Err(error) => {
            return summarize(vec![
                config_passed(),
                DoctorCheck {
                    name: REACHABILITY_CHECK,
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
                skipped(AUTH_CHECK, "no HTTP client"),
            ]);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return summarize(vec![
                config_passed(),
                DoctorCheck {
                    name: REACHABILITY_CHECK,
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                skipped(AUTH_CHECK, "no async runtime"),
            ]);
        }
    };

    runtime.block_on(diagnose(&config, transport))
}

/// Reachability and authentication checks against an already-validated
/// configuration.
pub async fn diagnose(config: &AppConfig, transport: Arc<dyn RpcTransport>) -> DoctorReport {
    let mut checks = vec![config_passed()];

    match describe_server(transport.as_ref()).await {
        Ok(description) => checks.push(DoctorCheck {
            name: REACHABILITY_CHECK,
            status: CheckStatus::Pass,
            details: format!("{description} answered at {}", config.odoo.url),
        }),
        Err(error) => {
            checks.push(DoctorCheck {
                name: REACHABILITY_CHECK,
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped(AUTH_CHECK, "endpoint is not reachable"));
            return summarize(checks);
        }
    }

    checks.push(match OdooClient::authenticate(transport, &config.odoo).await {
        Ok(client) => DoctorCheck {
            name: AUTH_CHECK,
            status: CheckStatus::Pass,
            details: format!(
                "`{}` authenticated as uid {} on database `{}`",
                config.odoo.username,
                client.uid(),
                config.odoo.database
            ),
        },
        Err(error) => {
            DoctorCheck { name: AUTH_CHECK, status: CheckStatus::Fail, details: error.to_string() }
        }
    });

    summarize(checks)
}

fn config_passed() -> DoctorCheck {
    DoctorCheck {
        name: CONFIG_CHECK,
        status: CheckStatus::Pass,
        details: "configuration loaded and validated".to_string(),
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
}

fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
