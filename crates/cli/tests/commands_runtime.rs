use std::env;
use std::fs;
use std::sync::{Arc, Mutex, OnceLock};

use odoo_mcp_cli::commands::doctor::{self, CheckStatus};
use odoo_mcp_cli::commands::{config, load_options, version};
use odoo_mcp_core::config::{AppConfig, LoadOptions};
use odoo_mcp_rpc::{InMemoryOdoo, RpcTransport};
use serde_json::Value;
use tempfile::TempDir;

const VALID_ENV: &[(&str, &str)] = &[
    ("ODOO_URL", "https://erp.example.com"),
    ("ODOO_DB", "prod"),
    ("ODOO_USERNAME", "bot@example.com"),
    ("ODOO_PASSWORD", "api-key-value"),
];

#[test]
fn config_reports_env_sources_and_redacts_the_password() {
    with_env(VALID_ENV, || {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected config to render");

        assert!(result.output.contains("- url = https://erp.example.com (source: env (ODOO_URL))"));
        assert!(result.output.contains("- password = <redacted> (source: env (ODOO_PASSWORD))"));
        assert!(result.output.contains("- timeout = 30 (source: default)"));
        assert!(!result.output.contains("api-key-value"));
    });
}

#[test]
fn config_attributes_file_values_and_lets_env_win() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("odoo_config.json");
    fs::write(
        &path,
        r#"{
            "url": "http://file.example.com",
            "db": "from-file",
            "username": "admin",
            "password": "file-secret",
            "logging": {"level": "debug"}
        }"#,
    )
    .expect("write config");

    with_env(&[("ODOO_URL", "https://env.example.com")], || {
        let result = config::run(load_options(Some(path.clone())));
        assert_eq!(result.exit_code, 0, "expected config to render");

        let file_source = format!("(source: file ({}))", path.display());
        assert!(result.output.contains("- url = https://env.example.com (source: env (ODOO_URL))"));
        assert!(result.output.contains(&format!("- db = from-file {file_source}")));
        assert!(result.output.contains(&format!("- logging.level = debug {file_source}")));
        assert!(result.output.contains("- logging.format = compact (source: default)"));
        assert!(!result.output.contains("file-secret"));
    });
}

#[test]
fn config_failure_is_a_structured_payload() {
    with_env(&[], || {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().unwrap_or_default().contains("ODOO_URL"));
    });
}

#[test]
fn explicit_missing_config_file_fails() {
    with_env(VALID_ENV, || {
        let result = version::run(load_options(Some("/nonexistent/odoo.json".into())));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "version");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn missing_file_named_by_odoo_config_fails() {
    let mut env = VALID_ENV.to_vec();
    env.push(("ODOO_CONFIG", "/nonexistent/odoo.json"));
    with_env(&env, || {
        let result = config::run(load_options(None));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"]
            .as_str()
            .unwrap_or_default()
            .contains("/nonexistent/odoo.json"));
    });
}

#[test]
fn doctor_skips_remote_checks_without_config() {
    with_env(&[], || {
        let result = doctor::run(LoadOptions::default(), true);
        assert_eq!(result.exit_code, 1, "expected doctor failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        let statuses: Vec<&str> = payload["checks"]
            .as_array()
            .expect("checks")
            .iter()
            .filter_map(|check| check["status"].as_str())
            .collect();
        assert_eq!(statuses, vec!["fail", "skipped", "skipped"]);
    });
}

#[test]
fn doctor_human_output_marks_each_check() {
    with_env(&[], || {
        let result = doctor::run(LoadOptions::default(), false);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] authentication:"));
    });
}

#[tokio::test]
async fn diagnose_passes_against_a_reachable_server_with_valid_credentials() {
    let transport = in_memory_odoo();
    let report = doctor::diagnose(&app_config("admin"), transport).await;

    assert_eq!(report.overall_status, CheckStatus::Pass);
    assert_eq!(report.checks.len(), 3);
    assert!(report.checks[1].details.contains("Odoo 17.0"));
    assert!(report.checks[2].details.contains("uid"));
}

#[tokio::test]
async fn diagnose_reports_rejected_credentials() {
    let transport = in_memory_odoo();
    let report = doctor::diagnose(&app_config("wrong"), transport).await;

    assert_eq!(report.overall_status, CheckStatus::Fail);
    assert_eq!(report.checks[1].status, CheckStatus::Pass);
    assert_eq!(report.checks[2].status, CheckStatus::Fail);
    assert!(report.checks[2].details.contains("invalid credentials"));

    let json: Value = serde_json::from_str(&doctor::render(&report, true)).expect("json report");
    assert_eq!(json["checks"][2]["name"], "authentication");
}

#[tokio::test]
async fn version_describes_the_server() {
    let transport = in_memory_odoo();
    let description = version::describe_server(transport.as_ref()).await.expect("version");
    assert_eq!(description, "Odoo 17.0");
}

fn in_memory_odoo() -> Arc<dyn RpcTransport> {
    let mut odoo = InMemoryOdoo::with_standard_models("prod");
    odoo.add_user("bot@example.com", "admin", "Integration Bot");
    Arc::new(odoo)
}

fn app_config(password: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.odoo.url = "http://odoo.test".to_string();
    config.odoo.database = "prod".to_string();
    config.odoo.username = "bot@example.com".to_string();
    config.odoo.password = password.to_string().into();
    config
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ODOO_CONFIG",
        "ODOO_URL",
        "ODOO_DB",
        "ODOO_USERNAME",
        "ODOO_PASSWORD",
        "ODOO_TIMEOUT",
        "ODOO_VERIFY_SSL",
        "ODOO_PROXY",
        "ODOO_LOG_LEVEL",
        "ODOO_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
