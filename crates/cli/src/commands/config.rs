use std::env;
use std::fs;
use std::path::Path;

use odoo_mcp_core::config::{
    resolve_config_path, AppConfig, LoadOptions, ENV_DB, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_PASSWORD, ENV_PROXY, ENV_TIMEOUT, ENV_URL, ENV_USERNAME, ENV_VERIFY_SSL,
};
use secrecy::ExposeSecret;
use serde_json::Value;

use super::{explicit_config_path, CommandResult};

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(explicit_config_path(&options).as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    CommandResult { exit_code: 0, output: render(&config, config_file_path.as_deref()) }
}

pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path)
    };
    let odoo = &config.odoo;

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.push(render_line("url", &odoo.url, source("url", ENV_URL)));
    lines.push(render_line("db", &odoo.database, source("db", ENV_DB)));
    lines.push(render_line("username", &odoo.username, source("username", ENV_USERNAME)));
    lines.push(render_line(
        "password",
        redact(odoo.password.expose_secret()),
        source("password", ENV_PASSWORD),
    ));
    lines.push(render_line(
        "timeout",
        &odoo.timeout_secs.to_string(),
        source("timeout", ENV_TIMEOUT),
    ));
    lines.push(render_line(
        "verify_ssl",
        &odoo.verify_ssl.to_string(),
        source("verify_ssl", ENV_VERIFY_SSL),
    ));
    lines.push(render_line(
        "proxy",
        odoo.proxy.as_deref().unwrap_or("<unset>"),
        source("proxy", ENV_PROXY),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", ENV_LOG_LEVEL),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        source("logging.format", ENV_LOG_FORMAT),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
        let doc = raw.parse::<toml::Value>().ok()?;
        serde_json::to_value(doc).ok()
    } else {
        serde_json::from_str(&raw).ok()
    }
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var(env_key).is_ok_and(|value| !value.trim().is_empty()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    !current.is_null()
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
