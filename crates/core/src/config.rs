use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "ODOO_CONFIG";
pub const ENV_URL: &str = "ODOO_URL";
pub const ENV_DB: &str = "ODOO_DB";
pub const ENV_USERNAME: &str = "ODOO_USERNAME";
pub const ENV_PASSWORD: &str = "ODOO_PASSWORD";
pub const ENV_TIMEOUT: &str = "ODOO_TIMEOUT";
pub const ENV_VERIFY_SSL: &str = "ODOO_VERIFY_SSL";
pub const ENV_PROXY: &str = "ODOO_PROXY";
pub const ENV_LOG_LEVEL: &str = "ODOO_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "ODOO_LOG_FORMAT";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub odoo: ConnectionConfig,
    pub logging: LoggingConfig,
}

/// Everything needed to open a session against one Odoo database.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: SecretString,
    pub timeout_secs: u64,
    pub verify_ssl: bool,
    pub proxy: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub verify_ssl: Option<bool>,
    pub proxy: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {message}")]
    ParseFile { path: PathBuf, message: String },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            odoo: ConnectionConfig {
                url: String::new(),
                database: String::new(),
                username: String::new(),
                password: String::new().into(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                verify_ssl: true,
                proxy: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Layers defaults, the config file, `ODOO_*` environment variables and
    /// explicit overrides, in that order, then validates the result.
    ///
    /// A path given explicitly (option or `ODOO_CONFIG`) must exist;
    /// `require_file` additionally demands one of the default locations.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let explicit =
            options.config_path.clone().or_else(|| read_env(ENV_CONFIG_PATH).map(PathBuf::from));
        if let Some(path) = explicit.as_ref().filter(|path| !path.exists()) {
            return Err(ConfigError::MissingConfigFile(path.clone()));
        }
        let maybe_path = resolve_config_path(explicit.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = explicit.unwrap_or_else(|| PathBuf::from("odoo_config.json"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.odoo.url = normalize_url(&config.odoo.url);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(url) = patch.url {
            self.odoo.url = url;
        }
        if let Some(db) = patch.db {
            self.odoo.database = db;
        }
        if let Some(username) = patch.username {
            self.odoo.username = username;
        }
        if let Some(password_value) = patch.password {
            self.odoo.password = secret_value(password_value);
        }
        if let Some(timeout) = patch.timeout {
            self.odoo.timeout_secs = timeout;
        }
        if let Some(verify_ssl) = patch.verify_ssl {
            self.odoo.verify_ssl = verify_ssl;
        }
        if let Some(proxy) = patch.proxy {
            self.odoo.proxy = Some(proxy);
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env(ENV_URL) {
            self.odoo.url = value;
        }
        if let Some(value) = read_env(ENV_DB) {
            self.odoo.database = value;
        }
        if let Some(value) = read_env(ENV_USERNAME) {
            self.odoo.username = value;
        }
        if let Some(value) = read_env(ENV_PASSWORD) {
            self.odoo.password = secret_value(value);
        }
        if let Some(value) = read_env(ENV_TIMEOUT) {
            self.odoo.timeout_secs = parse_u64(ENV_TIMEOUT, &value)?;
        }
        if let Some(value) = read_env(ENV_VERIFY_SSL) {
            self.odoo.verify_ssl = parse_flag(ENV_VERIFY_SSL, &value)?;
        }
        if let Some(value) = read_env(ENV_PROXY) {
            self.odoo.proxy = Some(value);
        }

        if let Some(value) = read_env(ENV_LOG_LEVEL) {
            self.logging.level = value;
        }
        if let Some(value) = read_env(ENV_LOG_FORMAT) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.url {
            self.odoo.url = url;
        }
        if let Some(database) = overrides.database {
            self.odoo.database = database;
        }
        if let Some(username) = overrides.username {
            self.odoo.username = username;
        }
        if let Some(password) = overrides.password {
            self.odoo.password = secret_value(password);
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.odoo.timeout_secs = timeout_secs;
        }
        if let Some(verify_ssl) = overrides.verify_ssl {
            self.odoo.verify_ssl = verify_ssl;
        }
        if let Some(proxy) = overrides.proxy {
            self.odoo.proxy = Some(proxy);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_connection(&self.odoo)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

impl ConnectionConfig {
    /// `host[:port]` part of the URL, for log lines.
    pub fn hostname(&self) -> &str {
        let without_scheme = self
            .url
            .strip_prefix("https://")
            .or_else(|| self.url.strip_prefix("http://"))
            .unwrap_or(&self.url);
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }

    pub fn is_https(&self) -> bool {
        self.url.starts_with("https://")
    }
}

/// Adds `http://` when no scheme is given and strips trailing slashes.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// First existing config file: the explicit path if one is given, otherwise
/// `./odoo_config.json`, `~/.config/odoo/config.json`, `~/.odoo_config.json`.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    default_config_paths().into_iter().find(|path| path.exists())
}

pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("odoo_config.json")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("odoo").join("config.json"));
        paths.push(home.join(".odoo_config.json"));
    }
    paths
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    let is_toml = path.extension().and_then(|ext| ext.to_str()) == Some("toml");
    if is_toml {
        toml::from_str::<ConfigPatch>(&interpolated).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            message: source.to_string(),
        })
    } else {
        serde_json::from_str::<ConfigPatch>(&interpolated).map_err(|source| {
            ConfigError::ParseFile { path: path.to_path_buf(), message: source.to_string() }
        })
    }
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_connection(odoo: &ConnectionConfig) -> Result<(), ConfigError> {
    if odoo.url.is_empty() {
        return Err(ConfigError::Validation(format!(
            "odoo.url is required. Set {ENV_URL} or `url` in odoo_config.json"
        )));
    }
    if odoo.hostname().is_empty() {
        return Err(ConfigError::Validation(format!(
            "odoo.url `{}` does not contain a host name",
            odoo.url
        )));
    }

    if odoo.database.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "odoo.db is required. Set {ENV_DB} or `db` in odoo_config.json"
        )));
    }

    if odoo.username.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "odoo.username is required. Set {ENV_USERNAME} or `username` in odoo_config.json"
        )));
    }

    if odoo.password.expose_secret().is_empty() {
        return Err(ConfigError::Validation(format!(
            "odoo.password is required. Set {ENV_PASSWORD} or `password` in odoo_config.json \
             (an API key works as well)"
        )));
    }

    if odoo.timeout_secs == 0 || odoo.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "odoo.timeout must be in range 1..=300 seconds".to_string(),
        ));
    }

    if let Some(proxy) = &odoo.proxy {
        if !proxy.starts_with("http://") && !proxy.starts_with("https://") {
            return Err(ConfigError::Validation(
                "odoo.proxy must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    url: Option<String>,
    db: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<u64>,
    verify_ssl: Option<bool>,
    proxy: Option<String>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
