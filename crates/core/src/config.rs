//! Application configuration.
//!
//! Settings are resolved in four layers, later layers winning: built-in
//! defaults, an optional TOML file (`concierge.toml` or the path named by
//! `CONCIERGE_CONFIG_PATH`), `CONCIERGE_*` environment variables, and
//! programmatic overrides. The merged result is validated before use.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "concierge.toml";
pub const CONFIG_PATH_ENV: &str = "CONCIERGE_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
        }
    }

    pub fn parse(value: &str) -> Option<LlmProvider> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(LlmProvider::OpenAi),
            "ollama" => Some(LlmProvider::Ollama),
            _ => None,
        }
    }

    /// Hosted APIs need a key; a local Ollama does not.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, LlmProvider::OpenAi)
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Ollama => "http://127.0.0.1:11434/v1",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }

    pub fn parse(value: &str) -> Option<LogFormat> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: "sqlite://concierge.db".to_string(),
            max_connections: 5,
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn resolved_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            enabled: false,
            provider: LlmProvider::OpenAi,
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Programmatic overrides, applied last. Used by the CLI and by tests.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub llm_enabled: Option<bool>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct AppConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    enabled: Option<bool>,
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<String>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        let (path, explicit) = resolve_config_path(&options);
        if path.exists() {
            config.apply_patch(read_patch(&path)?)?;
        } else if explicit {
            return Err(ConfigError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            });
        }

        config.apply_env()?;
        config.apply_overrides(&options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: AppConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }
        if let Some(llm) = patch.llm {
            if let Some(enabled) = llm.enabled {
                self.llm.enabled = enabled;
            }
            if let Some(provider) = llm.provider {
                self.llm.provider = LlmProvider::parse(&provider).ok_or_else(|| {
                    invalid(
                        "llm.provider",
                        format!("unknown provider {provider:?}, expected openai or ollama"),
                    )
                })?;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(SecretString::from(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = LogFormat::parse(&format).ok_or_else(|| {
                    invalid(
                        "logging.format",
                        format!("unknown format {format:?}, expected compact, pretty or json"),
                    )
                })?;
            }
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = env_string("CONCIERGE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(value) =
            env_parse::<u32>("CONCIERGE_DATABASE_MAX_CONNECTIONS", "database.max_connections")?
        {
            self.database.max_connections = value;
        }
        if let Some(value) =
            env_parse::<u64>("CONCIERGE_DATABASE_TIMEOUT_SECS", "database.timeout_secs")?
        {
            self.database.timeout_secs = value;
        }
        if let Some(value) = env_string("CONCIERGE_LLM_ENABLED") {
            self.llm.enabled = parse_bool(&value, "llm.enabled")?;
        }
        if let Some(value) = env_string("CONCIERGE_LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&value).ok_or_else(|| {
                invalid(
                    "llm.provider",
                    format!("unknown provider {value:?}, expected openai or ollama"),
                )
            })?;
        }
        if let Some(value) = env_string("CONCIERGE_LLM_API_KEY") {
            self.llm.api_key = Some(SecretString::from(value));
        }
        if let Some(value) = env_string("CONCIERGE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = env_string("CONCIERGE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = env_parse::<u64>("CONCIERGE_LLM_TIMEOUT_SECS", "llm.timeout_secs")? {
            self.llm.timeout_secs = value;
        }
        if let Some(value) = env_string("CONCIERGE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = env_parse::<u16>("CONCIERGE_SERVER_PORT", "server.port")? {
            self.server.port = value;
        }
        if let Some(value) = env_string("CONCIERGE_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = env_string("CONCIERGE_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&value).ok_or_else(|| {
                invalid(
                    "logging.format",
                    format!("unknown format {value:?}, expected compact, pretty or json"),
                )
            })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.database_url {
            self.database.url = url.clone();
        }
        if let Some(enabled) = overrides.llm_enabled {
            self.llm.enabled = enabled;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(options: &LoadOptions) -> (PathBuf, bool) {
    if let Some(path) = &options.config_path {
        return (path.clone(), true);
    }
    if let Some(path) = env_string(CONFIG_PATH_ENV) {
        return (PathBuf::from(path), true);
    }
    (PathBuf::from(DEFAULT_CONFIG_PATH), false)
}

fn read_patch(path: &Path) -> Result<AppConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(
    key: &str,
    field: &'static str,
) -> Result<Option<T>, ConfigError> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(field, format!("could not parse {raw:?}"))),
    }
}

fn parse_bool(raw: &str, field: &'static str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, format!("could not parse {raw:?} as a boolean"))),
    }
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    if database.url.trim().is_empty() {
        return Err(invalid("database.url", "must not be empty"));
    }
    if !(1..=64).contains(&database.max_connections) {
        return Err(invalid("database.max_connections", "must be between 1 and 64"));
    }
    if !(1..=300).contains(&database.timeout_secs) {
        return Err(invalid("database.timeout_secs", "must be between 1 and 300 seconds"));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if !llm.enabled {
        return Ok(());
    }
    if llm.model.trim().is_empty() {
        return Err(invalid("llm.model", "must not be empty when the llm is enabled"));
    }
    if !(1..=120).contains(&llm.timeout_secs) {
        return Err(invalid("llm.timeout_secs", "must be between 1 and 120 seconds"));
    }
    if llm.provider.requires_api_key() && llm.api_key.is_none() {
        return Err(invalid(
            "llm.api_key",
            format!("provider {} requires an api key", llm.provider.as_str()),
        ));
    }
    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(invalid("llm.base_url", "must start with http:// or https://"));
        }
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(invalid("server.bind_address", "must not be empty"));
    }
    if server.port == 0 {
        return Err(invalid("server.port", "must not be zero"));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    if logging.level.trim().is_empty() {
        return Err(invalid("logging.level", "must not be empty"));
    }
    Ok(())
}
