//! Server configuration loading from file and environment variables.

use callcenter_agent::{AgentSettings, ModelSettings};
use callcenter_voice::VoiceSettings;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level configuration, one field per `config.toml` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Chat completions endpoint and sampling settings.
    #[serde(default)]
    pub model: ModelSettings,

    /// Agent loop limits.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Voice rendering and turn-taking.
    #[serde(default)]
    pub voice: VoiceSettings,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "callcenter_agent=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Knowledge base seeding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeConfig {
    /// JSON file of documents to index on first start. When unset, the
    /// built-in FAQ entries are used.
    #[serde(default)]
    pub seed_path: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    "callcenter.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides (see [`apply_overrides`]).
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides looked up by variable name:
///
/// - `CALLCENTER_HOST`, `CALLCENTER_PORT` override `server.*`
/// - `CALLCENTER_DB_PATH` overrides `database.path`
/// - `CALLCENTER_LOG_LEVEL`, `CALLCENTER_LOG_JSON` override `logging.*`
/// - `CALLCENTER_MODEL_ENDPOINT`, `CALLCENTER_MODEL` override `model.endpoint`
///   and `model.model`
/// - `CALLCENTER_MODEL_API_KEY` (or `GROQ_API_KEY`) sets `model.api_key`
/// - `CALLCENTER_KNOWLEDGE_SEED_PATH` sets `knowledge.seed_path`
///
/// Values that fail to parse are ignored.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(parsed) = lookup("CALLCENTER_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = lookup("CALLCENTER_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(path) = lookup("CALLCENTER_DB_PATH") {
        config.database.path = path;
    }
    if let Some(level) = lookup("CALLCENTER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("CALLCENTER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(endpoint) = lookup("CALLCENTER_MODEL_ENDPOINT") {
        config.model.endpoint = endpoint;
    }
    if let Some(model) = lookup("CALLCENTER_MODEL") {
        config.model.model = model;
    }
    if let Some(key) = lookup("CALLCENTER_MODEL_API_KEY").or_else(|| lookup("GROQ_API_KEY")) {
        config.model.api_key = Some(key);
    }
    if let Some(path) = lookup("CALLCENTER_KNOWLEDGE_SEED_PATH") {
        config.knowledge.seed_path = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.agent.max_rounds, 8);
        assert_eq!(config.agent.history_limit, 10);
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.voice.voice, "Polly.Joanna");
        assert!(config.knowledge.seed_path.is_none());
    }

    #[test]
    fn sections_parse_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
port = 8080

[model]
endpoint = "http://localhost:11434/v1/chat/completions"
model = "llama3"
reasoning_effort = "low"

[agent]
max_rounds = 3

[voice]
input_timeout_secs = 5
min_confidence = 0.3
"#
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.model.model, "llama3");
        assert_eq!(config.model.max_completion_tokens, 8192);
        assert_eq!(config.agent.max_rounds, 3);
        assert_eq!(config.agent.tool_timeout_secs, 10);
        assert_eq!(config.voice.input_timeout_secs, 5);
        assert_eq!(config.voice.language, "en-US");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server\nport = ").unwrap();
        assert!(matches!(
            load_config(file.path().to_str()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("CALLCENTER_PORT", "9000"),
            ("CALLCENTER_HOST", "not-an-ip"),
            ("CALLCENTER_LOG_JSON", "1"),
            ("CALLCENTER_MODEL", "openai/gpt-oss-20b"),
            ("GROQ_API_KEY", "gsk_fallback"),
            ("CALLCENTER_KNOWLEDGE_SEED_PATH", "faqs.json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, default_host());
        assert!(config.logging.json);
        assert_eq!(config.model.model, "openai/gpt-oss-20b");
        assert_eq!(config.model.api_key.as_deref(), Some("gsk_fallback"));
        assert_eq!(config.knowledge.seed_path.as_deref(), Some("faqs.json"));
    }

    #[test]
    fn explicit_api_key_wins_over_groq_key() {
        let mut config = Config::default();
        apply_overrides(&mut config, |key| match key {
            "CALLCENTER_MODEL_API_KEY" => Some("primary".to_string()),
            "GROQ_API_KEY" => Some("fallback".to_string()),
            _ => None,
        });
        assert_eq!(config.model.api_key.as_deref(), Some("primary"));
        assert!(!format!("{config:?}").contains("primary"));
    }
}
