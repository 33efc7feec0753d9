//! Server configuration loading from file and environment variables.

use jarvis_voice::VoiceConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Entity cache and fuzzy matching settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Wyoming speech services.
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Free-form deployment label, e.g. "development" or "production".
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Deserialize)]
pub struct HomeAssistantConfig {
    #[serde(default = "default_ha_url")]
    pub url: String,

    /// Long-lived access token. Required.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_ha_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Seconds between background refreshes; values below 30 are raised to 30.
    #[serde(default = "default_refresh_seconds")]
    pub refresh_seconds: u64,

    #[serde(default = "default_cache_max_entities")]
    pub cache_max_entities: usize,

    /// Minimum fuzzy score (0-100) for a search hit.
    #[serde(default = "default_min_score")]
    pub min_score: u8,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "jarvis_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_app_name() -> String {
    "Jarvis Backend".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

fn default_ha_url() -> String {
    "http://127.0.0.1:8123".to_string()
}

fn default_ha_timeout_seconds() -> u64 {
    10
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

fn default_llm_timeout_seconds() -> u64 {
    60
}

fn default_refresh_seconds() -> u64 {
    300
}

fn default_cache_max_entities() -> usize {
    200
}

fn default_min_score() -> u8 {
    65
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_environment(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            url: default_ha_url(),
            token: String::new(),
            timeout_seconds: default_ha_timeout_seconds(),
        }
    }
}

impl fmt::Debug for HomeAssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl HomeAssistantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_ollama_model(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            refresh_seconds: default_refresh_seconds(),
            cache_max_entities: default_cache_max_entities(),
            min_score: default_min_score(),
        }
    }
}

impl DiscoveryConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_seconds.max(30))
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

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid {field} URL {value:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("HA_TOKEN is required for Home Assistant authentication")]
    MissingToken,
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `APP_NAME`, `ENVIRONMENT`
/// - `JARVIS_HOST`, `JARVIS_PORT`
/// - `HA_URL`, `HA_TOKEN`, `HA_TIMEOUT_SECONDS`
/// - `OLLAMA_URL`, `OLLAMA_MODEL`, `LLM_TIMEOUT_SECONDS`
/// - `DISCOVERY_REFRESH_SECONDS`, `CACHE_MAX_ENTITIES`
/// - `JARVIS_LOG_LEVEL`, `JARVIS_LOG_JSON` (set to "true" to enable)
/// - `VOICE_ENABLED`, `WYOMING_STT_ADDR`, `WYOMING_TTS_ADDR`,
///   `WYOMING_WAKE_ADDR`, `VOICE_LANGUAGE`, `VOICE_NAME`, `VOICE_TIMEOUT_SECONDS`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, an
/// override does not parse, a URL is not http(s), or the token is empty.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// [`load_config`] with an explicit variable lookup, so tests need not touch
/// the process environment.
pub fn load_config_with<F>(path: Option<&str>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
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

    apply_env_overrides(&mut config, &lookup)?;
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides<F>(config: &mut Config, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(name) = text("APP_NAME") {
        config.app.name = name;
    }
    if let Some(environment) = text("ENVIRONMENT") {
        config.app.environment = environment;
    }
    if let Some(host) = parsed(lookup, "JARVIS_HOST")? {
        config.server.host = host;
    }
    if let Some(port) = parsed(lookup, "JARVIS_PORT")? {
        config.server.port = port;
    }
    if let Some(url) = text("HA_URL") {
        config.home_assistant.url = url;
    }
    if let Some(token) = text("HA_TOKEN") {
        config.home_assistant.token = token;
    }
    if let Some(seconds) = parsed(lookup, "HA_TIMEOUT_SECONDS")? {
        config.home_assistant.timeout_seconds = seconds;
    }
    if let Some(url) = text("OLLAMA_URL") {
        config.ollama.url = url;
    }
    if let Some(model) = text("OLLAMA_MODEL") {
        config.ollama.model = model;
    }
    if let Some(seconds) = parsed(lookup, "LLM_TIMEOUT_SECONDS")? {
        config.ollama.timeout_seconds = seconds;
    }
    if let Some(seconds) = parsed(lookup, "DISCOVERY_REFRESH_SECONDS")? {
        config.discovery.refresh_seconds = seconds;
    }
    if let Some(max) = parsed(lookup, "CACHE_MAX_ENTITIES")? {
        config.discovery.cache_max_entities = max;
    }
    if let Some(level) = text("JARVIS_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("JARVIS_LOG_JSON") {
        config.logging.json = is_truthy(&json);
    }
    if let Some(enabled) = lookup("VOICE_ENABLED") {
        config.voice.enabled = is_truthy(&enabled);
    }
    if let Some(addr) = text("WYOMING_STT_ADDR") {
        config.voice.stt_addr = addr;
    }
    if let Some(addr) = text("WYOMING_TTS_ADDR") {
        config.voice.tts_addr = addr;
    }
    if let Some(addr) = text("WYOMING_WAKE_ADDR") {
        config.voice.wake_addr = addr;
    }
    if let Some(language) = text("VOICE_LANGUAGE") {
        config.voice.language = Some(language);
    }
    if let Some(voice) = text("VOICE_NAME") {
        config.voice.voice = Some(voice);
    }
    if let Some(seconds) = parsed(lookup, "VOICE_TIMEOUT_SECONDS")? {
        config.voice.timeout_seconds = seconds;
    }
    Ok(())
}

fn parsed<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
        _ => Ok(None),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Checks the invariants the server relies on at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("HA_URL", &self.home_assistant.url)?;
        validate_http_url("OLLAMA_URL", &self.ollama.url)?;
        if self.home_assistant.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }
}

fn validate_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };
    let parsed = url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        "http" | "https" => Err(invalid("missing host".to_string())),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_with_token_from_env() {
        let config = load_config_with(None, env(&[("HA_TOKEN", "abc")])).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.home_assistant.url, "http://127.0.0.1:8123");
        assert_eq!(config.ollama.model, "llama3.1");
        assert_eq!(config.discovery.cache_max_entities, 200);
        assert_eq!(config.voice.stt_addr, "127.0.0.1:10300");
        assert!(!config.voice.enabled);
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = load_config_with(None, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
        assert_eq!(
            err.to_string(),
            "HA_TOKEN is required for Home Assistant authentication"
        );
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[home_assistant]
url = "http://homeassistant.local:8123"
token = "from-file"

[voice]
enabled = true
language = "de"
"#
        )
        .unwrap();

        let config = load_config_with(
            file.path().to_str(),
            env(&[
                ("JARVIS_PORT", "8100"),
                ("OLLAMA_MODEL", "qwen2.5"),
                ("DISCOVERY_REFRESH_SECONDS", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 8100);
        assert_eq!(config.home_assistant.token, "from-file");
        assert_eq!(config.ollama.model, "qwen2.5");
        assert!(config.voice.enabled);
        assert_eq!(config.voice.language.as_deref(), Some("de"));
        assert_eq!(config.discovery.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = load_config_with(None, env(&[("HA_TOKEN", "x"), ("JARVIS_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "JARVIS_PORT", .. }));

        let err = load_config_with(None, env(&[("HA_TOKEN", "x"), ("HA_URL", "ftp://ha")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { field: "HA_URL", .. }));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config =
            load_config_with(path.to_str(), env(&[("HA_TOKEN", "abc")])).unwrap();
        assert_eq!(config.app.name, "Jarvis Backend");
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let config = load_config_with(None, env(&[("HA_TOKEN", "super-secret")])).unwrap();
        let rendered = format!("{:?}", config.home_assistant);
        assert!(!rendered.contains("super-secret"));
    }
}
