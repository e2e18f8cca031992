//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Media storage settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Translation backend settings.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Speech-to-text settings.
    #[serde(default)]
    pub transcription: paivand_voice::DeepgramConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
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

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Media storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory that relative audio/media paths resolve against.
    #[serde(default = "default_media_root")]
    pub root: String,
}

/// Translation backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    /// Base URL of the local Ollama instance.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Ollama model name.
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// Whether to race the Google fallback alongside Ollama.
    #[serde(default = "default_google_fallback")]
    pub google_fallback: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "paivand_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "paivand.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    4
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

fn default_google_fallback() -> bool {
    true
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

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            google_fallback: default_google_fallback(),
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

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PAIVAND_HOST` overrides `server.host`
/// - `PAIVAND_PORT` overrides `server.port`
/// - `PAIVAND_DB_PATH` overrides `database.path`
/// - `PAIVAND_MEDIA_ROOT` overrides `media.root`
/// - `PAIVAND_OLLAMA_URL` overrides `translation.ollama_url`
/// - `PAIVAND_OLLAMA_MODEL` overrides `translation.ollama_model`
/// - `PAIVAND_GOOGLE_FALLBACK` overrides `translation.google_fallback`
/// - `PAIVAND_DEEPGRAM_API_KEY` overrides `transcription.api_key`
/// - `PAIVAND_LOG_LEVEL` overrides `logging.level`
/// - `PAIVAND_LOG_JSON` overrides `logging.json` (set to "true" to enable)
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

    // Environment variable overrides
    if let Ok(host) = std::env::var("PAIVAND_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("PAIVAND_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("PAIVAND_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(media_root) = std::env::var("PAIVAND_MEDIA_ROOT") {
        config.media.root = media_root;
    }
    if let Ok(url) = std::env::var("PAIVAND_OLLAMA_URL") {
        config.translation.ollama_url = url;
    }
    if let Ok(model) = std::env::var("PAIVAND_OLLAMA_MODEL") {
        config.translation.ollama_model = model;
    }
    if let Ok(fallback) = std::env::var("PAIVAND_GOOGLE_FALLBACK") {
        config.translation.google_fallback = fallback == "true" || fallback == "1";
    }
    if let Ok(key) = std::env::var("PAIVAND_DEEPGRAM_API_KEY") {
        config.transcription.api_key = key;
    }
    if let Ok(level) = std::env::var("PAIVAND_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("PAIVAND_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "paivand.db");
        assert!(config.translation.google_fallback);
        assert!(config.transcription.api_key.is_empty());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "[server]\nport = 8080\n\n[translation]\ngoogle_fallback = false\n"
        )
        .expect("write");

        let config =
            load_config(Some(file.path().to_str().expect("utf-8 path"))).expect("load failed");
        assert_eq!(config.server.port, 8080);
        assert!(!config.translation.google_fallback);
        assert_eq!(config.database.pool_max_size, 4);
        assert_eq!(config.translation.ollama_model, "llama3.1");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = load_config(Some("/does/not/exist.toml")).expect("load failed");
        assert_eq!(config.server.port, 3000);
    }
}
