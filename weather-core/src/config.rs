use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::provider::openweather::DEFAULT_BASE_URL;

/// Upstream provider credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Settings for the HTTP backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// sqlx SQLite URL of the history database.
    pub database_url: String,
    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,
    /// Emit logs as newline-delimited JSON.
    pub log_json: bool,
    /// Record a history entry even when the city name is blank.
    pub record_empty_searches: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: "sqlite://weather-history.db".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            record_empty_searches: true,
        }
    }
}

/// Settings for the command-line client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
///
/// [server]
/// port = 8000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub server: ServerConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Load the config file (or defaults if absent), then apply `WEATHER_*` environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-lookup", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from `lookup`, which maps an environment variable name to its value.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("WEATHER_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup("WEATHER_PROVIDER_URL") {
            self.provider.base_url = url;
        }
        if let Some(host) = lookup("WEATHER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("WEATHER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("WEATHER_PORT='{port}' is not a valid port number"))?;
        }
        if let Some(url) = lookup("WEATHER_DATABASE_URL") {
            self.server.database_url = url;
        }
        if let Some(level) = lookup("WEATHER_LOG") {
            self.server.log_level = level;
        }
        if let Some(flag) = lookup("WEATHER_LOG_JSON") {
            self.server.log_json = parse_flag("WEATHER_LOG_JSON", &flag)?;
        }
        if let Some(flag) = lookup("WEATHER_RECORD_EMPTY_SEARCHES") {
            self.server.record_empty_searches = parse_flag("WEATHER_RECORD_EMPTY_SEARCHES", &flag)?;
        }
        if let Some(url) = lookup("WEATHER_BACKEND_URL") {
            self.client.backend_url = url;
        }
        Ok(())
    }

    /// Returns the provider API key, failing with a hint if none is configured.
    pub fn api_key(&self) -> Result<&str> {
        self.provider
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured for the weather provider.\n\
                     Hint: set WEATHER_API_KEY or run `weather configure` and enter your API key."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = Some(api_key);
    }

    pub fn is_provider_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    /// `host:port` the backend listens on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key}='{value}' is not a valid boolean")),
    }
}
