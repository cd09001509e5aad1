//! duoplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main duoplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Primary ("codex") planner provider
    pub primary: ProviderConfig,

    /// Secondary ("claude") planner transports
    pub secondary: SecondaryConfig,

    /// Event log storage
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .duoplan.yml
        let local_config = PathBuf::from(".duoplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/duoplan/duoplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("duoplan").join("duoplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration (shared by the primary planner and the secondary API stage)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::openai()
    }
}

impl ProviderConfig {
    /// Defaults for the OpenAI-style primary provider
    pub fn openai() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }

    /// Defaults for the Anthropic-style secondary API stage
    pub fn anthropic() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }

    /// The API key, if its environment variable is set and non-empty
    pub fn api_key(&self) -> Option<String> {
        env_value(&self.api_key_env)
    }
}

/// Secondary planner configuration: one entry per fallback stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    /// Direct API stage; omitted keys keep the Anthropic defaults
    #[serde(deserialize_with = "anthropic_overlay")]
    pub api: ProviderConfig,

    /// HTTP service URL (takes precedence over `service-url-env`)
    #[serde(rename = "service-url")]
    pub service_url: Option<String>,

    /// Environment variable holding the HTTP service URL
    #[serde(rename = "service-url-env")]
    pub service_url_env: String,

    /// CLI command (takes precedence over `cli-command-env`)
    #[serde(rename = "cli-command")]
    pub cli_command: Option<String>,

    /// Environment variable holding the CLI command
    #[serde(rename = "cli-command-env")]
    pub cli_command_env: String,

    /// Timeout for the HTTP and CLI stages in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            api: ProviderConfig::anthropic(),
            service_url: None,
            service_url_env: "CLAUDE_SERVICE_URL".to_string(),
            cli_command: None,
            cli_command_env: "CLAUDE_CLI".to_string(),
            timeout_ms: 120_000,
        }
    }
}

impl SecondaryConfig {
    /// Resolved HTTP service URL, if configured
    pub fn service_url(&self) -> Option<String> {
        non_empty(self.service_url.clone()).or_else(|| env_value(&self.service_url_env))
    }

    /// Resolved CLI command, if configured
    pub fn cli_command(&self) -> Option<String> {
        non_empty(self.cli_command.clone()).or_else(|| env_value(&self.cli_command_env))
    }
}

/// Provider config with every key optional, applied over a base
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderOverlay {
    model: Option<String>,
    #[serde(rename = "api-key-env")]
    api_key_env: Option<String>,
    #[serde(rename = "base-url")]
    base_url: Option<String>,
    #[serde(rename = "max-tokens")]
    max_tokens: Option<u32>,
    #[serde(rename = "timeout-ms")]
    timeout_ms: Option<u64>,
}

impl ProviderOverlay {
    fn apply(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            model: self.model.unwrap_or(base.model),
            api_key_env: self.api_key_env.unwrap_or(base.api_key_env),
            base_url: self.base_url.unwrap_or(base.base_url),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            timeout_ms: self.timeout_ms.unwrap_or(base.timeout_ms),
        }
    }
}

fn anthropic_overlay<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProviderConfig, D::Error> {
    Ok(ProviderOverlay::deserialize(deserializer)?.apply(ProviderConfig::anthropic()))
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite event log path
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/duoplan on Linux)
        let db_path = dirs::data_local_dir()
            .map(|d| d.join("duoplan"))
            .unwrap_or_else(|| PathBuf::from(".duoplan"))
            .join("events.db");

        Self { db_path }
    }
}

fn env_value(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    non_empty(std::env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
