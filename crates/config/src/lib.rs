//! Configuration loading, validation, and management for homeclaw.
//!
//! Loads configuration from `~/.homeclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use homeclaw_core::persona::{OutputLanguage, Personality};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default endpoint: z.ai's Anthropic-compatible Messages API.
pub const DEFAULT_BASE_URL: &str = "https://api.z.ai/api/anthropic";
pub const DEFAULT_CHAT_MODEL: &str = "glm-4.7";
pub const DEFAULT_MAX_TOKENS: u32 = 3000;
/// Kept low for consistent device control.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS_LIMIT: u32 = 8000;

/// Models known to be served by the default endpoint.
pub const MODELS: &[&str] = &[
    "glm-4.7",
    "glm-4-flash",
    "glm-4-plus",
    "glm-4-air",
    "glm-4-airx",
    "glm-4-long",
];

/// The root configuration structure.
///
/// Maps directly to `~/.homeclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the Messages API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP timeout for one model invocation
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Conversation agent options
    #[serde(default)]
    pub agent: AgentOptions,

    /// Memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Home inventory
    #[serde(default)]
    pub home: HomeConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_request_timeout() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("home", &self.home)
            .finish()
    }
}

/// Per-agent options. Every field has a default so that entries written
/// before a field existed still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOptions {
    /// Use the recommended model settings and ignore the overrides below
    #[serde(default = "default_true")]
    pub recommended: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Extra instructions appended to the assembled prompt
    #[serde(default)]
    pub prompt: String,

    #[serde(default)]
    pub personality: Personality,

    #[serde(default = "default_true")]
    pub memory_enabled: bool,

    /// Area ids to describe; empty means all areas
    #[serde(default)]
    pub area_filter: Vec<String>,

    /// Use the assembled prompt instead of only the host default
    #[serde(default = "default_true")]
    pub use_custom_prompt: bool,

    #[serde(default)]
    pub output_language: OutputLanguage,

    /// Advertise device tools to the model
    #[serde(default = "default_true")]
    pub tools_enabled: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            recommended: true,
            chat_model: None,
            max_tokens: None,
            temperature: None,
            prompt: String::new(),
            personality: Personality::default(),
            memory_enabled: true,
            area_filter: Vec::new(),
            use_custom_prompt: true,
            output_language: OutputLanguage::default(),
            tools_enabled: true,
        }
    }
}

/// The model parameters actually used for a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl AgentOptions {
    /// Resolve effective model parameters.
    ///
    /// `recommended` selects the fixed defaults; otherwise each override is
    /// used when present and falls back to its default individually.
    pub fn model_params(&self) -> ModelParams {
        let defaults = ModelParams::default();
        if self.recommended {
            return defaults;
        }
        ModelParams {
            model: self.chat_model.clone().unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        }
    }

    /// The area filter, or `None` when every area is wanted.
    pub fn areas(&self) -> Option<&[String]> {
        (!self.area_filter.is_empty()).then_some(self.area_filter.as_slice())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Path of the memory document; defaults to `~/.homeclaw/memory.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl MemoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("memory.json"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeConfig {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// One controllable device as declared in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub entity_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Domain such as `light`, `switch`, `cover`
    pub domain: String,
    #[serde(default)]
    pub on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl AppConfig {
    /// Load configuration from the default path, then apply env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `HOMECLAW_*` overrides using the given variable lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("HOMECLAW_API_KEY").or_else(|| lookup("ZAI_API_KEY")) {
            self.api_key = Some(key);
        }

        if let Some(url) = lookup("HOMECLAW_BASE_URL") {
            self.base_url = url;
        }

        // A model override implies the user opted out of recommended settings
        if let Some(model) = lookup("HOMECLAW_MODEL") {
            self.agent.recommended = false;
            self.agent.chat_model = Some(model);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".homeclaw")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("base_url must not be empty".into()));
        }

        if let Some(t) = self.agent.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "agent.temperature must be between 0.0 and 1.0".into(),
                ));
            }
        }

        if let Some(m) = self.agent.max_tokens {
            if m == 0 || m > MAX_TOKENS_LIMIT {
                return Err(ConfigError::ValidationError(format!(
                    "agent.max_tokens must be between 1 and {MAX_TOKENS_LIMIT}"
                )));
            }
        }

        for device in &self.home.devices {
            if let Some(b) = device.brightness {
                if b > 100 {
                    return Err(ConfigError::ValidationError(format!(
                        "brightness of {} must be 0-100",
                        device.entity_id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            agent: AgentOptions::default(),
            memory: MemoryConfig::default(),
            home: HomeConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.agent.recommended);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.base_url, config.base_url);
        assert_eq!(parsed.agent.personality, config.agent.personality);
    }

    #[test]
    fn recommended_ignores_overrides() {
        let opts = AgentOptions {
            chat_model: Some("glm-4-plus".into()),
            max_tokens: Some(10),
            ..AgentOptions::default()
        };
        assert_eq!(opts.model_params(), ModelParams::default());
    }

    #[test]
    fn overrides_fall_back_individually() {
        let opts = AgentOptions {
            recommended: false,
            chat_model: Some("glm-4-air".into()),
            ..AgentOptions::default()
        };
        let params = opts.model_params();
        assert_eq!(params.model, "glm-4-air");
        assert_eq!(params.max_tokens, DEFAULT_MAX_TOKENS);
        assert!((params.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn legacy_entry_without_new_options_loads() {
        let config: AppConfig = toml::from_str(
            r#"
[agent]
recommended = false
chat_model = "glm-4-long"
"#,
        )
        .unwrap();
        assert!(config.agent.memory_enabled);
        assert!(config.agent.use_custom_prompt);
        assert_eq!(config.agent.personality, Personality::Friendly);
        assert_eq!(config.agent.model_params().model, "glm-4-long");
    }

    #[test]
    fn unknown_personality_and_language_degrade() {
        let config: AppConfig = toml::from_str(
            r#"
[agent]
personality = "pirate"
output_language = "xx"
"#,
        )
        .unwrap();
        assert_eq!(config.agent.personality, Personality::Friendly);
        assert_eq!(config.agent.output_language, OutputLanguage::En);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.agent.temperature = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_max_tokens_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_tokens = Some(9000);
        assert!(config.validate().is_err());
        config.agent.max_tokens = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("ZAI_API_KEY", "zk-123"),
            ("HOMECLAW_MODEL", "glm-4-flash"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("zk-123"));
        assert_eq!(config.agent.model_params().model, "glm-4-flash");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn devices_parse_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[[home.devices]]
entity_id = "light.kitchen"
name = "Kitchen Light"
area = "kitchen"
domain = "light"
on = true
brightness = 80
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.home.devices.len(), 1);
        assert_eq!(config.home.devices[0].brightness, Some(80));
    }

    #[test]
    fn area_filter_empty_means_all() {
        let mut opts = AgentOptions::default();
        assert!(opts.areas().is_none());
        opts.area_filter = vec!["kitchen".into()];
        assert_eq!(opts.areas().unwrap().len(), 1);
    }
}
