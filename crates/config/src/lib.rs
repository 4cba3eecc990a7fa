//! Configuration loading, validation, and management for repochat.
//!
//! Loads configuration from `~/.repochat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use repochat_core::provider::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.repochat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion backend: "ollama" or "openai"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name passed to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Backend base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (only used by the OpenAI-compatible backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Whole-request timeout for completion calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout for completion calls
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Seed for the system prompt; the tool catalog is appended to it
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Sampling settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// History compaction settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Orchestration loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Tool sandbox settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "qwen2.5:1.5b".into()
}
fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_request_timeout() -> u64 {
    300
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_system_prompt() -> String {
    "You are a helpful AI assistant that answers questions about a software project.".into()
}

/// Providers `build_from_config` knows how to construct.
pub const KNOWN_PROVIDERS: &[&str] = &["ollama", "openai"];

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
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("system_prompt", &self.system_prompt)
            .field("generation", &self.generation)
            .field("history", &self.history)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Kept low: tool calls need strict JSON
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_context_window", skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,

    #[serde(default = "default_max_tokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

fn default_temperature() -> f32 {
    0.1
}
fn default_context_window() -> Option<u32> {
    Some(4096)
}
fn default_max_tokens() -> Option<u32> {
    Some(1024)
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            context_window: default_context_window(),
            max_tokens: default_max_tokens(),
            top_k: None,
            top_p: None,
        }
    }
}

impl GenerationConfig {
    pub fn to_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            context_window: self.context_window,
            max_tokens: self.max_tokens,
            top_k: self.top_k,
            top_p: self.top_p,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Compact once the history holds this many messages
    #[serde(default = "default_compact_threshold")]
    pub compact_threshold: usize,

    /// Messages kept verbatim at the tail after compaction
    #[serde(default = "default_keep_last")]
    pub keep_last: usize,
}

pub const DEFAULT_COMPACT_THRESHOLD: usize = 10;
pub const DEFAULT_KEEP_LAST: usize = 6;

fn default_compact_threshold() -> usize {
    DEFAULT_COMPACT_THRESHOLD
}
fn default_keep_last() -> usize {
    DEFAULT_KEEP_LAST
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            compact_threshold: default_compact_threshold(),
            keep_last: default_keep_last(),
        }
    }
}

/// What a turn returns when it runs out of tool calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// A fixed notice telling the user the budget ran out
    #[default]
    Notice,
    /// The output of the last tool that ran
    LastToolOutput,
    /// An error the caller must handle
    Incomplete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum tool calls per user turn
    #[serde(default = "default_max_tool_turns")]
    pub max_tool_turns: u32,

    /// Characters of tool output folded back into the history
    #[serde(default = "default_tool_output_budget")]
    pub tool_output_budget: usize,

    #[serde(default)]
    pub on_budget_exhausted: ExhaustionPolicy,
}

pub const DEFAULT_MAX_TOOL_TURNS: u32 = 5;
pub const DEFAULT_TOOL_OUTPUT_BUDGET: usize = 4000;

fn default_max_tool_turns() -> u32 {
    DEFAULT_MAX_TOOL_TURNS
}
fn default_tool_output_budget() -> usize {
    DEFAULT_TOOL_OUTPUT_BUDGET
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_turns: default_max_tool_turns(),
            tool_output_budget: default_tool_output_budget(),
            on_budget_exhausted: ExhaustionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Sandbox root; every tool path resolves under it
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_log_limit")]
    pub default_log_limit: u32,

    #[serde(default = "default_log_timeout")]
    pub log_timeout_secs: u64,

    #[serde(default = "default_read_budget")]
    pub read_budget_chars: usize,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_log_limit() -> u32 {
    20
}
fn default_log_timeout() -> u64 {
    5
}
fn default_read_budget() -> usize {
    2000
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            default_log_limit: default_log_limit(),
            log_timeout_secs: default_log_timeout(),
            read_budget_chars: default_read_budget(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.repochat/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `REPOCHAT_PROVIDER`, `REPOCHAT_MODEL`, `REPOCHAT_BASE_URL`
    /// - `REPOCHAT_API_KEY`, falling back to `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
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

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("REPOCHAT_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("REPOCHAT_MODEL") {
            self.model = model;
        }
        if let Some(url) = lookup("REPOCHAT_BASE_URL") {
            self.base_url = url;
        }
        if self.api_key.is_none() {
            self.api_key = lookup("REPOCHAT_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".repochat")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown provider '{}' (expected one of: {})",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.generation.temperature < 0.0 || self.generation.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_tool_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_turns must be at least 1".into(),
            ));
        }

        if self.agent.tool_output_budget == 0 || self.tools.read_budget_chars == 0 {
            return Err(ConfigError::ValidationError(
                "tool output budgets must be greater than 0".into(),
            ));
        }

        // Compaction must drop at least one message and must not re-trigger
        // on the very next append.
        if self.history.compact_threshold < self.history.keep_last + 3 {
            return Err(ConfigError::ValidationError(format!(
                "history.compact_threshold ({}) must be at least history.keep_last + 3 ({})",
                self.history.compact_threshold,
                self.history.keep_last + 3
            )));
        }

        Ok(())
    }

    /// Render this configuration as TOML, secrets omitted.
    pub fn to_toml(&self) -> String {
        let redacted = Self {
            api_key: None,
            ..self.clone()
        };
        toml::to_string_pretty(&redacted).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            system_prompt: default_system_prompt(),
            generation: GenerationConfig::default(),
            history: HistoryConfig::default(),
            agent: AgentSettings::default(),
            tools: ToolsConfig::default(),
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
