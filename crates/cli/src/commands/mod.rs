//! CLI subcommands.

pub mod chat;
pub mod config;
pub mod tools;

use repochat_config::AppConfig;
use repochat_tools::ToolRegistry;
use std::path::PathBuf;
use std::time::Duration;

/// Load the configuration and apply command-line overrides.
pub fn load_config(root: Option<PathBuf>, model: Option<String>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(root) = root {
        config.tools.root = root;
    }
    if let Some(model) = model {
        config.model = model;
    }
    Ok(config)
}

/// Build the tool registry for the configured sandbox root.
pub fn build_registry(config: &AppConfig) -> Result<ToolRegistry, Box<dyn std::error::Error>> {
    let root = &config.tools.root;
    if !root.is_dir() {
        return Err(format!("Repository root '{}' is not a directory", root.display()).into());
    }

    Ok(ToolRegistry::new(root.clone())
        .with_default_log_limit(config.tools.default_log_limit)
        .with_log_timeout(Duration::from_secs(config.tools.log_timeout_secs))
        .with_read_budget(config.tools.read_budget_chars))
}
