//! Completion Service clients for repochat.
//!
//! Both clients implement the `repochat_core::Provider` trait;
//! [`build_from_config`] picks one from the configuration.

pub mod ollama;
pub mod openai_compat;

pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;

use repochat_config::AppConfig;
use repochat_core::error::ProviderError;
use repochat_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let timeouts = Timeouts {
        request: Duration::from_secs(config.request_timeout_secs),
        connect: Duration::from_secs(config.connect_timeout_secs),
    };

    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::new(&config.base_url, timeouts)?)),
        "openai" => Ok(Arc::new(OpenAiCompatProvider::new(
            "openai",
            &config.base_url,
            config.api_key.clone().unwrap_or_default(),
            timeouts,
        )?)),
        other => Err(ProviderError::NotConfigured(format!("unknown provider '{other}'"))),
    }
}

/// HTTP timeouts shared by every client.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Whole request, including reading the body
    pub request: Duration,
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(300),
            connect: Duration::from_secs(10),
        }
    }
}

pub(crate) fn http_client(timeouts: Timeouts) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("failed to create HTTP client: {e}")))
}

/// Classify a reqwest failure as a transport error.
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}
