//! Configuration and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use edubot_core::service::ChatServiceConfig;
use edubot_core::traits::TextGenerator;
use edubot_core::validation::ValidationConfig;

use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Mock {
        /// Fixed text returned for every prompt.
        #[serde(default)]
        response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Mock { response } => {
                f.debug_struct("Mock").field("response", response).finish()
            }
        }
    }
}

/// Top-level edubot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdubotConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used for all generation.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model for chat and search.
    #[serde(default = "default_simple_model")]
    pub simple_model: String,
    /// Model for explanations.
    #[serde(default = "default_complex_model")]
    pub complex_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Max retries on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Where the server loads and saves progress. In-memory only when unset.
    #[serde(default)]
    pub progress_file: Option<PathBuf>,
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_simple_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_complex_model() -> String {
    "gpt-4".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}

impl Default for EdubotConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            simple_model: default_simple_model(),
            complex_model: default_complex_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            host: default_host(),
            port: default_port(),
            progress_file: None,
            validation: ValidationConfig::default(),
        }
    }
}

impl EdubotConfig {
    /// Generation settings for the chat service.
    pub fn chat_service_config(&self) -> ChatServiceConfig {
        ChatServiceConfig {
            simple_model: self.simple_model.clone(),
            complex_model: self.complex_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Build the configured default provider.
    pub fn default_generator(&self) -> Result<Arc<dyn TextGenerator>> {
        let provider = self.providers.get(&self.default_provider).with_context(|| {
            format!(
                "provider '{}' is not configured (run `edubot init` to create a config file)",
                self.default_provider
            )
        })?;
        create_provider(&self.default_provider, provider)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `edubot.toml` in the current directory
/// 2. `~/.config/edubot/config.toml`
///
/// Environment variable overrides: `EDUBOT_OPENAI_KEY`, then `OPENAI_API_KEY`.
pub fn load_config() -> Result<EdubotConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EdubotConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("edubot.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<EdubotConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EdubotConfig::default(),
    };

    // Apply env var overrides
    let env_key = std::env::var("EDUBOT_OPENAI_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"));
    if let Ok(key) = env_key {
        config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let Some(ProviderConfig::OpenAI { api_key, .. }) = config.providers.get_mut("openai") {
            *api_key = key;
        }
    }

    // Resolve env vars in all provider configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("edubot"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Arc<dyn TextGenerator>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            if api_key.trim().is_empty() {
                anyhow::bail!("OpenAI API key not configured for provider '{name}'");
            }
            let provider = OpenAiProvider::new(api_key, base_url.clone(), org_id.clone())
                .with_context(|| format!("failed to build provider '{name}'"))?;
            Ok(Arc::new(provider))
        }
        ProviderConfig::Mock { response } => Ok(Arc::new(match response {
            Some(text) => MockProvider::with_fixed_response(text),
            None => MockProvider::new(HashMap::new()),
        })),
    }
}
