//! edubot-providers — LLM provider integrations and configuration.
//!
//! Implements the `TextGenerator` trait for OpenAI-compatible APIs and a
//! mock backend, and loads the `edubot.toml` configuration.

pub mod config;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, EdubotConfig, ProviderConfig};
pub use edubot_core::error::ProviderError;
