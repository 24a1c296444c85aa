pub mod chat;
pub mod explain;
pub mod init;
pub mod list_models;
pub mod progress;
pub mod serve;
pub mod validate;

use std::sync::Arc;

use anyhow::Result;

use edubot_core::progress::ProgressTracker;
use edubot_core::validation::ValidationEngine;
use edubot_core::ChatService;
use edubot_providers::EdubotConfig;

/// Wire the configured provider, rules and tracker into a chat service.
pub fn build_service(config: &EdubotConfig, tracker: Arc<ProgressTracker>) -> Result<ChatService> {
    let generator = config.default_generator()?;
    Ok(ChatService::new(
        generator,
        ValidationEngine::new(&config.validation),
        tracker,
        config.chat_service_config(),
    ))
}
