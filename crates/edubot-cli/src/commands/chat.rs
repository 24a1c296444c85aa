//! The `edubot chat` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use edubot_core::progress::ProgressTracker;
use edubot_core::service::ChatRequest;
use edubot_providers::config::load_config_from;

pub async fn execute(
    message: String,
    skip_validation: bool,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(!message.trim().is_empty(), "message must not be empty");

    let config = load_config_from(config_path.as_deref())?;
    let service = super::build_service(&config, Arc::new(ProgressTracker::new()))?;

    let reply = service
        .chat(&ChatRequest {
            message,
            skip_validation,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!("{}", reply.response);
    if !reply.validation_errors.is_empty() {
        eprintln!("\nValidation errors:");
        for message in &reply.validation_errors {
            eprintln!("  - {message}");
        }
    }

    Ok(())
}
