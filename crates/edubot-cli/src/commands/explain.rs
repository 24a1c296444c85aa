//! The `edubot explain` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use edubot_core::progress::ProgressTracker;
use edubot_core::service::ExplanationRequest;
use edubot_providers::config::load_config_from;

pub async fn execute(
    topic: String,
    question: String,
    context: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let service = super::build_service(&config, Arc::new(ProgressTracker::new()))?;

    let explanation = service
        .explain(&ExplanationRequest {
            topic,
            question,
            context,
            student_id: None,
        })
        .await?;

    println!("{}", explanation.explanation);
    Ok(())
}
