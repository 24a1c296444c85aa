//! The `edubot serve` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use edubot_core::progress::ProgressTracker;
use edubot_providers::config::load_config_from;

pub async fn execute(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let tracker = match &config.progress_file {
        Some(path) if path.exists() => {
            let tracker = ProgressTracker::load_json(path)?;
            tracing::info!(
                "loaded progress for {} student(s) from {}",
                tracker.len(),
                path.display()
            );
            tracker
        }
        _ => ProgressTracker::new(),
    };
    let tracker = Arc::new(tracker);
    let service = Arc::new(super::build_service(&config, Arc::clone(&tracker))?);

    let address = format!(
        "{}:{}",
        host.as_deref().unwrap_or(&config.host),
        port.unwrap_or(config.port)
    );
    tracing::info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    edubot_server::serve(listener, service, edubot_server::shutdown_signal()).await?;

    if let Some(path) = &config.progress_file {
        tracker.save_json(path)?;
        tracing::info!("saved progress to {}", path.display());
    }

    Ok(())
}
