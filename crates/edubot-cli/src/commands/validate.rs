//! The `edubot validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use edubot_core::validation::ValidationEngine;
use edubot_providers::config::load_config_from;

pub fn execute(
    text: Option<String>,
    file: Option<PathBuf>,
    denylist: Vec<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };

    let mut config = load_config_from(config_path.as_deref())?.validation;
    config.denylist.extend(denylist);

    let report = ValidationEngine::new(&config).validate(&text);

    let mut table = Table::new();
    table.set_header(vec!["Rule", "Result", "Message"]);
    for result in report.results() {
        table.add_row(vec![
            Cell::new(&result.rule),
            Cell::new(if result.valid { "PASS" } else { "FAIL" }),
            Cell::new(result.message.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");

    let failures = report.error_messages();
    if failures.is_empty() {
        println!("Response valid.");
        Ok(())
    } else {
        anyhow::bail!("{} validation rule(s) failed", failures.len())
    }
}
