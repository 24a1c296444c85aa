//! The `edubot init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("edubot.toml").exists() {
        println!("edubot.toml already exists, skipping.");
    } else {
        std::fs::write("edubot.toml", SAMPLE_CONFIG)?;
        println!("Created edubot.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export OPENAI_API_KEY or edit edubot.toml");
    println!("  2. Run: edubot chat --message \"Why is the sky blue?\"");
    println!("  3. Run: edubot serve");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# edubot configuration

default_provider = "openai"
simple_model = "gpt-3.5-turbo"
complex_model = "gpt-4"
temperature = 0.7
max_tokens = 500
max_retries = 2

host = "127.0.0.1"
port = 5000
# progress_file = "edubot-progress.json"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.mock]
type = "mock"
response = "That is a great question. Let us learn about it together."

[validation]
min_length = 10
max_length = 2000
denylist = []
"#;
