//! edubot CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "edubot",
    version,
    about = "Educational chat backend with response validation and progress tracking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Ask a question and validate the answer
    Chat {
        /// The student's message
        #[arg(long)]
        message: String,

        /// Return the raw answer without validation
        #[arg(long)]
        skip_validation: bool,

        /// Print the full reply as JSON
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Explain a concept for a topic
    Explain {
        /// Topic the question belongs to
        #[arg(long)]
        topic: String,

        /// The question to explain
        #[arg(long)]
        question: String,

        /// Extra context for the explanation
        #[arg(long)]
        context: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the validation rules over a text
    Validate {
        /// Text to validate
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// File whose contents are validated
        #[arg(long)]
        file: Option<PathBuf>,

        /// Extra denylisted terms (comma-separated)
        #[arg(long, value_delimiter = ',')]
        denylist: Vec<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Record or inspect student progress in a JSON store
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("edubot=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port, config } => {
            commands::serve::execute(host, port, config).await
        }
        Commands::Chat {
            message,
            skip_validation,
            json,
            config,
        } => commands::chat::execute(message, skip_validation, json, config).await,
        Commands::Explain {
            topic,
            question,
            context,
            config,
        } => commands::explain::execute(topic, question, context, config).await,
        Commands::Validate {
            text,
            file,
            denylist,
            config,
        } => commands::validate::execute(text, file, denylist, config),
        Commands::Progress { action } => commands::progress::execute(action),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
