use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod repl;

use commands::Context;

#[derive(Parser)]
#[command(name = "aidchat")]
#[command(about = "AidChat - chat with the aid assistant and analyze documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config.toml and AIDCHAT_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Directory holding config.toml and the credential database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Password; prompted on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Interactive conversation
    Chat,
    /// Send a single question and print the reply
    Ask {
        /// Question text
        text: String,
    },
    /// Upload a document for analysis
    Analyze {
        /// File to analyze (pdf, png, jpg, jpeg, doc, docx, txt)
        file: PathBuf,
    },
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Interactive output shares the terminal with log lines
    init_logging(match cli.command {
        Commands::Chat => "warn",
        _ => "info",
    });

    let ctx = Context::new(cli.base_url.as_deref(), cli.timeout, cli.data_dir)?;

    match cli.command {
        Commands::Login { email, password } => commands::login::run(&ctx, &email, password).await?,
        Commands::Logout => commands::logout::run(&ctx)?,
        Commands::Chat => commands::chat::run(&ctx).await?,
        Commands::Ask { text } => commands::ask::run(&ctx, &text).await?,
        Commands::Analyze { file } => commands::analyze::run(&ctx, &file).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["aidchat", "ask", "hello", "--base-url", "http://example.test"]);
        assert_eq!(cli.base_url.as_deref(), Some("http://example.test"));
        assert!(matches!(cli.command, Commands::Ask { ref text } if text == "hello"));
    }
}
