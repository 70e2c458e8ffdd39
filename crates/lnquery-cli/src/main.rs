use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lnquery_core::Config;
use lnquery_query::{ChannelQueryHandler, ChannelQueryTool};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "lnquery")]
#[command(author, version, about = "Ask questions about your Lightning node's channels")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Answer from built-in sample data
    #[arg(long, global = true, conflicts_with = "live")]
    mock: bool,

    /// Answer from the configured lnd node
    #[arg(long, global = true)]
    live: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The question, e.g. "how healthy are my channels"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the tool descriptor and its JSON schemas
    Schema,
    /// Answer line-delimited JSON tool calls on stdin
    Serve,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    if cli.mock {
        config.use_mock_data = true;
    } else if cli.live {
        config.use_mock_data = false;
    }
    Ok(config)
}

async fn build_handler(config: &Config) -> Result<ChannelQueryHandler> {
    let source = lnquery_nodes::connect_data_source(config)
        .await
        .context("failed to connect to the Lightning node")?;
    Ok(ChannelQueryHandler::with_criteria(source, config.health)?)
}

async fn serve(tool: ChannelQueryTool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(input) => match tool.invoke(input).await {
                Ok(output) => serde_json::to_value(output)?,
                Err(e) => serde_json::json!({ "error": { "message": e.sanitized() } }),
            },
            Err(e) => serde_json::json!({
                "error": { "message": format!("invalid JSON: {e}") }
            }),
        };

        let mut encoded = serde_json::to_vec(&output)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Schema => {
            let descriptor = ChannelQueryTool::descriptor();
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Commands::Ask { query, json } => {
            let config = load_config(&cli)?;
            let handler = build_handler(&config).await?;
            let result = handler.handle_query(&query.join(" ")).await;

            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.response);
            }
            if result.is_error() {
                std::process::exit(1);
            }
        }
        Commands::Serve => {
            let config = load_config(&cli)?;
            let handler = build_handler(&config).await?;
            tracing::info!("serving {} on stdio", lnquery_query::TOOL_NAME);
            serve(ChannelQueryTool::new(Arc::new(handler))).await?;
        }
    }

    Ok(())
}
