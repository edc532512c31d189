// src/main.rs

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use pathbalance::config::{self, BalanceConfig};
use pathbalance::llm::client::request::FLAGSHIP_MODEL;
use pathbalance::{AnalysisType, OpenAIClient};

/// Send journal prompts to the configured LLM and print the normalized reply
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file to use instead of .env / environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the configured one
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a prompt and print the reply
    Ask {
        /// Prompt text, or "-" to read it from stdin
        prompt: String,

        /// Model identifier (defaults to the configured model)
        #[arg(long)]
        model: Option<String>,

        /// weekly, monthly or journal (defaults to the configured type)
        #[arg(long)]
        analysis: Option<AnalysisType>,
    },
    /// Print the endpoint and request body without sending anything
    Plan {
        /// Prompt text, or "-" to read it from stdin
        prompt: String,

        #[arg(long, default_value = FLAGSHIP_MODEL)]
        model: String,

        #[arg(long, default_value = "weekly")]
        analysis: AnalysisType,
    },
}

/// The `--log-level` flag wins, then the configured level, then INFO
fn resolve_log_level(flag: Option<&str>, config: Option<&BalanceConfig>) -> Level {
    flag.and_then(|level| level.parse::<Level>().ok())
        .or_else(|| config.map(BalanceConfig::max_log_level))
        .unwrap_or(Level::INFO)
}

fn setup_logging(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn read_prompt(prompt: String) -> Result<String> {
    if prompt != "-" {
        return Ok(prompt);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read prompt from stdin")?;
    Ok(buf)
}

fn load_config(path: Option<&PathBuf>) -> Result<&'static BalanceConfig> {
    let loaded = match path {
        Some(path) => config::install(BalanceConfig::from_file(path)?)?,
        None => config::init()?,
    };
    Ok(loaded)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before logging so the configured level applies
    let loaded = load_config(cli.config.as_ref());
    let level = resolve_log_level(cli.log_level.as_deref(), loaded.as_ref().ok().copied());
    setup_logging(level)?;

    match cli.command {
        Command::Ask {
            prompt,
            model,
            analysis,
        } => {
            let config = loaded?;
            let prompt = read_prompt(prompt)?;
            let model = model.unwrap_or_else(|| config.model.clone());
            let analysis = analysis.unwrap_or(config.analysis_type);

            let client = OpenAIClient::from_config(config)?;
            match client.generate_response(&prompt, &model, analysis).await {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    if e.is_retryable() {
                        warn!("Temporary failure, safe to retry later");
                    }
                    return Err(e.into());
                }
            }
        }
        Command::Plan {
            prompt,
            model,
            analysis,
        } => {
            if let Err(e) = &loaded {
                debug!("No configuration loaded for plan: {}", e);
            }
            let prompt = read_prompt(prompt)?;
            let outbound = pathbalance::llm::client::build_request(&prompt, &model, analysis);
            info!("Planned request for model={}, analysis={}", model, analysis);

            println!("POST {}", outbound.endpoint.path());
            println!("{}", serde_json::to_string_pretty(&outbound.to_value()?)?);
        }
    }

    Ok(())
}
