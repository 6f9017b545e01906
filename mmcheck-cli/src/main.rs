//! MiniMax API capability probe CLI.
//!
//! Runs a handful of sequential checks against the MiniMax API (chat,
//! speech synthesis, image understanding, role-play), prints a
//! per-check report and an aggregate summary, and writes the
//! synthesized audio artifact on TTS success.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod config;
mod error;
mod report;

use clap::{Args, Parser, Subcommand};
use error::{CliError, Result};
use mmcheck::MiniMaxClient;
use mmcheck::check::{self, Capability, Summary};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// mmcheck - MiniMax API capability probe
#[derive(Parser)]
#[command(name = "mmcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "MMCHECK_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capability checks
    Run(RunArgs),

    /// Create a default configuration file
    Init(InitArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Args)]
struct RunArgs {
    /// API key (falls back to the config file)
    #[arg(short = 'k', long, env = "MINIMAX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long, env = "MINIMAX_BASE_URL")]
    base_url: Option<String>,

    /// Chat model (also used by the vision and role-play checks)
    #[arg(short, long)]
    model: Option<String>,

    /// Speech-synthesis model
    #[arg(long)]
    speech_model: Option<String>,

    /// Voice identifier for the speech check
    #[arg(long)]
    voice: Option<String>,

    /// Where to write the synthesized audio artifact
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Probe image URL for the vision checks
    #[arg(long)]
    image_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Run only the named checks (chat, speech, vision-url,
    /// vision-inline, roleplay); may be repeated
    #[arg(long = "only", value_name = "CHECK", value_parser = parse_capability)]
    only: Vec<Capability>,
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

fn parse_capability(s: &str) -> std::result::Result<Capability, String> {
    s.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mmcheck={level},mmcheck_cli={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => cmd_run(args, cli.config).await,
        Commands::Init(args) => cmd_init(args, cli.config).await,
        Commands::Config(args) => cmd_config(args, cli.config).await,
    }
}

/// Run the capability checks.
async fn cmd_run(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.unwrap_or_else(config::config_path);
    let cfg = config::load_config_from(&config_file).await?;

    let api_key = args
        .api_key
        .or_else(|| cfg.api.api_key.clone())
        .ok_or_else(|| {
            CliError::other(
                "no API key: pass --api-key, set MINIMAX_API_KEY, or add it to the config file",
            )
        })?;

    let client = MiniMaxClient::builder()
        .api_key(api_key)
        .base_url(args.base_url.unwrap_or_else(|| cfg.api.base_url.clone()))
        .timeout_secs(args.timeout.unwrap_or(cfg.api.timeout_secs))
        .build()?;

    let mut options = cfg.check_options();
    if let Some(model) = args.model {
        options.chat_model = model;
    }
    if let Some(model) = args.speech_model {
        options.speech_model = model;
    }
    if let Some(voice) = args.voice {
        options.voice.voice_id = voice;
    }
    if let Some(output) = args.output {
        options.artifact_path = output;
    }
    if let Some(image_url) = args.image_url {
        options.image_url = image_url;
    }

    let capabilities: Vec<Capability> = if args.only.is_empty() {
        Capability::ALL.to_vec()
    } else {
        args.only
    };

    println!("MiniMax API capability probe");
    println!();

    let total = capabilities.len();
    let mut summary = Summary::default();
    for (index, capability) in capabilities.into_iter().enumerate() {
        report::print_check_header(index + 1, total, capability.title());
        let check_report = check::run_one(&client, &options, capability).await;
        report::print_report(&check_report);
        summary.push(check_report);
    }

    report::print_summary(&summary, &options.artifact_path);

    // The probe ran; failed checks show up in the summary, not in
    // the exit code.
    Ok(())
}

/// Create a default configuration file.
async fn cmd_init(args: InitArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.unwrap_or_else(config::config_path);

    if config_file.exists() && !args.force {
        println!("Configuration already exists at: {}", config_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    config::save_config_to(&config::ProbeConfig::default(), &config_file).await?;

    println!("Configuration created: {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. export MINIMAX_API_KEY=<key>");
    println!("  2. mmcheck run");

    Ok(())
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.unwrap_or_else(config::config_path);

    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            if config_file.exists() {
                let content = tokio::fs::read_to_string(&config_file)
                    .await
                    .map_err(config::ConfigError::Io)?;
                println!("{content}");
            } else {
                println!("Configuration file does not exist.");
                println!("Run 'mmcheck init' to create one.");
            }
        }
        ConfigCommands::Validate => {
            if !config_file.exists() {
                println!("error: configuration file does not exist");
                return Ok(());
            }

            match config::load_config_from(&config_file).await {
                Ok(_) => println!("Configuration is valid"),
                Err(e) => println!("error: {e}"),
            }
        }
    }

    Ok(())
}
