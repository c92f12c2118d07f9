mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ticketboard_core::{load_config, load_config_from_env, validate_config, Config};

/// Config file looked up in the working directory when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "ticketboard.toml";

#[derive(Debug, Parser)]
#[command(name = "ticketboard", version, about = "Ticket wall fed by a web help desk")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TICKETBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encrypt a help desk password for the config file
    Encrypt {
        /// Plaintext password
        password: String,
    },
    /// Check help desk credentials without fetching tickets
    Test {
        /// Help desk base URL (defaults to the configured target)
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Plaintext password
        #[arg(long, env = "TICKETBOARD_TEST_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Fetch tickets from the configured help desk
    Tickets {
        /// Keep tickets whose status matches (repeatable)
        #[arg(long)]
        status: Vec<String>,
        /// Keep tickets whose priority label or code matches (repeatable)
        #[arg(long)]
        priority: Vec<String>,
        /// Keep tickets whose room matches (repeatable)
        #[arg(long)]
        room: Vec<String>,
        /// Re-fetch every N seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Print the configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries command output.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(cli.config.as_deref())?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Command::Encrypt { password } => commands::encrypt(&config, &password),
        Command::Test {
            url,
            username,
            password,
        } => commands::test(&config, url, username, password).await,
        Command::Tickets {
            status,
            priority,
            room,
            watch,
        } => commands::tickets(&config, status, priority, room, watch).await,
        Command::Config => commands::show_config(&config),
    }
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => PathBuf::from(DEFAULT_CONFIG_FILE),
        None => {
            info!("No config file, using environment only");
            return load_config_from_env().context("Failed to load config from environment");
        }
    };

    info!("Loading configuration from {:?}", path);
    load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
}
