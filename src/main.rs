#![forbid(unsafe_code)]

//! `byteplay` — replay raw byte command sequences against an interactive
//! target reached over TCP or spawned as a local child process.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use byteplay::chain::{self, ChainElement};
use byteplay::conn::{LocalConn, RemoteConn};
use byteplay::parser::CommandParser;
use byteplay::session;
use byteplay::{AppError, DriveConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "byteplay",
    about = "Drive an interactive target over TCP or child-process stdio",
    version,
    long_about = None
)]
#[command(group(ArgGroup::new("target").required(true).args(["local", "remote"])))]
struct Cli {
    /// Path to a local target binary to spawn.
    #[arg(long, value_name = "BINARY")]
    local: Option<PathBuf>,

    /// Remote target host and port.
    #[arg(long, num_args = 2, value_names = ["HOST", "PORT"])]
    remote: Option<Vec<String>>,

    /// Command tokens replayed before interactive mode; pass the flag with
    /// no tokens to skip the built-in sequence entirely.
    #[arg(long = "pre-cmds", num_args = 0.., value_name = "TOKEN")]
    pre_cmds: Option<Vec<String>>,

    /// Silence window for ordinary commands (seconds).
    #[arg(long, value_name = "SECONDS")]
    short_timeout: Option<f64>,

    /// Silence window for the slow command and the banner read (seconds).
    #[arg(long, value_name = "SECONDS")]
    long_timeout: Option<f64>,

    /// TCP connect deadline (seconds); ignored for local targets.
    #[arg(long, value_name = "SECONDS")]
    connect_timeout: Option<f64>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    // Dispatch is strictly sequential with one outstanding operation at a
    // time, so a single reactor thread is all the runtime this needs.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = load_config(&args)?;
    let commands = resolve_pre_commands(&config)?;

    if let Some(binary) = args.local {
        let conn = LocalConn::spawn(&binary)?;
        info!(binary = %binary.display(), "spawned local target");
        session::run(conn, &commands, &config).await
    } else if let Some(remote) = args.remote {
        let (host, port) = parse_remote(&remote)?;
        let conn = RemoteConn::connect(&host, port, config.connect_timeout()).await?;
        info!(host, port, "connected to remote target");
        session::run(conn, &commands, &config).await
    } else {
        // The clap target group keeps this branch unreachable.
        Err(AppError::Config("no target specified".into()))
    }
}

/// Layer the configuration: CLI flag over config file over defaults.
fn load_config(args: &Cli) -> Result<DriveConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| AppError::Config(format!("cannot read config: {err}")))?;
            DriveConfig::from_toml_str(&text)?
        }
        None => DriveConfig::default(),
    };

    if let Some(value) = args.short_timeout {
        config.short_timeout = value;
    }
    if let Some(value) = args.long_timeout {
        config.long_timeout = value;
    }
    if let Some(value) = args.connect_timeout {
        config.connect_timeout = value;
    }
    if let Some(tokens) = &args.pre_cmds {
        config.pre_commands = Some(tokens.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Resolve the pre-command list: parse operator tokens when given, fall back
/// to the built-in sequence otherwise. An explicit empty list replays nothing.
fn resolve_pre_commands(config: &DriveConfig) -> Result<Vec<ChainElement>> {
    match &config.pre_commands {
        None => Ok(chain::default_pre_commands()),
        Some(tokens) => {
            let parser = CommandParser::new()?;
            Ok(parser.parse(tokens)?.into_iter().map(Into::into).collect())
        }
    }
}

fn parse_remote(remote: &[String]) -> Result<(String, u16)> {
    match remote {
        [host, port] => {
            let port = port
                .parse::<u16>()
                .map_err(|err| AppError::Config(format!("invalid port `{port}`: {err}")))?;
            Ok((host.clone(), port))
        }
        _ => Err(AppError::Config("--remote takes exactly HOST PORT".into())),
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
