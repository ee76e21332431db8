//! # Arena Server
//!
//! Runs the authoritative simulation behind a TCP JSON-lines endpoint.
//!
//! ## Usage
//!
//! ```bash
//! arena_server --config arena.toml --bind 0.0.0.0:7777 --debug-bind 127.0.0.1:7778 --seed 42
//! ```
//!
//! `RUST_LOG` overrides the configured log level.

use skirmish_net::{ArenaServer, NetResult};
use skirmish_sim::{GameConfig, Simulation};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: arena_server [OPTIONS]

Options:
  -c, --config <PATH>        TOML config file (defaults built in)
  -b, --bind <ADDR>          Game listener address (default: 0.0.0.0:7777)
  -d, --debug-bind <ADDR>    Enable the debug channel on ADDR
  -s, --seed <SEED>          World seed (default: from the clock)
  -h, --help                 Show this help";

/// Command line overrides.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    bind: Option<String>,
    debug_bind: Option<String>,
    seed: Option<u64>,
}

/// Parses arguments; `Err` carries the text to print before exiting.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(flag) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{flag} needs a value\n\n{USAGE}"));
        match flag.as_str() {
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value()?)),
            "--bind" | "-b" => parsed.bind = Some(value()?),
            "--debug-bind" | "-d" => parsed.debug_bind = Some(value()?),
            "--seed" | "-s" => {
                let text = value()?;
                parsed.seed = Some(text.parse().map_err(|_| format!("invalid seed {text:?}"))?);
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown option {other:?}\n\n{USAGE}")),
        }
    }
    Ok(parsed)
}

fn load_config(args: Args) -> NetResult<GameConfig> {
    let mut config = GameConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.network.bind = bind;
    }
    if args.debug_bind.is_some() {
        config.network.debug_bind = args.debug_bind;
    }
    if args.seed.is_some() {
        config.world.seed = args.seed;
    }
    Ok(config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(config: GameConfig) -> NetResult<()> {
    let simulation = Simulation::new(config)?;
    info!(
        seed = simulation.seed().value(),
        half_size = simulation.layout().half_size,
        bots = simulation.actors().len(),
        "arena ready"
    );
    ArenaServer::bind(simulation).await?.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };
    let config = match load_config(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("arena_server: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log_level);

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "server stopped");
            ExitCode::FAILURE
        }
    }
}
