use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tunebot::config::BotConfig;
use tunebot::waiter::EventWaiter;
use tunebot::{Bot, ShutdownOutcome, logging, panic_hook};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log directory, overriding `log_dir` from the configuration
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log filter directive, overriding `RUST_LOG` (e.g. "tunebot=debug")
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = BotConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(log_dir) = args.log_dir {
        config.log_dir = log_dir;
    }

    let (log_config, guard) = logging::init_logging(&config.log_dir)?;
    panic_hook::install(log_config.log_dir());
    if let Some(directive) = &args.log_filter {
        log_config.set_filter(directive)?;
    }

    let background = CancellationToken::new();
    log_config.start_retention_cleanup(background.child_token());

    let bot = Bot::new(config, Arc::new(EventWaiter::new()));

    if let Err(e) = bot.ensure_fresh_token().await {
        warn!(error = %e, transient = e.is_transient(), "Initial token refresh failed");
    }

    info!(filter = %log_config.get_filter(), "tunebot started");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Received Ctrl-C");
        }
        _ = bot.terminated() => {}
    }

    let exit_code = match bot.shutdown().await {
        ShutdownOutcome::Terminated { exit_code, .. } => exit_code,
        ShutdownOutcome::AlreadyShuttingDown => {
            bot.terminated().await;
            tunebot::bot::EXIT_SUCCESS
        }
    };
    background.cancel();

    // `process::exit` skips destructors; flush the file writer first.
    drop(guard);
    process::exit(exit_code);
}
