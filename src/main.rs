use clap::Parser;
use scrabble_server::auth::UserRegistry;
use scrabble_server::config::NetworkConfig;
use scrabble_server::error::Result;
use scrabble_server::game::{Board, Dictionary};
use scrabble_server::transport::{start_server, ServerContext};
use scrabble_server::utils::logging::setup_logging;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};

/// Word-board server
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Board rows
    rows: NonZeroUsize,

    /// Board columns
    cols: NonZeroUsize,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration
    #[arg(short, long)]
    address: Option<String>,

    /// User registry file, overrides the configuration
    #[arg(long)]
    users: Option<PathBuf>,

    /// Word list file, overrides the configuration
    #[arg(long)]
    words: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(args).await {
        eprintln!("scrabble-server: {e}");
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<NetworkConfig> {
    let mut config = match &args.config {
        Some(path) => NetworkConfig::from_file(path)?,
        None => NetworkConfig::default(),
    };
    config.apply_env()?;

    config.game.rows = args.rows.get();
    config.game.cols = args.cols.get();
    if let Some(address) = &args.address {
        config.server.address = address.clone();
    }
    if let Some(users) = &args.users {
        config.server.users_file = users.clone();
    }
    if let Some(words) = &args.words {
        config.game.words_file = words.clone();
    }
    if args.debug {
        config.logging.log_level = Level::DEBUG;
    }

    config.validate_strict()?;
    Ok(config)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    setup_logging(&config.logging)?;

    // both files are read before the listener opens
    let registry = UserRegistry::load(&config.server.users_file)?;
    let dictionary = Dictionary::load(&config.game.words_file)?;
    let board = Board::new(config.game.rows, config.game.cols, dictionary);
    info!(rows = board.rows(), cols = board.cols(), "Board ready");

    let ctx = Arc::new(ServerContext::new(registry, board, &config.server));

    tokio::select! {
        result = start_server(&config.server.address, ctx.clone()) => {
            if let Err(e) = &result {
                error!(error = %e, "Server stopped");
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            ctx.metrics().log_metrics();
            Ok(())
        }
    }
}
