use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickshare::{serve, Config, Hooks};

#[derive(Parser, Debug)]
#[command(name = "quickshare")]
#[command(about = "Share local files and directories over HTTP")]
#[command(version)]
struct Cli {
    /// Files or directories to share (overrides `paths` from the config file)
    paths: Vec<PathBuf>,

    /// Port to listen on (default 8331)
    #[arg(short, long, env = "QUICKSHARE_PORT")]
    port: Option<u16>,

    /// Address to bind to (default 0.0.0.0)
    #[arg(short, long, env = "QUICKSHARE_BIND")]
    bind: Option<String>,

    /// Accept uploads into the first shared directory
    #[arg(short, long, env = "QUICKSHARE_RECEIVE")]
    receive: bool,

    /// Serve the first share as a continuously refreshed text clipboard
    #[arg(long, env = "QUICKSHARE_CLIPBOARD")]
    clipboard: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "QUICKSHARE_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "QUICKSHARE_CONFIG")]
    config: Option<PathBuf>,
}

/// Fold CLI arguments into the loaded config. Flags only override what
/// they explicitly set, so config-file values survive absent flags.
fn merge_cli(mut config: Config, cli: &Cli) -> Config {
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = &cli.bind {
        config.bind = bind.clone();
    }
    if cli.receive {
        config.receive = true;
    }
    if cli.clipboard {
        config.clipboard = true;
    }
    if !cli.paths.is_empty() {
        config.paths = cli.paths.clone();
    }

    // absolute paths keep route hashes stable across working directories
    config.paths = config
        .paths
        .iter()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
        .collect();
    if let Ok(resolved) = config.assets_dir.canonicalize() {
        config.assets_dir = resolved;
    }

    if config.share_address.is_empty() {
        config.share_address = format!("http://{}:{}", config.bind, config.port);
    }
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "quickshare=debug,tower_http=debug"
    } else {
        "quickshare=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    let config = merge_cli(config, &cli);

    serve(config, Hooks::default()).await?;
    Ok(())
}
