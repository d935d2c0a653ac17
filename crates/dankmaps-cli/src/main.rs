mod favorites;
mod map;
mod stores;
mod watch;

use clap::{Parser, Subcommand};
use dankmaps_core::GeoPoint;
use tracing_subscriber::EnvFilter;

use crate::favorites::FavoritesCommands;
use crate::map::MapCommands;
use crate::stores::StoresCommands;

#[derive(Debug, Parser)]
#[command(name = "dankmaps-cli")]
#[command(about = "DankMaps store directory command line interface")]
struct Cli {
    /// Store directory base URL (overrides DANKMAPS_FEED_URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List and inspect stores from the feed
    Stores {
        #[command(subcommand)]
        command: StoresCommands,
    },
    /// Viewport and selection helpers
    Map {
        #[command(subcommand)]
        command: MapCommands,
    },
    /// Print store changes pushed by the server until interrupted
    Watch {
        /// Current position as `lat,lng`
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        user: Option<GeoPoint>,
    },
    /// Manage locally stored favorite stores
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
}

/// Parses `lat,lng` in decimal degrees.
pub(crate) fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lng', got '{raw}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{part}': {e}"))
    };
    let point = GeoPoint::new(parse(lat)?, parse(lng)?);
    if !point.is_valid() {
        return Err(format!("coordinates out of range: {point}"));
    }
    Ok(point)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("dankmaps-cli ready; run with --help for commands");
        return Ok(());
    };

    let mut config = dankmaps_core::load_app_config_from_env()?;
    if let Some(endpoint) = cli.endpoint {
        config.feed_url = endpoint;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Stores { command } => stores::run(&config, command).await,
        Commands::Map { command } => map::run(&config, command).await,
        Commands::Watch { user } => watch::run(&config, user).await,
        Commands::Favorites { command } => favorites::run(&config, command),
    }
}
