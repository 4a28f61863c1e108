//! Track planner
//!
//! Reads a JSON list of track descriptions and prints, one JSON line per
//! track, whether it would be copied or transcoded into an MP4 output.
//!
//! Usage: `media-transformer [config.toml] <tracks.json>`

use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_transformer::config::{LoggingConfig, TransformerConfig};
use media_transformer::config_file::ConfigFile;
use media_transformer::plan::{plan_tracks, TrackDescription};
use media_transformer::ContainerCapabilities;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "media-transformer";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, tracks_path) = match args.as_slice() {
        [tracks] => (None, tracks.as_str()),
        [config, tracks] => (Some(config.as_str()), tracks.as_str()),
        _ => {
            eprintln!("Usage: {} [config.toml] <tracks.json>", APP_NAME);
            std::process::exit(2);
        }
    };

    let config = load_config(config_path);
    init_logging(&config.logging);
    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::debug!("Configuration loaded: {:?}", config);

    let content = std::fs::read_to_string(tracks_path)?;
    let tracks: Vec<TrackDescription> = serde_json::from_str(&content)?;
    tracing::info!(tracks = tracks.len(), path = %tracks_path, "Planning tracks");

    let plans = plan_tracks(&tracks, &config, &ContainerCapabilities::mp4(), false);
    for plan in &plans {
        println!("{}", serde_json::to_string(plan)?);
    }
    Ok(())
}

/// Load the configuration file, falling back to defaults
fn load_config(path: Option<&str>) -> TransformerConfig {
    let Some(path) = path else {
        return TransformerConfig::default();
    };
    if !Path::new(path).exists() {
        eprintln!("Config file {} not found, using defaults", path);
        return TransformerConfig::default();
    }
    match ConfigFile::from_file(path) {
        Ok(cf) => cf.into_transformer_config(),
        Err(e) => {
            eprintln!("Failed to load config file {}: {}. Using defaults.", path, e);
            TransformerConfig::default()
        }
    }
}

/// Initialize logging with tracing
fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("media_transformer={}", logging.level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
