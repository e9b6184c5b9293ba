mod config;
mod errors;
mod models;
mod services;
mod utils;

use crate::config::{AppConfig, Command};
use crate::errors::CollectorError;
use crate::services::collector::collect_trending;
use crate::services::youtube::{TrendingVideosSource, YouTubeClient};
use crate::services::{analysis, storage};
use anyhow::Result;
use log::{error, info, warn};
use std::collections::HashMap;

#[tokio::main]
async fn main() {
    config::load_environment();
    config::init_logger();

    if let Err(e) = run().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = match AppConfig::from_env()?.apply_args(std::env::args().skip(1))? {
        Command::Run(config) => config,
        Command::Help => {
            config::print_help();
            return Ok(());
        }
    };
    info!("Configuration: {config:?}");

    let api_key = config.api_key.clone().ok_or_else(|| {
        CollectorError::Authorization(
            "no API key configured, set YOUTUBE_API_KEY or pass --api-key".to_string(),
        )
    })?;
    let client = YouTubeClient::new(config.api_base_url.clone(), api_key, config.max_retries)?;
    let source = TrendingVideosSource::new(client.clone(), config.region.clone());

    let trending_videos = collect_trending(&source, config.max_results).await?;
    storage::save_records(&trending_videos, &config.output_path)?;
    println!("trending_videos saved to {}", config.output_path.display());

    if config.analyze {
        let records = storage::load_records(&config.output_path)?;
        let categories = match client.fetch_category_mapping(&config.region).await {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!("Failed to load category names, reporting raw ids: {}", e.report());
                HashMap::new()
            }
        };
        println!("{}", analysis::analyze(&records, &categories));
    }

    Ok(())
}
