use crate::services::youtube::{DEFAULT_API_BASE_URL, MAX_RETRIES};
use anyhow::{bail, Context, Result};
use env_logger::Builder;
use log::{info, LevelFilter};
use std::fmt;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_MAX_RESULTS: i64 = 500;
pub const DEFAULT_REGION: &str = "US";
pub const DEFAULT_OUTPUT_PATH: &str = "trending_videos.csv";

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    info!("Starting trending video collector...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub max_results: i64,
    pub region: String,
    pub output_path: PathBuf,
    pub api_base_url: Url,
    pub max_retries: u32,
    pub analyze: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_results", &self.max_results)
            .field("region", &self.region)
            .field("output_path", &self.output_path)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("max_retries", &self.max_retries)
            .field("analyze", &self.analyze)
            .finish()
    }
}

#[derive(Debug)]
pub enum Command {
    Run(AppConfig),
    Help,
}

fn parse_retries(value: &str) -> Result<u32> {
    let retries: u32 = value.parse()?;
    if retries > MAX_RETRIES {
        bail!("{retries} exceeds the limit of {MAX_RETRIES}");
    }
    Ok(retries)
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("Invalid API base URL: {raw}"))?;
    if url.cannot_be_a_base() {
        bail!("API base URL cannot be used as a base: {raw}");
    }
    // endpoints are joined onto the base, which needs a trailing slash
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_results = match lookup("TRENDING_MAX_RESULTS") {
            Some(value) => value
                .trim()
                .parse()
                .context("TRENDING_MAX_RESULTS must be an integer")?,
            None => DEFAULT_MAX_RESULTS,
        };
        let max_retries = match lookup("TRENDING_MAX_RETRIES") {
            Some(value) => parse_retries(value.trim())
                .context("TRENDING_MAX_RETRIES must be an integer between 0 and 10")?,
            None => 0,
        };
        let api_base_url = parse_base_url(
            &lookup("YOUTUBE_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;

        Ok(AppConfig {
            api_key: lookup("YOUTUBE_API_KEY").filter(|key| !key.trim().is_empty()),
            max_results,
            region: lookup("TRENDING_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            output_path: lookup("TRENDING_OUTPUT_PATH")
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string())
                .into(),
            api_base_url,
            max_retries,
            analyze: false,
        })
    }

    /// Command-line flags override the environment. `args` excludes the program name.
    pub fn apply_args(mut self, args: impl IntoIterator<Item = String>) -> Result<Command> {
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value_for = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} requires a value"))
            };

            match arg.as_str() {
                "--api-key" => self.api_key = Some(value_for("--api-key")?),
                "--max-results" => {
                    self.max_results = value_for("--max-results")?
                        .parse()
                        .context("Invalid value for --max-results")?;
                }
                "--region" => self.region = value_for("--region")?,
                "--output-path" => self.output_path = value_for("--output-path")?.into(),
                "--api-base-url" => {
                    self.api_base_url = parse_base_url(&value_for("--api-base-url")?)?;
                }
                "--retries" => {
                    self.max_retries = parse_retries(&value_for("--retries")?)
                        .context("Invalid value for --retries")?;
                }
                "--analyze" => self.analyze = true,
                "--help" | "-h" => return Ok(Command::Help),
                other => bail!("Unknown argument: {other}"),
            }
        }

        Ok(Command::Run(self))
    }
}

pub fn print_help() {
    println!("Trending video collector");
    println!();
    println!("Usage: trending-collector [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --api-key <KEY>        YouTube Data API key (env: YOUTUBE_API_KEY)");
    println!("  --max-results <N>      Number of trending videos to collect (default: {DEFAULT_MAX_RESULTS})");
    println!("  --region <CODE>        Region code of the trending chart (default: {DEFAULT_REGION})");
    println!("  --output-path <PATH>   CSV file to write (default: {DEFAULT_OUTPUT_PATH})");
    println!("  --api-base-url <URL>   API root (default: {DEFAULT_API_BASE_URL})");
    println!("  --retries <N>          Retries for failed page requests, 0 to {MAX_RETRIES} (default: 0)");
    println!("  --analyze              Print an exploratory report after collecting");
    println!("  -h, --help             Show this help message");
}
