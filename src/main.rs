use chrono::NaiveDate;
use clap::Parser;
use log::{error, info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};

use weather_ingest::client::{FetchOutcome, WeatherClient};
use weather_ingest::config::Config;
use weather_ingest::services::ingest;

#[derive(Parser)]
#[command(name = "weather-ingest")]
#[command(about = "Load Visual Crossing timeline weather into a SQL database", long_about = None)]
struct Cli {
    /// Load variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Overrides WEATHER_LOCATION
    #[arg(long)]
    location: Option<String>,

    /// Overrides WEATHER_START_DATE (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Overrides WEATHER_END_DATE (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Ingest a saved timeline JSON document instead of calling the API
    #[arg(long, value_name = "PATH")]
    payload_file: Option<PathBuf>,
}

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
}

fn run(cli: Cli) -> Result<(), String> {
    // 1) Load config, CLI flags win over the environment
    let mut cfg = Config::from_env()?;
    if let Some(location) = cli.location {
        cfg.location = location;
    }
    if cli.start.is_some() {
        cfg.start_date = cli.start;
    }
    if cli.end.is_some() {
        cfg.end_date = cli.end;
    }
    info!(
        "Config loaded (driver={}, location={}, start={}, end={}, unit_group={}, timeout={}s)",
        cfg.driver,
        cfg.location,
        cfg.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        cfg.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        cfg.unit_group.as_deref().unwrap_or("-"),
        cfg.http_timeout.as_secs()
    );

    // 2) Connect DB and apply pending migrations
    let connected = match &cfg.database_url {
        Some(url) => cfg.driver.connect_url(url),
        None => cfg.driver.connect(&cfg.connection),
    };
    let mut store = connected.map_err(|e| format!("DB connection failed: {}", e))?;
    info!("Connected to {} database", store.backend_name());

    // 3) Obtain the payload
    let payload = match cli.payload_file {
        Some(path) => read_payload_file(&path)?,
        None => fetch_payload(&cfg)?,
    };

    // 4) Ingest in one transaction
    let report = ingest::ingest_value(&mut *store, &payload).map_err(|e| format!("Ingestion failed: {}", e))?;
    if report.failed() > 0 {
        warn!("{} row(s) could not be ingested; see warnings above", report.failed());
    }

    let counts = store.row_counts().map_err(|e| format!("Counting rows failed: {}", e))?;
    info!(
        "Database now holds locations={}, stations={}, day rows={}, hour rows={}",
        counts.locations, counts.stations, counts.day_details, counts.hour_details
    );

    Ok(())
}

fn read_payload_file(path: &Path) -> Result<Value, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let payload = serde_json::from_slice(&bytes).map_err(|e| format!("{} is not JSON: {}", path.display(), e))?;
    info!("Loaded payload from {} ({} bytes)", path.display(), bytes.len());
    Ok(payload)
}

fn fetch_payload(cfg: &Config) -> Result<Value, String> {
    let api_key = cfg
        .api_key
        .clone()
        .ok_or_else(|| "Missing WEATHER_API_KEY (or pass --payload-file)".to_string())?;
    let (start, end) = cfg.fetch_window()?;

    let client = WeatherClient::new(&cfg.api_base_url, api_key, cfg.http_timeout).with_unit_group(cfg.unit_group.clone());
    info!("Fetching weather for {} from {} to {}", cfg.location, start, end);

    match client
        .fetch(&cfg.location, start, end)
        .map_err(|e| format!("Weather request failed: {}", e))?
    {
        FetchOutcome::Payload { status, payload } => {
            info!("Weather API answered http {}", status.as_u16());
            Ok(payload)
        }
        FetchOutcome::Rejected { status } => Err(format!("Weather API rejected the request with http {}", status.as_u16())),
    }
}

fn load_env(explicit: Option<PathBuf>) -> Result<Option<LoadedEnvFile>, String> {
    // dotenvy never overrides variables already present in the process environment
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(format!("env file not found: {}", path.display()));
        }
        dotenvy::from_path(&path).map_err(|e| format!("failed to load {}: {}", path.display(), e))?;
        return Ok(Some(LoadedEnvFile { path, explicit: true }));
    }

    let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
    let default_path = cwd.join(".env");
    if !default_path.is_file() {
        return Ok(None);
    }
    dotenvy::from_path(&default_path).map_err(|e| format!("failed to load {}: {}", default_path.display(), e))?;
    Ok(Some(LoadedEnvFile {
        path: default_path,
        explicit: false,
    }))
}

fn main() {
    let cli = Cli::parse();
    let loaded_env = match load_env(cli.env_file.clone()) {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, info.path.display());
    }

    info!(
        "weather-ingest {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(cli) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
