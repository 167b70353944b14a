//! Runtime configuration from environment variables.
//! Defaults target a local PostgreSQL and the public Visual Crossing endpoint.

use chrono::NaiveDate;
use std::time::Duration;

use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::db::connection::{ConnectionParams, Driver};
use crate::utils::default_end_date;

pub const DEFAULT_LOCATION: &str = "Toronto,CA";
pub const DEFAULT_DATABASE: &str = "weather";

#[derive(Debug, Clone)]
pub struct Config {
    pub driver: Driver,
    /// Full connection URL; wins over `connection` when set.
    pub database_url: Option<String>,
    pub connection: ConnectionParams,
    pub api_base_url: String,
    /// Only needed when fetching from the API.
    pub api_key: Option<String>,
    pub unit_group: Option<String>,
    pub location: String,
    pub start_date: Option<NaiveDate>,
    /// Defaults to one month after `start_date`.
    pub end_date: Option<NaiveDate>,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let driver = match get("DB_DRIVER") {
            Some(s) => s.parse::<Driver>().map_err(|e| e.to_string())?,
            None => Driver::Postgres,
        };

        let port = match get("DB_PORT") {
            Some(s) => Some(
                s.parse::<u16>()
                    .map_err(|_| format!("DB_PORT must be a port number, got {}", s))?,
            ),
            None => None,
        };

        let connection = ConnectionParams {
            host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            user: get("DB_USER").unwrap_or_default(),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            database: get("DB_NAME").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            port,
        };

        let start_date = get("WEATHER_START_DATE")
            .map(|s| parse_date("WEATHER_START_DATE", &s))
            .transpose()?;
        let end_date = get("WEATHER_END_DATE")
            .map(|s| parse_date("WEATHER_END_DATE", &s))
            .transpose()?;

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(s) => match s.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(format!("HTTP_TIMEOUT_SECS must be a positive number of seconds, got {}", s)),
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Config {
            driver,
            database_url: get("DATABASE_URL"),
            connection,
            api_base_url: get("WEATHER_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: get("WEATHER_API_KEY"),
            unit_group: get("WEATHER_UNIT_GROUP"),
            location: get("WEATHER_LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            start_date,
            end_date,
            http_timeout,
        })
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| self.driver.database_url(&self.connection))
    }

    /// `(start, end)` of the API request.
    pub fn fetch_window(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let start = self
            .start_date
            .ok_or_else(|| "Missing start date: set WEATHER_START_DATE or pass --start".to_string())?;
        let end = self.end_date.unwrap_or_else(|| default_end_date(start));
        if end < start {
            return Err(format!("End date {} is before start date {}", end, start));
        }
        Ok((start, end))
    }
}

pub fn parse_date(name: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| format!("{} must be in YYYY-MM-DD format", name))
}
