//! Payload ingestion: location, then stations, then day/hour rows, all inside
//! one transaction per payload.

use core::fmt;
use std::error::Error;

use log::{info, warn};
use serde_json::Value;

use crate::db::store::WeatherStore;
use crate::models::visualcrossing::{DecodeError, WeatherPayload};
use crate::services::{details, refs};

#[derive(Debug)]
pub enum IngestError {
    /// The document does not have the expected root shape.
    MalformedPayload(DecodeError),
    /// A statement outside the per-row isolation failed (location phase,
    /// transaction or savepoint handling).
    Database(diesel::result::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::MalformedPayload(e) => write!(f, "malformed payload at `{}`: {}", e.path(), e.inner()),
            IngestError::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IngestError::MalformedPayload(e) => Some(e),
            IngestError::Database(e) => Some(e),
        }
    }
}

impl From<diesel::result::Error> for IngestError {
    fn from(value: diesel::result::Error) -> Self {
        IngestError::Database(value)
    }
}

/// Why a single station or detail row was not written.
#[derive(Debug)]
pub enum RowError {
    Decode(DecodeError),
    Missing(&'static str),
    Database(diesel::result::Error),
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::Decode(e) => write!(f, "cannot decode `{}`: {}", e.path(), e.inner()),
            RowError::Missing(field) => write!(f, "missing {}", field),
            RowError::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl From<DecodeError> for RowError {
    fn from(value: DecodeError) -> Self {
        RowError::Decode(value)
    }
}

impl From<diesel::result::Error> for RowError {
    fn from(value: diesel::result::Error) -> Self {
        RowError::Database(value)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Inserted,
    /// A row with the same natural key already exists.
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableTally {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TableTally {
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.skipped + self.failed
    }
}

impl fmt::Display for TableTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted={} skipped={} failed={}",
            self.inserted, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub location_id: i64,
    pub locations: TableTally,
    pub stations: TableTally,
    pub days: TableTally,
    pub hours: TableTally,
}

impl IngestReport {
    pub fn inserted(&self) -> usize {
        self.locations.inserted + self.stations.inserted + self.days.inserted + self.hours.inserted
    }

    pub fn failed(&self) -> usize {
        self.locations.failed + self.stations.failed + self.days.failed + self.hours.failed
    }
}

/// Validate the root shape of `value` and ingest it.
pub fn ingest_value<S: WeatherStore + ?Sized>(store: &mut S, value: &Value) -> Result<IngestReport, IngestError> {
    let payload = WeatherPayload::from_value(value).map_err(IngestError::MalformedPayload)?;
    ingest(store, &payload)
}

/// Ingest one payload. Everything is committed together; an error here rolls
/// the whole payload back. Row-level failures are counted in the report.
pub fn ingest<S: WeatherStore + ?Sized>(store: &mut S, payload: &WeatherPayload) -> Result<IngestReport, IngestError> {
    store.begin()?;
    match run_phases(store, payload) {
        Ok(report) => {
            store.commit()?;
            info!(
                "Ingested {} ({} day(s)): locations [{}], stations [{}], days [{}], hours [{}]",
                payload.resolved_address,
                payload.days.len(),
                report.locations,
                report.stations,
                report.days,
                report.hours
            );
            Ok(report)
        }
        Err(e) => {
            if let Err(rb) = store.rollback() {
                warn!("Rollback after failed ingestion also failed: {}", rb);
            }
            Err(e)
        }
    }
}

fn run_phases<S: WeatherStore + ?Sized>(store: &mut S, payload: &WeatherPayload) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    report.location_id = refs::resolve_location(store, payload, &mut report.locations)?;
    refs::upsert_stations(store, &payload.stations, &mut report.stations)?;
    details::upsert_weather_details(store, &payload.days, report.location_id, &mut report.days, &mut report.hours)?;
    Ok(report)
}

/// Run `f` inside a savepoint. A row error rolls back to the savepoint and is
/// returned in the inner result; savepoint handling errors abort the payload.
pub(crate) fn isolated<S, F>(store: &mut S, f: F) -> Result<Result<RowOutcome, RowError>, IngestError>
where
    S: WeatherStore + ?Sized,
    F: FnOnce(&mut S) -> Result<RowOutcome, RowError>,
{
    store.begin()?;
    match f(store) {
        Ok(outcome) => {
            store.commit()?;
            Ok(Ok(outcome))
        }
        Err(e) => {
            store.rollback()?;
            Ok(Err(e))
        }
    }
}
