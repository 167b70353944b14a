//! In-memory `WeatherStore` for pipeline tests.
//!
//! Every `begin` snapshots the tables and `rollback` restores the snapshot,
//! which gives the same nesting semantics as transactions plus savepoints.

use diesel::result::{DatabaseErrorKind, Error as DieselError, QueryResult};

use crate::db::models::{DetailKey, NewLocation, NewStation, NewWeatherDetail};
use crate::db::store::{RowCounts, WeatherStore};

#[derive(Debug, Clone, Default)]
struct Snapshot {
    locations: Vec<(i64, NewLocation)>,
    stations: Vec<(i64, NewStation)>,
    details: Vec<NewWeatherDetail>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub locations: Vec<(i64, NewLocation)>,
    pub stations: Vec<(i64, NewStation)>,
    pub details: Vec<NewWeatherDetail>,
    pub fail_location_insert: bool,
    /// Detail inserts for these `datetime` values are rejected.
    pub fail_detail_datetimes: Vec<String>,
    snapshots: Vec<Snapshot>,
}

impl MemoryStore {
    /// Store whose location inserts always fail.
    pub fn failing_location_insert() -> Self {
        MemoryStore {
            fail_location_insert: true,
            ..MemoryStore::default()
        }
    }

    /// Store that rejects detail inserts for the given `datetime` values.
    pub fn failing_details(datetimes: &[&str]) -> Self {
        MemoryStore {
            fail_detail_datetimes: datetimes.iter().map(|d| d.to_string()).collect(),
            ..MemoryStore::default()
        }
    }

    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }
}

fn injected() -> DieselError {
    DieselError::DatabaseError(DatabaseErrorKind::Unknown, Box::new("injected failure".to_string()))
}

impl WeatherStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn begin(&mut self) -> QueryResult<()> {
        self.snapshots.push(Snapshot {
            locations: self.locations.clone(),
            stations: self.stations.clone(),
            details: self.details.clone(),
        });
        Ok(())
    }

    fn commit(&mut self) -> QueryResult<()> {
        self.snapshots.pop().map(|_| ()).ok_or(DieselError::NotInTransaction)
    }

    fn rollback(&mut self) -> QueryResult<()> {
        let snapshot = self.snapshots.pop().ok_or(DieselError::NotInTransaction)?;
        self.locations = snapshot.locations;
        self.stations = snapshot.stations;
        self.details = snapshot.details;
        Ok(())
    }

    fn find_location(&mut self, latitude: f64, longitude: f64) -> QueryResult<Option<i64>> {
        Ok(self
            .locations
            .iter()
            .find(|(_, l)| l.latitude == latitude && l.longitude == longitude)
            .map(|(id, _)| *id))
    }

    fn insert_location(&mut self, row: &NewLocation) -> QueryResult<()> {
        if self.fail_location_insert {
            return Err(injected());
        }
        let id = self.locations.len() as i64 + 1;
        self.locations.push((id, row.clone()));
        Ok(())
    }

    fn find_station(&mut self, name_abbr: &str) -> QueryResult<Option<i64>> {
        Ok(self
            .stations
            .iter()
            .find(|(_, s)| s.name_abbr == name_abbr)
            .map(|(id, _)| *id))
    }

    fn insert_station(&mut self, row: &NewStation) -> QueryResult<()> {
        let id = self.stations.len() as i64 + 1;
        self.stations.push((id, row.clone()));
        Ok(())
    }

    fn find_weather_detail(&mut self, key: &DetailKey) -> QueryResult<Option<i64>> {
        Ok(self
            .details
            .iter()
            .position(|d| {
                d.location_id == key.location_id
                    && d.date == key.date
                    && d.datetime_epoch == key.datetime_epoch
                    && d.datetime == key.datetime
                    && d.detail_type == key.detail_type.as_str()
            })
            .map(|i| i as i64 + 1))
    }

    fn insert_weather_detail(&mut self, row: &NewWeatherDetail) -> QueryResult<()> {
        if self.fail_detail_datetimes.contains(&row.datetime) {
            return Err(injected());
        }
        self.details.push(row.clone());
        Ok(())
    }

    fn row_counts(&mut self) -> QueryResult<RowCounts> {
        let count = |t: &str| self.details.iter().filter(|d| d.detail_type == t).count() as i64;
        Ok(RowCounts {
            locations: self.locations.len() as i64,
            stations: self.stations.len() as i64,
            day_details: count("DAY"),
            hour_details: count("HOUR"),
        })
    }
}
