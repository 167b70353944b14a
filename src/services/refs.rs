use std::collections::BTreeMap;

use diesel::result::Error as DieselError;
use log::{debug, info, warn};
use serde_json::Value;

use crate::db::models as dbm;
use crate::db::store::WeatherStore;
use crate::models::visualcrossing::{self as vc, StationRecord, WeatherPayload};
use crate::services::ingest::{isolated, IngestError, RowOutcome, TableTally};

/// Find the location by `(latitude, longitude)` or insert it.
///
/// An existing row is returned untouched even if the payload's other fields
/// differ. Failures here are not isolated: without a location id no detail
/// row can be written.
pub fn resolve_location<S: WeatherStore + ?Sized>(
    store: &mut S,
    payload: &WeatherPayload,
    tally: &mut TableTally,
) -> Result<i64, IngestError> {
    if let Some(id) = store.find_location(payload.latitude, payload.longitude)? {
        debug!(
            "Refs: location ({}, {}) already stored as {}",
            payload.latitude, payload.longitude, id
        );
        tally.record(RowOutcome::Skipped);
        return Ok(id);
    }

    let new_row = dbm::NewLocation {
        timezone: Some(payload.timezone.clone()),
        latitude: payload.latitude,
        longitude: payload.longitude,
        resolved_addr: Some(payload.resolved_address.clone()),
        address: Some(payload.address.clone()),
        description: payload.description.clone(),
    };
    store.insert_location(&new_row)?;

    let id = store
        .find_location(new_row.latitude, new_row.longitude)?
        .ok_or(DieselError::NotFound)?;
    info!(
        "Refs: inserted location {} ({}, {}) as {}",
        payload.resolved_address, payload.latitude, payload.longitude, id
    );
    tally.record(RowOutcome::Inserted);
    Ok(id)
}

/// Insert every station whose abbreviation is not stored yet. Existing
/// stations are never updated.
pub fn upsert_stations<S: WeatherStore + ?Sized>(
    store: &mut S,
    stations: &BTreeMap<String, Value>,
    tally: &mut TableTally,
) -> Result<(), IngestError> {
    for (name_abbr, raw) in stations {
        let outcome = isolated(store, |s| {
            let record: StationRecord = vc::decode(raw)?;
            if s.find_station(name_abbr)?.is_some() {
                return Ok(RowOutcome::Skipped);
            }
            s.insert_station(&new_station(name_abbr, record))?;
            Ok(RowOutcome::Inserted)
        })?;
        match outcome {
            Ok(o) => tally.record(o),
            Err(e) => {
                warn!("Refs: station {} not stored: {}", name_abbr, e);
                tally.failed += 1;
            }
        }
    }
    Ok(())
}

fn new_station(name_abbr: &str, record: StationRecord) -> dbm::NewStation {
    dbm::NewStation {
        distance: record.distance,
        latitude: record.latitude,
        longitude: record.longitude,
        use_count: record.use_count,
        name: record.name,
        name_abbr: name_abbr.to_string(),
        quality: record.quality,
        contribution: record.contribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use serde_json::json;

    fn payload(description: &str) -> WeatherPayload {
        WeatherPayload::from_value(&json!({
            "latitude": 43.59,
            "longitude": -79.64,
            "timezone": "America/Toronto",
            "resolvedAddress": "Mississauga, ON, Canada",
            "address": "Mississauga,CA",
            "description": description,
            "days": []
        }))
        .unwrap()
    }

    #[test]
    fn existing_location_is_reused_without_changes() {
        let mut store = MemoryStore::default();
        let mut tally = TableTally::default();

        let first = resolve_location(&mut store, &payload("first"), &mut tally).unwrap();
        let second = resolve_location(&mut store, &payload("changed"), &mut tally).unwrap();

        assert_eq!(first, second);
        assert_eq!(tally, TableTally { inserted: 1, skipped: 1, failed: 0 });
        assert_eq!(store.locations.len(), 1);
        assert_eq!(store.locations[0].1.description.as_deref(), Some("first"));
    }

    #[test]
    fn stations_are_keyed_by_abbreviation_and_never_updated() {
        let mut store = MemoryStore::default();
        let mut tally = TableTally::default();

        let mut stations = BTreeMap::new();
        stations.insert("CYYZ".to_string(), json!({"name": "Toronto Pearson", "quality": 50}));
        upsert_stations(&mut store, &stations, &mut tally).unwrap();

        stations.insert("CYYZ".to_string(), json!({"name": "Toronto Pearson", "quality": 99}));
        stations.insert("CYTZ".to_string(), json!({"name": "Billy Bishop"}));
        upsert_stations(&mut store, &stations, &mut tally).unwrap();

        assert_eq!(tally, TableTally { inserted: 2, skipped: 1, failed: 0 });
        let cyyz = store.stations.iter().find(|(_, s)| s.name_abbr == "CYYZ").unwrap();
        assert_eq!(cyyz.1.quality, Some(50));
    }

    #[test]
    fn undecodable_station_does_not_stop_the_others() {
        let mut store = MemoryStore::default();
        let mut tally = TableTally::default();

        let mut stations = BTreeMap::new();
        stations.insert("BAD".to_string(), json!({"useCount": "many"}));
        stations.insert("CYYZ".to_string(), json!({"useCount": 3}));
        upsert_stations(&mut store, &stations, &mut tally).unwrap();

        assert_eq!(tally, TableTally { inserted: 1, skipped: 0, failed: 1 });
        assert_eq!(store.stations.len(), 1);
        assert_eq!(store.depth(), 0);
    }
}
