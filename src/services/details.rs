use log::{debug, warn};
use serde_json::Value;

use crate::db::models::{DetailKey, DetailType, NewWeatherDetail};
use crate::db::store::WeatherStore;
use crate::models::visualcrossing::{self as vc, DayRecord, HourRecord};
use crate::services::ingest::{isolated, IngestError, RowError, RowOutcome, TableTally};
use crate::utils::{date_time, join_list};

/// A composed `weather_details` row and the natural key it is checked under.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub key: DetailKey,
    pub values: NewWeatherDetail,
}

/// Upsert one DAY row per day record and one HOUR row per nested hour record,
/// in payload order. Each row is isolated: a broken or rejected row is
/// counted as failed and the rest of the payload continues.
pub fn upsert_weather_details<S: WeatherStore + ?Sized>(
    store: &mut S,
    days: &[Value],
    location_id: i64,
    day_tally: &mut TableTally,
    hour_tally: &mut TableTally,
) -> Result<(), IngestError> {
    for (index, raw_day) in days.iter().enumerate() {
        let day: DayRecord = match vc::decode(raw_day) {
            Ok(d) => d,
            Err(e) => {
                let lost_hours = raw_day.get("hours").and_then(Value::as_array).map_or(0, Vec::len);
                warn!(
                    "Details: day #{} dropped with {} hour(s): {}",
                    index,
                    lost_hours,
                    RowError::from(e)
                );
                day_tally.failed += 1;
                hour_tally.failed += lost_hours;
                continue;
            }
        };
        let Some(date) = day.datetime.as_deref() else {
            warn!("Details: day #{} dropped with {} hour(s): missing datetime", index, day.hours.len());
            day_tally.failed += 1;
            hour_tally.failed += day.hours.len();
            continue;
        };

        // A failed day row does not stop its hours.
        let day_result = match day_row(location_id, date, &day) {
            Ok(row) => isolated(store, |s| upsert_detail(s, &row))?,
            Err(e) => Err(e),
        };
        record(day_tally, date, day_result);

        for (h, raw_hour) in day.hours.iter().enumerate() {
            let built = vc::decode::<HourRecord>(raw_hour)
                .map_err(RowError::from)
                .and_then(|hour| hour_row(location_id, date, &day, &hour));
            let label = format!("{} hour #{}", date, h);
            let hour_result = match built {
                Ok(row) => isolated(store, |s| upsert_detail(s, &row))?,
                Err(e) => Err(e),
            };
            record(hour_tally, &label, hour_result);
        }
    }
    Ok(())
}

/// Existence check on the natural key, insert when absent.
pub fn upsert_detail<S: WeatherStore + ?Sized>(store: &mut S, row: &DetailRow) -> Result<RowOutcome, RowError> {
    if store.find_weather_detail(&row.key)?.is_some() {
        return Ok(RowOutcome::Skipped);
    }
    store.insert_weather_detail(&row.values)?;
    Ok(RowOutcome::Inserted)
}

fn record(tally: &mut TableTally, label: &str, result: Result<RowOutcome, RowError>) {
    match result {
        Ok(outcome) => {
            debug!("Details: {} {:?}", label, outcome);
            tally.record(outcome);
        }
        Err(e) => {
            warn!("Details: {} not stored: {}", label, e);
            tally.failed += 1;
        }
    }
}

/// DAY row: `date` and `datetime` are both the day's date.
pub fn day_row(location_id: i64, date: &str, day: &DayRecord) -> Result<DetailRow, RowError> {
    let datetime_epoch = day.datetime_epoch.ok_or(RowError::Missing("datetimeEpoch"))?;
    let key = DetailKey {
        location_id,
        date: date.to_string(),
        datetime_epoch,
        datetime: date.to_string(),
        detail_type: DetailType::Day,
    };
    let values = NewWeatherDetail {
        location_id,
        date: key.date.clone(),
        datetime_epoch,
        datetime: key.datetime.clone(),
        detail_type: DetailType::Day.as_str().to_string(),
        tempmax: day.tempmax,
        tempmin: day.tempmin,
        temp: day.temp,
        feelslikemax: day.feelslikemax,
        feelslikemin: day.feelslikemin,
        feelslike: day.feelslike,
        dew: day.dew,
        humidity: day.humidity,
        precip: day.precip,
        precipprob: day.precipprob,
        precipcover: day.precipcover,
        preciptype: join_list(day.preciptype.as_deref()),
        snow: day.snow,
        snowdepth: day.snowdepth,
        windgust: day.windgust,
        windspeed: day.windspeed,
        winddir: day.winddir,
        pressure: day.pressure,
        cloudcover: day.cloudcover,
        visibility: day.visibility,
        solarradiation: day.solarradiation,
        solarenergy: day.solarenergy,
        uvindex: day.uvindex,
        severerisk: day.severerisk,
        sunrise: day.sunrise.as_deref().map(|t| date_time(date, t)),
        sunrise_epoch: day.sunrise_epoch,
        sunset: day.sunset.as_deref().map(|t| date_time(date, t)),
        sunset_epoch: day.sunset_epoch,
        moonphase: day.moonphase,
        conditions: day.conditions.clone(),
        description: day.description.clone(),
        icon: day.icon.clone(),
        stations: join_list(day.stations.as_deref()),
        source: day.source.clone(),
    };
    Ok(DetailRow { key, values })
}

/// HOUR row: `datetime` is `date + ' ' + hour time`. The daily aggregates the
/// hourly record lacks come from the parent day; `description` stays NULL.
pub fn hour_row(location_id: i64, date: &str, day: &DayRecord, hour: &HourRecord) -> Result<DetailRow, RowError> {
    let time = hour.datetime.as_deref().ok_or(RowError::Missing("hour datetime"))?;
    let datetime_epoch = hour.datetime_epoch.ok_or(RowError::Missing("hour datetimeEpoch"))?;
    let key = DetailKey {
        location_id,
        date: date.to_string(),
        datetime_epoch,
        datetime: date_time(date, time),
        detail_type: DetailType::Hour,
    };
    let values = NewWeatherDetail {
        location_id,
        date: key.date.clone(),
        datetime_epoch,
        datetime: key.datetime.clone(),
        detail_type: DetailType::Hour.as_str().to_string(),
        tempmax: day.tempmax,
        tempmin: day.tempmin,
        temp: hour.temp,
        feelslikemax: day.feelslikemax,
        feelslikemin: day.feelslikemin,
        feelslike: hour.feelslike,
        dew: hour.dew,
        humidity: hour.humidity,
        precip: hour.precip,
        precipprob: hour.precipprob,
        precipcover: day.precipcover,
        preciptype: join_list(hour.preciptype.as_deref()),
        snow: hour.snow,
        snowdepth: hour.snowdepth,
        windgust: hour.windgust,
        windspeed: hour.windspeed,
        winddir: hour.winddir,
        pressure: hour.pressure,
        cloudcover: hour.cloudcover,
        visibility: hour.visibility,
        solarradiation: hour.solarradiation,
        solarenergy: hour.solarenergy,
        uvindex: hour.uvindex,
        severerisk: hour.severerisk,
        sunrise: day.sunrise.as_deref().map(|t| date_time(date, t)),
        sunrise_epoch: day.sunrise_epoch,
        sunset: day.sunset.as_deref().map(|t| date_time(date, t)),
        sunset_epoch: day.sunset_epoch,
        moonphase: day.moonphase,
        conditions: hour.conditions.clone(),
        description: None,
        icon: hour.icon.clone(),
        stations: join_list(hour.stations.as_deref()),
        source: hour.source.clone(),
    };
    Ok(DetailRow { key, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use serde_json::json;

    fn run(store: &mut MemoryStore, days: Value) -> (TableTally, TableTally) {
        let days = days.as_array().cloned().unwrap();
        let (mut d, mut h) = (TableTally::default(), TableTally::default());
        upsert_weather_details(store, &days, 7, &mut d, &mut h).unwrap();
        (d, h)
    }

    fn find<'a>(store: &'a MemoryStore, datetime: &str) -> &'a NewWeatherDetail {
        store
            .details
            .iter()
            .find(|d| d.datetime == datetime)
            .unwrap_or_else(|| panic!("no row for {}", datetime))
    }

    #[test]
    fn single_day_with_one_hour() {
        let mut store = MemoryStore::default();
        let (d, h) = run(
            &mut store,
            json!([{
                "datetime": "2023-11-14",
                "datetimeEpoch": 1699930800,
                "tempmax": 10,
                "tempmin": 2,
                "hours": [{"datetime": "00:00:00", "datetimeEpoch": 1699930800}]
            }]),
        );
        assert_eq!((d.inserted, h.inserted), (1, 1));

        let day = find(&store, "2023-11-14");
        assert_eq!(day.detail_type, "DAY");
        assert_eq!(day.date, "2023-11-14");

        let hour = find(&store, "2023-11-14 00:00:00");
        assert_eq!(hour.detail_type, "HOUR");
        assert_eq!(hour.date, "2023-11-14");
        assert_eq!(hour.tempmax, Some(10.0));
        assert_eq!(hour.location_id, 7);
    }

    #[test]
    fn hours_inherit_daily_aggregates() {
        let mut store = MemoryStore::default();
        run(
            &mut store,
            json!([{
                "datetime": "2023-11-14",
                "datetimeEpoch": 1699938000,
                "tempmax": 10.5, "tempmin": 2.1,
                "feelslikemax": 9.0, "feelslikemin": -1.5,
                "precipcover": 8.33,
                "sunrise": "07:03:54", "sunriseEpoch": 1699963434,
                "sunset": "16:51:19", "sunsetEpoch": 1699998679,
                "moonphase": 0.05,
                "description": "Partly cloudy throughout the day.",
                "hours": [
                    {"datetime": "13:00:00", "datetimeEpoch": 1699984800, "temp": 8.8, "tempmax": 99}
                ]
            }]),
        );

        let day = find(&store, "2023-11-14").clone();
        let hour = find(&store, "2023-11-14 13:00:00");
        assert_eq!(hour.tempmax, day.tempmax);
        assert_eq!(hour.tempmin, day.tempmin);
        assert_eq!(hour.feelslikemax, day.feelslikemax);
        assert_eq!(hour.feelslikemin, day.feelslikemin);
        assert_eq!(hour.precipcover, day.precipcover);
        assert_eq!(hour.sunrise.as_deref(), Some("2023-11-14 07:03:54"));
        assert_eq!(hour.sunrise, day.sunrise);
        assert_eq!(hour.sunrise_epoch, Some(1699963434));
        assert_eq!(hour.sunset, day.sunset);
        assert_eq!(hour.sunset_epoch, day.sunset_epoch);
        assert_eq!(hour.moonphase, day.moonphase);
        assert_eq!(hour.temp, Some(8.8));
        assert_eq!(hour.description, None);
        assert_eq!(day.description.as_deref(), Some("Partly cloudy throughout the day."));
    }

    #[test]
    fn list_fields_are_comma_joined_or_null() {
        let mut store = MemoryStore::default();
        run(
            &mut store,
            json!([{
                "datetime": "2023-11-14",
                "datetimeEpoch": 1699938000,
                "preciptype": ["rain", "snow"],
                "stations": ["CYYZ", "CYTZ", "71508099999"],
                "hours": [
                    {"datetime": "00:00:00", "datetimeEpoch": 1699938000, "preciptype": [], "stations": null}
                ]
            }]),
        );
        let day = find(&store, "2023-11-14");
        assert_eq!(day.preciptype.as_deref(), Some("rain,snow"));
        assert_eq!(day.stations.as_deref(), Some("CYYZ,CYTZ,71508099999"));

        let hour = find(&store, "2023-11-14 00:00:00");
        assert_eq!(hour.preciptype, None);
        assert_eq!(hour.stations, None);
    }

    #[test]
    fn day_missing_epoch_fails_alone() {
        let mut store = MemoryStore::default();
        let (d, h) = run(
            &mut store,
            json!([
                {
                    "datetime": "2023-11-14",
                    "hours": [{"datetime": "00:00:00", "datetimeEpoch": 1699938000}]
                },
                {
                    "datetime": "2023-11-15",
                    "datetimeEpoch": 1700024400,
                    "hours": [{"datetime": "00:00:00", "datetimeEpoch": 1700024400}]
                }
            ]),
        );
        assert_eq!(d, TableTally { inserted: 1, skipped: 0, failed: 1 });
        assert_eq!(h, TableTally { inserted: 2, skipped: 0, failed: 0 });
        assert!(store.details.iter().all(|r| r.datetime != "2023-11-14"));
        find(&store, "2023-11-14 00:00:00");
        find(&store, "2023-11-15");
    }

    #[test]
    fn undecodable_day_drops_its_hours_but_not_its_siblings() {
        let mut store = MemoryStore::default();
        let (d, h) = run(
            &mut store,
            json!([
                {"datetime": "2023-11-14", "datetimeEpoch": "soon", "hours": [{}, {}]},
                {"datetimeEpoch": 1700024400, "hours": [{"datetime": "00:00:00", "datetimeEpoch": 1700024400}]},
                {"datetime": "2023-11-16", "datetimeEpoch": 1700110800, "hours": []}
            ]),
        );
        assert_eq!(d, TableTally { inserted: 1, skipped: 0, failed: 2 });
        assert_eq!(h, TableTally { inserted: 0, skipped: 0, failed: 3 });
        find(&store, "2023-11-16");
    }

    #[test]
    fn broken_hour_fails_alone() {
        let mut store = MemoryStore::default();
        let (d, h) = run(
            &mut store,
            json!([{
                "datetime": "2023-11-14",
                "datetimeEpoch": 1699938000,
                "hours": [
                    {"datetime": "00:00:00"},
                    {"datetime": "01:00:00", "datetimeEpoch": 1699941600, "temp": "cold"},
                    {"datetime": "02:00:00", "datetimeEpoch": 1699945200}
                ]
            }]),
        );
        assert_eq!(d.inserted, 1);
        assert_eq!(h, TableTally { inserted: 1, skipped: 0, failed: 2 });
        find(&store, "2023-11-14 02:00:00");
    }

    #[test]
    fn rows_are_skipped_on_reingestion_per_location() {
        let days = json!([{
            "datetime": "2023-11-14",
            "datetimeEpoch": 1699938000,
            "hours": [{"datetime": "00:00:00", "datetimeEpoch": 1699938000}]
        }]);
        let days = days.as_array().cloned().unwrap();
        let mut store = MemoryStore::default();
        let (mut d, mut h) = (TableTally::default(), TableTally::default());

        upsert_weather_details(&mut store, &days, 1, &mut d, &mut h).unwrap();
        upsert_weather_details(&mut store, &days, 1, &mut d, &mut h).unwrap();
        assert_eq!((d.inserted, d.skipped, h.inserted, h.skipped), (1, 1, 1, 1));

        // same day at another location is a different natural key
        upsert_weather_details(&mut store, &days, 2, &mut d, &mut h).unwrap();
        assert_eq!(store.details.len(), 4);
    }
}
