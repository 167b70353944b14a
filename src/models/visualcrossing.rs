//! Models for the Visual Crossing timeline payload.
//!
//! Only the root is decoded strictly. Days, hours and stations stay as raw
//! JSON until the pipeline decodes them one at a time, so a single broken
//! record is reported against itself instead of rejecting the document.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Decode error carrying the JSON path of the offending value.
pub type DecodeError = serde_path_to_error::Error<serde_json::Error>;

/// One timeline document for a location and date range.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub resolved_address: String,
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Station attributes keyed by the station's abbreviated name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stations: BTreeMap<String, Value>,
    pub days: Vec<Value>,
}

impl WeatherPayload {
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        decode(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub distance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub use_count: Option<i64>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub quality: Option<i64>,
    pub contribution: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    /// Calendar date, `YYYY-MM-DD`.
    pub datetime: Option<String>,
    pub datetime_epoch: Option<i64>,
    pub tempmax: Option<f64>,
    pub tempmin: Option<f64>,
    pub temp: Option<f64>,
    pub feelslikemax: Option<f64>,
    pub feelslikemin: Option<f64>,
    pub feelslike: Option<f64>,
    pub dew: Option<f64>,
    pub humidity: Option<f64>,
    pub precip: Option<f64>,
    pub precipprob: Option<f64>,
    pub precipcover: Option<f64>,
    pub preciptype: Option<Vec<String>>,
    pub snow: Option<f64>,
    pub snowdepth: Option<f64>,
    pub windgust: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddir: Option<f64>,
    pub pressure: Option<f64>,
    pub cloudcover: Option<f64>,
    pub visibility: Option<f64>,
    pub solarradiation: Option<f64>,
    pub solarenergy: Option<f64>,
    pub uvindex: Option<f64>,
    pub severerisk: Option<f64>,
    /// Time of day, `HH:MM:SS`.
    pub sunrise: Option<String>,
    pub sunrise_epoch: Option<i64>,
    pub sunset: Option<String>,
    pub sunset_epoch: Option<i64>,
    pub moonphase: Option<f64>,
    pub conditions: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub stations: Option<Vec<String>>,
    pub source: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hours: Vec<Value>,
}

/// Hourly record. Daily aggregates (min/max, sun times, moon phase) are not
/// repeated here; the loader copies them from the parent day.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourRecord {
    /// Time of day, `HH:MM:SS`.
    pub datetime: Option<String>,
    pub datetime_epoch: Option<i64>,
    pub temp: Option<f64>,
    pub feelslike: Option<f64>,
    pub humidity: Option<f64>,
    pub dew: Option<f64>,
    pub precip: Option<f64>,
    pub precipprob: Option<f64>,
    pub snow: Option<f64>,
    pub snowdepth: Option<f64>,
    pub preciptype: Option<Vec<String>>,
    pub windgust: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddir: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub cloudcover: Option<f64>,
    pub solarradiation: Option<f64>,
    pub solarenergy: Option<f64>,
    pub uvindex: Option<f64>,
    pub severerisk: Option<f64>,
    pub conditions: Option<String>,
    pub icon: Option<String>,
    pub stations: Option<Vec<String>>,
    pub source: Option<String>,
}

/// Decode one record from a borrowed JSON value.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, DecodeError> {
    serde_path_to_error::deserialize(value)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
