//! Diesel model structs for the three weather tables.
//!
//! `New*` structs are written by the ingestion pipeline. `None` is inserted as
//! an explicit NULL so the same insert works on every backend.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema;

/// Values stored in `weather_details.type`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetailType {
    Day,
    Hour,
}

impl DetailType {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailType::Day => "DAY",
            DetailType::Hour => "HOUR",
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::locations)]
pub struct Location {
    pub id: i64,
    pub timezone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_addr: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::locations)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewLocation {
    pub timezone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_addr: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::stations)]
pub struct Station {
    pub id: i64,
    pub distance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub use_count: Option<i64>,
    pub name: Option<String>,
    pub name_abbr: String,
    pub quality: Option<i64>,
    pub contribution: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::stations)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewStation {
    pub distance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub use_count: Option<i64>,
    pub name: Option<String>,
    pub name_abbr: String,
    pub quality: Option<i64>,
    pub contribution: Option<f64>,
}

/// Natural key of a `weather_details` row. The loader checks it before every
/// insert; no unique constraint backs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetailKey {
    pub location_id: i64,
    pub date: String,
    pub datetime_epoch: i64,
    pub datetime: String,
    pub detail_type: DetailType,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::weather_details)]
#[diesel(belongs_to(Location))]
pub struct WeatherDetail {
    pub id: i64,
    pub location_id: i64,
    pub date: String,
    pub datetime_epoch: i64,
    pub datetime: String,
    pub detail_type: String,
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
    pub preciptype: Option<String>,
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
    pub sunrise: Option<String>,
    pub sunrise_epoch: Option<i64>,
    pub sunset: Option<String>,
    pub sunset_epoch: Option<i64>,
    pub moonphase: Option<f64>,
    pub conditions: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub stations: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::weather_details)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewWeatherDetail {
    pub location_id: i64,
    pub date: String,
    pub datetime_epoch: i64,
    pub datetime: String,
    pub detail_type: String,
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
    pub preciptype: Option<String>,
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
    pub sunrise: Option<String>,
    pub sunrise_epoch: Option<i64>,
    pub sunset: Option<String>,
    pub sunset_epoch: Option<i64>,
    pub moonphase: Option<f64>,
    pub conditions: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub stations: Option<String>,
    pub source: Option<String>,
}

