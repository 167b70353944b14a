//! Session seam between the ingestion pipeline and a database connection.
//!
//! The pipeline only needs natural-key lookups, single-row inserts and
//! nestable transaction boundaries. Every diesel connection type gets the
//! same implementation through `impl_weather_store!`, so the queries are
//! type-checked once per backend.

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::prelude::*;
use diesel::result::QueryResult;

use crate::db::models::{DetailKey, DetailType, NewLocation, NewStation, NewWeatherDetail};
use crate::schema;

/// Row counts per table (detail rows split by type).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub locations: i64,
    pub stations: i64,
    pub day_details: i64,
    pub hour_details: i64,
}

/// One open database session.
///
/// `begin` nests: the first level opens a transaction, deeper levels open
/// savepoints. `commit`/`rollback` close the innermost level.
pub trait WeatherStore {
    fn backend_name(&self) -> &'static str;

    fn begin(&mut self) -> QueryResult<()>;
    fn commit(&mut self) -> QueryResult<()>;
    fn rollback(&mut self) -> QueryResult<()>;

    fn find_location(&mut self, latitude: f64, longitude: f64) -> QueryResult<Option<i64>>;
    fn insert_location(&mut self, row: &NewLocation) -> QueryResult<()>;

    fn find_station(&mut self, name_abbr: &str) -> QueryResult<Option<i64>>;
    fn insert_station(&mut self, row: &NewStation) -> QueryResult<()>;

    fn find_weather_detail(&mut self, key: &DetailKey) -> QueryResult<Option<i64>>;
    fn insert_weather_detail(&mut self, row: &NewWeatherDetail) -> QueryResult<()>;

    fn row_counts(&mut self) -> QueryResult<RowCounts>;
}

macro_rules! impl_weather_store {
    ($conn:ty, $name:literal) => {
        impl WeatherStore for $conn {
            fn backend_name(&self) -> &'static str {
                $name
            }

            fn begin(&mut self) -> QueryResult<()> {
                <AnsiTransactionManager as TransactionManager<$conn>>::begin_transaction(self)
            }

            fn commit(&mut self) -> QueryResult<()> {
                <AnsiTransactionManager as TransactionManager<$conn>>::commit_transaction(self)
            }

            fn rollback(&mut self) -> QueryResult<()> {
                <AnsiTransactionManager as TransactionManager<$conn>>::rollback_transaction(self)
            }

            fn find_location(&mut self, latitude: f64, longitude: f64) -> QueryResult<Option<i64>> {
                use schema::locations::dsl as L;

                L::locations
                    .filter(L::latitude.eq(latitude).and(L::longitude.eq(longitude)))
                    .select(L::id)
                    .first::<i64>(self)
                    .optional()
            }

            fn insert_location(&mut self, row: &NewLocation) -> QueryResult<()> {
                use schema::locations::dsl as L;

                diesel::insert_into(L::locations).values(row).execute(self).map(|_| ())
            }

            fn find_station(&mut self, name_abbr: &str) -> QueryResult<Option<i64>> {
                use schema::stations::dsl as S;

                S::stations
                    .filter(S::name_abbr.eq(name_abbr))
                    .select(S::id)
                    .first::<i64>(self)
                    .optional()
            }

            fn insert_station(&mut self, row: &NewStation) -> QueryResult<()> {
                use schema::stations::dsl as S;

                diesel::insert_into(S::stations).values(row).execute(self).map(|_| ())
            }

            fn find_weather_detail(&mut self, key: &DetailKey) -> QueryResult<Option<i64>> {
                use schema::weather_details::dsl as W;

                W::weather_details
                    .filter(W::date.eq(&key.date))
                    .filter(W::datetime_epoch.eq(key.datetime_epoch))
                    .filter(W::datetime.eq(&key.datetime))
                    .filter(W::detail_type.eq(key.detail_type.as_str()))
                    .filter(W::location_id.eq(key.location_id))
                    .select(W::id)
                    .first::<i64>(self)
                    .optional()
            }

            fn insert_weather_detail(&mut self, row: &NewWeatherDetail) -> QueryResult<()> {
                use schema::weather_details::dsl as W;

                diesel::insert_into(W::weather_details).values(row).execute(self).map(|_| ())
            }

            fn row_counts(&mut self) -> QueryResult<RowCounts> {
                use schema::locations::dsl as L;
                use schema::stations::dsl as S;
                use schema::weather_details::dsl as W;

                Ok(RowCounts {
                    locations: L::locations.count().get_result(self)?,
                    stations: S::stations.count().get_result(self)?,
                    day_details: W::weather_details
                        .filter(W::detail_type.eq(DetailType::Day.as_str()))
                        .count()
                        .get_result(self)?,
                    hour_details: W::weather_details
                        .filter(W::detail_type.eq(DetailType::Hour.as_str()))
                        .count()
                        .get_result(self)?,
                })
            }
        }
    };
}

#[cfg(feature = "postgres")]
impl_weather_store!(diesel::PgConnection, "postgres");

#[cfg(feature = "mysql")]
impl_weather_store!(diesel::MysqlConnection, "mysql");

#[cfg(feature = "sqlite")]
impl_weather_store!(diesel::SqliteConnection, "sqlite");
