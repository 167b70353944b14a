//! Diesel table declarations shared by every backend.
//!
//! The migrations under `migrations/<backend>/` create the actual tables.
//! Only types that all three backends understand are used here.

diesel::table! {
    locations (id) {
        id -> BigInt,
        timezone -> Nullable<Text>,
        latitude -> Double,
        longitude -> Double,
        resolved_addr -> Nullable<Text>,
        address -> Nullable<Text>,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    stations (id) {
        id -> BigInt,
        distance -> Nullable<Double>,
        latitude -> Nullable<Double>,
        longitude -> Nullable<Double>,
        use_count -> Nullable<BigInt>,
        name -> Nullable<Text>,
        name_abbr -> Text,
        quality -> Nullable<BigInt>,
        contribution -> Nullable<Double>,
    }
}

diesel::table! {
    weather_details (id) {
        id -> BigInt,
        location_id -> BigInt,
        date -> Text,
        datetime_epoch -> BigInt,
        datetime -> Text,
        #[sql_name = "type"]
        detail_type -> Text,
        tempmax -> Nullable<Double>,
        tempmin -> Nullable<Double>,
        temp -> Nullable<Double>,
        feelslikemax -> Nullable<Double>,
        feelslikemin -> Nullable<Double>,
        feelslike -> Nullable<Double>,
        dew -> Nullable<Double>,
        humidity -> Nullable<Double>,
        precip -> Nullable<Double>,
        precipprob -> Nullable<Double>,
        precipcover -> Nullable<Double>,
        preciptype -> Nullable<Text>,
        snow -> Nullable<Double>,
        snowdepth -> Nullable<Double>,
        windgust -> Nullable<Double>,
        windspeed -> Nullable<Double>,
        winddir -> Nullable<Double>,
        pressure -> Nullable<Double>,
        cloudcover -> Nullable<Double>,
        visibility -> Nullable<Double>,
        solarradiation -> Nullable<Double>,
        solarenergy -> Nullable<Double>,
        uvindex -> Nullable<Double>,
        severerisk -> Nullable<Double>,
        sunrise -> Nullable<Text>,
        sunrise_epoch -> Nullable<BigInt>,
        sunset -> Nullable<Text>,
        sunset_epoch -> Nullable<BigInt>,
        moonphase -> Nullable<Double>,
        conditions -> Nullable<Text>,
        description -> Nullable<Text>,
        icon -> Nullable<Text>,
        stations -> Nullable<Text>,
        source -> Nullable<Text>,
    }
}

diesel::joinable!(weather_details -> locations (location_id));

diesel::allow_tables_to_appear_in_same_query!(locations, stations, weather_details,);
