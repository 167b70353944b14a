pub mod models {
    pub mod visualcrossing;
}

pub mod client;
pub mod config;
pub mod db {
    pub mod connection;
    #[cfg(test)]
    pub mod memory;
    pub mod models;
    pub mod store;
}
pub mod schema;
pub mod utils;
pub mod services {
    pub mod details;
    pub mod ingest;
    pub mod refs;
}
