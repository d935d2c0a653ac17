pub mod app_config;
pub mod config;
pub mod controller;
pub mod favorites;
pub mod geo;
pub mod location;
pub mod province;
pub mod search;
pub mod seed;
pub mod store;
pub mod update;
pub mod viewport;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use controller::{MapController, RecenterIntent, SelectionError};
pub use favorites::Favorites;
pub use geo::{GeoPoint, Region};
pub use location::{DeniedLocation, FixedLocation, LocationError, LocationProvider};
pub use province::Province;
pub use search::{filter_stores, search_by_title};
pub use seed::{load_stores, StoresFile};
pub use store::{Logo, Platform, StoreRecord, StoreStatus};
pub use update::{apply_update, PatchOutcome, StoreUpdate, UnknownUpdatePolicy};
pub use viewport::{fit_region, fit_region_with};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read store seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store seed file: {0}")]
    SeedFileParse(#[source] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
