use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::{dedup_categories, StoreRecord};
use crate::ConfigError;

/// Top-level shape of the seed file: `stores: [...]`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoresFile {
    pub stores: Vec<StoreRecord>,
}

/// Load and validate store seed data from a YAML file.
///
/// Categories are de-duplicated on load.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_stores(&content)
}

/// Parse and validate seed YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_stores(content: &str) -> Result<StoresFile, ConfigError> {
    let mut stores_file: StoresFile =
        serde_yaml::from_str(content).map_err(ConfigError::SeedFileParse)?;

    for store in &mut stores_file.stores {
        store.categories = dedup_categories(&store.categories);
    }

    validate_stores(&stores_file.stores)?;

    Ok(stores_file)
}

/// Checks the invariants every stored record must hold.
///
/// # Errors
///
/// Returns `ConfigError::Validation` naming the first offending record.
pub fn validate_store(store: &StoreRecord) -> Result<(), ConfigError> {
    if store.id.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "store '{}' has an empty id",
            store.title
        )));
    }

    if store.title.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "store '{}' has an empty title",
            store.id
        )));
    }

    if !store.location().is_valid() {
        return Err(ConfigError::Validation(format!(
            "store '{}' has out-of-range coordinates {},{}",
            store.id, store.latitude, store.longitude
        )));
    }

    Ok(())
}

fn validate_stores(stores: &[StoreRecord]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for store in stores {
        validate_store(store)?;

        if !seen_ids.insert(store.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store id: '{}'",
                store.id
            )));
        }
    }

    Ok(())
}
