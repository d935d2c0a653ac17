//! Normalization from wire records to [`dankmaps_core::StoreRecord`].
//!
//! The logo reference is classified once here so views never branch on the
//! raw string again.

use dankmaps_core::store::{dedup_categories, Logo, StoreRecord, StoreStatus};

use crate::types::WireStoreRecord;

/// Converts one wire record. Returns `None` for records that cannot be placed
/// on the map (blank title, non-finite or out-of-range coordinates).
#[must_use]
pub fn normalize_record(wire: WireStoreRecord) -> Option<StoreRecord> {
    let title = wire.title.trim().to_owned();
    if title.is_empty() {
        tracing::warn!(store_id = %wire.id, "skipping store with empty title");
        return None;
    }

    let record = StoreRecord {
        id: wire.id,
        title,
        description: wire.description.filter(|d| !d.trim().is_empty()),
        logo: Logo::classify(wire.logo.as_deref()),
        categories: dedup_categories(wire.categories.unwrap_or_default()),
        latitude: wire.latitude,
        longitude: wire.longitude,
        website: wire.website.filter(|w| !w.trim().is_empty()),
        status: wire.status.as_deref().and_then(StoreStatus::parse),
    };

    if !record.location().is_valid() {
        tracing::warn!(
            store_id = %record.id,
            latitude = record.latitude,
            longitude = record.longitude,
            "skipping store with invalid coordinates"
        );
        return None;
    }

    Some(record)
}

/// Converts a raw JSON array, skipping entries that fail to deserialize or
/// normalize instead of failing the whole feed.
#[must_use]
pub fn normalize_records(raw: Vec<serde_json::Value>) -> Vec<StoreRecord> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<WireStoreRecord>(value) {
            Ok(wire) => normalize_record(wire),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed store record");
                None
            }
        })
        .collect()
}
