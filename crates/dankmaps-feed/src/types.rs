//! Wire shapes returned by the `/api/clients` endpoints.
//!
//! The backend stores records in a document database, so responses may carry
//! extra keys (`_id`, `__v`) and loosely typed values. These types accept that
//! shape; [`crate::normalize`] turns them into [`dankmaps_core::StoreRecord`].

use dankmaps_core::update::deserialize_coordinate;
use serde::Deserialize;

/// One store as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireStoreRecord {
    #[serde(deserialize_with = "dankmaps_core::update::deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub longitude: f64,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_document_store_extras_and_string_coordinates() {
        let json = serde_json::json!({
            "_id": "665f1c",
            "__v": 0,
            "id": 12,
            "title": "Canapax Randburg",
            "latitude": "-26.0328",
            "longitude": 27.9515,
            "categories": ["THC"]
        });
        let wire: WireStoreRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(wire.id, "12");
        assert!((wire.latitude - (-26.0328)).abs() < 1e-9);
        assert!(wire.logo.is_none());
    }

    #[test]
    fn rejects_non_numeric_coordinate() {
        let json = serde_json::json!({
            "id": "1",
            "title": "Bad",
            "latitude": "north",
            "longitude": 28.0
        });
        assert!(serde_json::from_value::<WireStoreRecord>(json).is_err());
    }
}
