use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The `{ id: bool }` favorites map kept in device-local storage.
///
/// Serializes transparently as a JSON object so the stored format stays a
/// plain key-value map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(BTreeMap<String, bool>);

impl Favorites {
    /// Flips the flag for `id` and returns the new value.
    pub fn toggle(&mut self, id: &str) -> bool {
        let entry = self.0.entry(id.to_owned()).or_insert(false);
        *entry = !*entry;
        *entry
    }

    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.0.get(id).copied().unwrap_or(false)
    }

    /// Ids currently flagged as favorites, in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, &on)| on)
            .map(|(id, _)| id.as_str())
    }
}
