//! Real-time `storeDetailsUpdated` patches applied to a loaded store list.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::seed::validate_store;
use crate::store::{dedup_categories, Logo, StoreRecord, StoreStatus};
use crate::ConfigError;

/// Name of the push event carrying store changes.
pub const STORE_UPDATED_EVENT: &str = "storeDetailsUpdated";

/// A change pushed for one store: the `id` plus any subset of its fields.
///
/// A full record is a valid update; fields left out keep their current value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StoreUpdate {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<Logo>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_coordinate")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl StoreUpdate {
    /// Overwrites the fields present in this update. The record's `id` is
    /// never changed.
    ///
    /// No validation happens here; [`apply_update`] checks the merged result
    /// before committing it.
    pub fn merge_into(&self, record: &mut StoreRecord) {
        if let Some(title) = &self.title {
            title.trim().clone_into(&mut record.title);
        }
        if let Some(description) = &self.description {
            record.description = Some(description.clone());
        }
        if let Some(logo) = &self.logo {
            record.logo = logo.clone();
        }
        if let Some(categories) = &self.categories {
            record.categories = dedup_categories(categories);
        }
        if let Some(latitude) = self.latitude {
            record.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            record.longitude = longitude;
        }
        if let Some(website) = &self.website {
            record.website = Some(website.clone());
        }
        if let Some(status) = &self.status {
            record.status = StoreStatus::parse(status);
        }
    }

    /// Builds a new record from this update when it carries the fields a
    /// record cannot exist without (`title`, `latitude`, `longitude`).
    #[must_use]
    pub fn to_record(&self) -> Option<StoreRecord> {
        let mut record = StoreRecord {
            id: self.id.clone(),
            title: self.title.clone()?,
            description: None,
            logo: Logo::None,
            categories: Vec::new(),
            latitude: self.latitude?,
            longitude: self.longitude?,
            website: None,
            status: None,
        };
        self.merge_into(&mut record);
        Some(record)
    }
}

impl From<&StoreRecord> for StoreUpdate {
    fn from(record: &StoreRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: Some(record.title.clone()),
            description: record.description.clone(),
            logo: Some(record.logo.clone()),
            categories: Some(record.categories.clone()),
            latitude: Some(record.latitude),
            longitude: Some(record.longitude),
            website: record.website.clone(),
            status: record.status.map(|s| match s {
                StoreStatus::Open => "open".to_owned(),
                StoreStatus::Closed => "closed".to_owned(),
            }),
        }
    }
}

/// What to do with an update whose `id` matches no loaded store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownUpdatePolicy {
    #[default]
    Ignore,
    Append,
}

impl FromStr for UnknownUpdatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "append" => Ok(Self::Append),
            other => Err(ConfigError::InvalidEnvVar {
                var: "DANKMAPS_UNKNOWN_UPDATE_POLICY".to_owned(),
                reason: format!("expected 'ignore' or 'append', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Updated { index: usize },
    Appended,
    Ignored,
}

/// Applies `update` to `stores` in place.
///
/// A matching `id` is patched at its current position, so the list length and
/// every other record are untouched. Unknown ids follow `policy`.
///
/// A patch that would leave a record with a blank title or coordinates
/// outside the valid ranges is dropped as [`PatchOutcome::Ignored`] and the
/// stored record keeps its previous values.
pub fn apply_update(
    stores: &mut Vec<StoreRecord>,
    update: &StoreUpdate,
    policy: UnknownUpdatePolicy,
) -> PatchOutcome {
    if let Some(index) = stores.iter().position(|s| s.id == update.id) {
        let mut merged = stores[index].clone();
        update.merge_into(&mut merged);
        if let Err(e) = validate_store(&merged) {
            tracing::warn!(store_id = %update.id, error = %e, "rejecting invalid store update");
            return PatchOutcome::Ignored;
        }
        stores[index] = merged;
        return PatchOutcome::Updated { index };
    }

    match policy {
        UnknownUpdatePolicy::Ignore => {
            tracing::debug!(store_id = %update.id, "ignoring update for unknown store");
            PatchOutcome::Ignored
        }
        UnknownUpdatePolicy::Append => {
            let Some(record) = update.to_record() else {
                tracing::warn!(
                    store_id = %update.id,
                    "update for unknown store lacks title/coordinates; not appended"
                );
                return PatchOutcome::Ignored;
            };
            if let Err(e) = validate_store(&record) {
                tracing::warn!(store_id = %update.id, error = %e, "rejecting invalid new store");
                return PatchOutcome::Ignored;
            }
            stores.push(record);
            PatchOutcome::Appended
        }
    }
}

/// Accepts store ids sent either as strings or as bare JSON numbers.
///
/// # Errors
///
/// Fails when the value is neither a string nor an integer.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    fn parse<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| E::custom(format!("invalid coordinate '{s}': {e}"))),
        }
    }
}

/// Accepts a coordinate sent as a JSON number or as a numeric string.
/// Coordinates saved through the dashboard form arrive as strings.
///
/// # Errors
///
/// Fails when the value is neither a number nor a string holding one.
pub fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    RawCoordinate::deserialize(deserializer)?.parse()
}

fn deserialize_optional_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawCoordinate>::deserialize(deserializer)?
        .map(RawCoordinate::parse)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str) -> StoreRecord {
        StoreRecord {
            id: id.to_owned(),
            title: title.to_owned(),
            description: None,
            logo: Logo::None,
            categories: vec!["CBD".to_owned()],
            latitude: -25.75,
            longitude: 28.19,
            website: None,
            status: None,
        }
    }

    fn feed() -> Vec<StoreRecord> {
        vec![record("1", "CannAfrica"), record("2", "High Rollers")]
    }

    #[test]
    fn matching_update_patches_only_that_record() {
        let mut stores = feed();
        let before_other = stores[1].clone();
        let update: StoreUpdate = serde_json::from_value(serde_json::json!({
            "id": "1",
            "status": "open",
            "categories": ["THC", "THC", "Flower"]
        }))
        .expect("deserialize");

        let outcome = apply_update(&mut stores, &update, UnknownUpdatePolicy::Ignore);

        assert_eq!(outcome, PatchOutcome::Updated { index: 0 });
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].title, "CannAfrica");
        assert_eq!(stores[0].status, Some(StoreStatus::Open));
        assert_eq!(stores[0].categories, vec!["THC", "Flower"]);
        assert_eq!(stores[1], before_other);
    }

    #[test]
    fn unknown_id_is_ignored_by_default() {
        let mut stores = feed();
        let update = StoreUpdate {
            id: "99".to_owned(),
            title: Some("New".to_owned()),
            latitude: Some(-26.0),
            longitude: Some(28.0),
            ..StoreUpdate::default()
        };
        let outcome = apply_update(&mut stores, &update, UnknownUpdatePolicy::Ignore);
        assert_eq!(outcome, PatchOutcome::Ignored);
        assert_eq!(stores, feed());
    }

    #[test]
    fn unknown_id_is_appended_under_append_policy() {
        let mut stores = feed();
        let update = StoreUpdate {
            id: "99".to_owned(),
            title: Some("New".to_owned()),
            latitude: Some(-26.0),
            longitude: Some(28.0),
            ..StoreUpdate::default()
        };
        let outcome = apply_update(&mut stores, &update, UnknownUpdatePolicy::Append);
        assert_eq!(outcome, PatchOutcome::Appended);
        assert_eq!(stores.len(), 3);
        assert_eq!(stores[2].id, "99");
    }

    #[test]
    fn partial_unknown_update_is_not_appended() {
        let mut stores = feed();
        let update = StoreUpdate {
            id: "99".to_owned(),
            status: Some("closed".to_owned()),
            ..StoreUpdate::default()
        };
        let outcome = apply_update(&mut stores, &update, UnknownUpdatePolicy::Append);
        assert_eq!(outcome, PatchOutcome::Ignored);
        assert_eq!(stores.len(), 2);
    }

    #[test]
    fn out_of_range_patch_leaves_record_unchanged() {
        let mut stores = feed();
        let update: StoreUpdate = serde_json::from_value(serde_json::json!({
            "id": "1",
            "latitude": 500.0,
            "status": "open"
        }))
        .expect("deserialize");

        let outcome = apply_update(&mut stores, &update, UnknownUpdatePolicy::Ignore);

        assert_eq!(outcome, PatchOutcome::Ignored);
        assert_eq!(stores, feed());
    }

    #[test]
    fn blank_title_patch_is_rejected() {
        let mut stores = feed();
        let update = StoreUpdate {
            id: "2".to_owned(),
            title: Some("   ".to_owned()),
            ..StoreUpdate::default()
        };
        assert_eq!(
            apply_update(&mut stores, &update, UnknownUpdatePolicy::Ignore),
            PatchOutcome::Ignored
        );
        assert_eq!(stores[1].title, "High Rollers");
    }

    #[test]
    fn patched_title_is_trimmed() {
        let mut stores = feed();
        let update = StoreUpdate {
            id: "2".to_owned(),
            title: Some("  High Rollers Lounge ".to_owned()),
            ..StoreUpdate::default()
        };
        apply_update(&mut stores, &update, UnknownUpdatePolicy::Ignore);
        assert_eq!(stores[1].title, "High Rollers Lounge");
    }

    #[test]
    fn invalid_unknown_store_is_not_appended() {
        let mut stores = feed();
        let update = StoreUpdate {
            id: "99".to_owned(),
            title: Some("Offshore".to_owned()),
            latitude: Some(-26.0),
            longitude: Some(200.0),
            ..StoreUpdate::default()
        };
        assert_eq!(
            apply_update(&mut stores, &update, UnknownUpdatePolicy::Append),
            PatchOutcome::Ignored
        );
        assert_eq!(stores.len(), 2);
    }

    #[test]
    fn string_coordinates_are_accepted_in_patches() {
        let update: StoreUpdate = serde_json::from_value(serde_json::json!({
            "id": "1",
            "latitude": "-26.0328",
            "longitude": 27.9515
        }))
        .expect("deserialize");
        assert_eq!(update.latitude, Some(-26.0328));
        assert_eq!(update.longitude, Some(27.9515));

        let absent: StoreUpdate =
            serde_json::from_value(serde_json::json!({ "id": "1", "latitude": null }))
                .expect("deserialize");
        assert_eq!(absent.latitude, None);
        assert_eq!(absent.longitude, None);

        assert!(serde_json::from_value::<StoreUpdate>(
            serde_json::json!({ "id": "1", "latitude": "north" })
        )
        .is_err());
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let update: StoreUpdate =
            serde_json::from_value(serde_json::json!({ "id": 2, "title": "Renamed" }))
                .expect("deserialize");
        assert_eq!(update.id, "2");
    }

    #[test]
    fn full_record_update_round_trips() {
        let original = record("5", "Canapax");
        let mut target = record("5", "Old");
        StoreUpdate::from(&original).merge_into(&mut target);
        assert_eq!(target, original);
    }

    #[test]
    fn policy_parses_from_config_value() {
        assert_eq!(
            "Append".parse::<UnknownUpdatePolicy>().unwrap(),
            UnknownUpdatePolicy::Append
        );
        assert!("sometimes".parse::<UnknownUpdatePolicy>().is_err());
    }
}
