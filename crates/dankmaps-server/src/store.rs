//! In-memory store repository backing the `/api/clients` routes.
//!
//! Every successful change is broadcast to subscribers of
//! [`StoreRepository::subscribe`]: creates and updates as the full record,
//! deletes as the removed id. These feed the `/api/clients/events` stream.

use dankmaps_core::seed::validate_store;
use dankmaps_core::{StoreRecord, StoreUpdate};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Event name for a deleted store. Its payload is `{ "id": ... }`.
pub const STORE_REMOVED_EVENT: &str = "storeRemoved";

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Changed(StoreRecord),
    Removed { id: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("store '{id}' not found")]
    NotFound { id: String },

    #[error("a store with id '{id}' already exists")]
    Conflict { id: String },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug)]
pub struct StoreRepository {
    stores: RwLock<Vec<StoreRecord>>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreRepository {
    #[must_use]
    pub fn new(stores: Vec<StoreRecord>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            stores: RwLock::new(stores),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn list(&self) -> Vec<StoreRecord> {
        self.stores.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.stores.read().await.len()
    }

    pub async fn get(&self, id: &str) -> Option<StoreRecord> {
        self.stores.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Inserts a new store. An empty `update.id` is replaced with the next
    /// numeric id.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Invalid`] when title or coordinates are missing
    ///   or out of range.
    /// - [`RepositoryError::Conflict`] when the id is already taken.
    pub async fn create(&self, mut update: StoreUpdate) -> Result<StoreRecord, RepositoryError> {
        let mut stores = self.stores.write().await;

        if update.id.trim().is_empty() {
            update.id = next_id(&stores);
        }
        if stores.iter().any(|s| s.id == update.id) {
            return Err(RepositoryError::Conflict { id: update.id });
        }

        let record = update.to_record().ok_or_else(|| {
            RepositoryError::Invalid("title, latitude and longitude are required".to_owned())
        })?;
        validate_store(&record).map_err(|e| RepositoryError::Invalid(e.to_string()))?;

        stores.push(record.clone());
        drop(stores);

        tracing::info!(store_id = %record.id, "store created");
        self.publish(StoreEvent::Changed(record.clone()));
        Ok(record)
    }

    /// Merges `update` into the store with the same id.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] when no store has that id.
    /// - [`RepositoryError::Invalid`] when the merged record would be
    ///   invalid; the stored record is left unchanged.
    pub async fn update(&self, update: &StoreUpdate) -> Result<StoreRecord, RepositoryError> {
        let mut stores = self.stores.write().await;
        let Some(slot) = stores.iter_mut().find(|s| s.id == update.id) else {
            return Err(RepositoryError::NotFound {
                id: update.id.clone(),
            });
        };

        let mut merged = slot.clone();
        update.merge_into(&mut merged);
        validate_store(&merged).map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        slot.clone_from(&merged);
        drop(stores);

        tracing::info!(store_id = %merged.id, "store updated");
        self.publish(StoreEvent::Changed(merged.clone()));
        Ok(merged)
    }

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no store has `id`.
    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut stores = self.stores.write().await;
        let Some(index) = stores.iter().position(|s| s.id == id) else {
            return Err(RepositoryError::NotFound { id: id.to_owned() });
        };
        stores.remove(index);
        drop(stores);

        tracing::info!(store_id = %id, "store deleted");
        self.publish(StoreEvent::Removed { id: id.to_owned() });
        Ok(())
    }

    fn publish(&self, event: StoreEvent) {
        // No receivers is normal when no client is subscribed.
        if self.events.send(event).is_err() {
            tracing::trace!("no store event subscribers");
        }
    }
}

/// Highest numeric id plus one, or `"1"` when no id is numeric.
fn next_id(stores: &[StoreRecord]) -> String {
    stores
        .iter()
        .filter_map(|s| s.id.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str) -> StoreRecord {
        StoreUpdate {
            id: id.to_owned(),
            title: Some(title.to_owned()),
            latitude: Some(-26.2),
            longitude: Some(28.04),
            ..StoreUpdate::default()
        }
        .to_record()
        .expect("record")
    }

    fn new_store(id: &str, title: &str) -> StoreUpdate {
        StoreUpdate {
            id: id.to_owned(),
            title: Some(title.to_owned()),
            latitude: Some(-26.1),
            longitude: Some(28.0),
            ..StoreUpdate::default()
        }
    }

    #[test]
    fn next_id_uses_highest_numeric_id() {
        let stores = vec![record("3", "a"), record("custom", "b"), record("10", "c")];
        assert_eq!(next_id(&stores), "11");
        assert_eq!(next_id(&[record("abc", "x")]), "1");
        assert_eq!(next_id(&[]), "1");
    }

    #[tokio::test]
    async fn create_assigns_id_and_broadcasts() {
        let repo = StoreRepository::new(vec![record("4", "Existing")]);
        let mut rx = repo.subscribe();

        let created = repo.create(new_store("", "Fresh")).await.expect("create");
        assert_eq!(created.id, "5");
        assert_eq!(repo.count().await, 2);
        assert_eq!(rx.recv().await.expect("event"), StoreEvent::Changed(created));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let repo = StoreRepository::new(vec![record("4", "Existing")]);
        let err = repo.create(new_store("4", "Again")).await.unwrap_err();
        assert_eq!(err, RepositoryError::Conflict { id: "4".to_owned() });
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_coordinates() {
        let repo = StoreRepository::new(Vec::new());
        let mut body = new_store("", "Offshore");
        body.latitude = Some(-95.0);
        let err = repo.create(body).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid(_)));
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn update_merges_and_keeps_id() {
        let repo = StoreRepository::new(vec![record("1", "Old")]);
        let patch = StoreUpdate {
            id: "1".to_owned(),
            title: Some("New".to_owned()),
            ..StoreUpdate::default()
        };
        let updated = repo.update(&patch).await.expect("update");
        assert_eq!(updated.title, "New");
        assert!((updated.latitude - (-26.2)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn invalid_update_leaves_record_unchanged() {
        let repo = StoreRepository::new(vec![record("1", "Old")]);
        let patch = StoreUpdate {
            id: "1".to_owned(),
            title: Some("   ".to_owned()),
            ..StoreUpdate::default()
        };
        assert!(matches!(
            repo.update(&patch).await,
            Err(RepositoryError::Invalid(_))
        ));
        assert_eq!(repo.get("1").await.expect("store").title, "Old");
    }

    #[tokio::test]
    async fn delete_broadcasts_removed_id() {
        let repo = StoreRepository::new(vec![record("1", "Gone soon")]);
        let mut rx = repo.subscribe();

        repo.delete("1").await.expect("delete");

        assert_eq!(
            rx.recv().await.expect("event"),
            StoreEvent::Removed { id: "1".to_owned() }
        );
        assert!(repo.get("1").await.is_none());
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let repo = StoreRepository::new(Vec::new());
        assert_eq!(
            repo.delete("9").await,
            Err(RepositoryError::NotFound { id: "9".to_owned() })
        );
    }
}
