//! Map screen state: loaded stores, the selected store, and the viewport.
//!
//! [`MapController`] owns all three and its methods are the only mutators.
//! Selection changes come from marker taps, search-result taps and explicit
//! closes; loading or patching store data never changes what is selected.

use thiserror::Error;

use crate::geo::{GeoPoint, Region};
use crate::province::Province;
use crate::search::search_by_title;
use crate::store::StoreRecord;
use crate::update::{apply_update, PatchOutcome, StoreUpdate, UnknownUpdatePolicy};
use crate::viewport::fit_region;

/// Fraction of the visible latitude span to shift a focused store by, so it
/// lands above the detail panel anchored to the bottom of the screen.
pub const RECENTER_OFFSET_FACTOR: f64 = -0.25;

/// Span used when recentering before any region is known, and when
/// centering on the user.
pub const CLOSE_ZOOM_DELTA: f64 = 0.01;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("store '{id}' not found")]
    NotFound { id: String },
}

/// Request for the UI to animate the map to `region`. The controller does
/// not move the map itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecenterIntent {
    pub region: Region,
}

#[derive(Debug, Clone, Default)]
pub struct MapController {
    stores: Vec<StoreRecord>,
    selected: Option<StoreRecord>,
    region: Option<Region>,
    user_location: Option<GeoPoint>,
    province: Province,
    search_query: String,
    search_results: Vec<String>,
    unknown_update_policy: UnknownUpdatePolicy,
}

impl MapController {
    #[must_use]
    pub fn new(unknown_update_policy: UnknownUpdatePolicy) -> Self {
        Self {
            unknown_update_policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stores(&self) -> &[StoreRecord] {
        &self.stores
    }

    #[must_use]
    pub fn selected_store(&self) -> Option<&StoreRecord> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    #[must_use]
    pub fn user_location(&self) -> Option<GeoPoint> {
        self.user_location
    }

    #[must_use]
    pub fn province(&self) -> Province {
        self.province
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Stores matching the active search query, in feed order.
    #[must_use]
    pub fn search_results(&self) -> Vec<&StoreRecord> {
        self.search_results
            .iter()
            .filter_map(|id| self.find(id))
            .collect()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&StoreRecord> {
        self.stores.iter().find(|s| s.id == id)
    }

    /// Replaces the whole store list, e.g. after a refetch.
    pub fn set_stores(&mut self, stores: Vec<StoreRecord>) {
        self.stores = stores;
        self.refresh_search_results();
    }

    pub fn set_user_location(&mut self, location: GeoPoint) {
        self.user_location = Some(location);
    }

    /// Selects the store with `id` and returns where the map should move.
    ///
    /// The recenter target keeps the current spans and shifts the latitude
    /// by [`RECENTER_OFFSET_FACTOR`] of the current latitude span.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NotFound`] when no loaded store has `id`;
    /// the current selection is left as it was.
    pub fn select_store(&mut self, id: &str) -> Result<RecenterIntent, SelectionError> {
        let Some(store) = self.find(id).cloned() else {
            tracing::warn!(store_id = %id, "select requested for unknown store");
            return Err(SelectionError::NotFound { id: id.to_owned() });
        };

        let (latitude_delta, longitude_delta) = self
            .region
            .map_or((CLOSE_ZOOM_DELTA, CLOSE_ZOOM_DELTA), |r| {
                (r.latitude_delta, r.longitude_delta)
            });

        let intent = RecenterIntent {
            region: Region::new(
                store.latitude + latitude_delta * RECENTER_OFFSET_FACTOR,
                store.longitude,
                latitude_delta,
                longitude_delta,
            ),
        };
        tracing::debug!(store_id = %store.id, "store selected");
        self.selected = Some(store);
        Ok(intent)
    }

    /// Clears the selection. The viewport is left where it is.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Selects a store picked from the search results, clearing the search.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NotFound`] when no loaded store has `id`.
    pub fn search_select(&mut self, id: &str) -> Result<RecenterIntent, SelectionError> {
        self.set_search_query("");
        self.select_store(id)
    }

    pub fn set_search_query(&mut self, query: &str) {
        query.clone_into(&mut self.search_query);
        self.refresh_search_results();
    }

    fn refresh_search_results(&mut self) {
        self.search_results = search_by_title(&self.stores, &self.search_query)
            .into_iter()
            .map(|s| s.id.clone())
            .collect();
    }

    /// Frames every loaded store plus the user location.
    ///
    /// With nothing to frame the current region is kept. Returns the region
    /// in effect afterwards.
    pub fn refit(&mut self) -> Option<Region> {
        let mut points: Vec<GeoPoint> = self.stores.iter().map(StoreRecord::location).collect();
        points.extend(self.user_location);
        if let Some(region) = fit_region(&points) {
            self.region = Some(region);
        }
        self.region
    }

    /// Switches to the preset framing of `province`.
    pub fn select_province(&mut self, province: Province) -> Region {
        let region = province.region();
        self.province = province;
        self.region = Some(region);
        region
    }

    /// Close zoom on the user's position, if one is known.
    #[must_use]
    pub fn center_on_user(&self) -> Option<RecenterIntent> {
        self.user_location.map(|p| RecenterIntent {
            region: Region::around(p, CLOSE_ZOOM_DELTA),
        })
    }

    /// Records a pan/zoom finished by the user. Returns `false` when the
    /// region is identical to the current one.
    pub fn region_changed(&mut self, region: Region) -> bool {
        if self.region == Some(region) {
            return false;
        }
        self.region = Some(region);
        true
    }

    /// Applies a pushed store change in place.
    ///
    /// If the patched store is the selected one, the selected snapshot picks
    /// up the new fields; selection itself does not change.
    pub fn apply_update(&mut self, update: &StoreUpdate) -> PatchOutcome {
        let outcome = apply_update(&mut self.stores, update, self.unknown_update_policy);
        if let PatchOutcome::Updated { index } = outcome {
            if let Some(selected) = self.selected.as_mut() {
                if selected.id == update.id {
                    selected.clone_from(&self.stores[index]);
                }
            }
        }
        if outcome != PatchOutcome::Ignored {
            self.refresh_search_results();
        }
        outcome
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
