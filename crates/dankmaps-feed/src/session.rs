//! Drives a [`MapController`] from the feed and the device location.
//!
//! A session owns both ends so screen teardown can be expressed as a single
//! `shutdown` future: once it resolves, in-flight results are dropped and the
//! controller is left untouched.

use std::future::Future;

use dankmaps_core::geo::{GeoPoint, Region};
use dankmaps_core::location::{LocationError, LocationProvider};
use dankmaps_core::update::{PatchOutcome, StoreUpdate};
use dankmaps_core::{MapController, RecenterIntent};
use futures::{Stream, StreamExt};

use crate::client::FeedClient;
use crate::error::FeedError;

/// Result of one completed [`MapSession::load_until`].
#[derive(Debug)]
pub struct LoadOutcome {
    /// Number of stores now loaded, or why the fetch failed.
    pub feed: Result<usize, FeedError>,
    pub location: Result<GeoPoint, LocationError>,
    /// Region after the refit.
    pub region: Option<Region>,
}

/// Counts from one [`MapSession::follow_updates`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowSummary {
    pub updated: usize,
    pub appended: usize,
    pub ignored: usize,
    pub errors: usize,
}

#[derive(Debug)]
pub struct MapSession {
    client: FeedClient,
    controller: MapController,
}

impl MapSession {
    #[must_use]
    pub fn new(client: FeedClient, controller: MapController) -> Self {
        Self { client, controller }
    }

    #[must_use]
    pub fn client(&self) -> &FeedClient {
        &self.client
    }

    #[must_use]
    pub fn controller(&self) -> &MapController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MapController {
        &mut self.controller
    }

    #[must_use]
    pub fn into_controller(self) -> MapController {
        self.controller
    }

    /// Fetches stores and the user position concurrently, then refits.
    ///
    /// Returns `None` when `shutdown` resolves first; nothing is applied in
    /// that case. A feed failure keeps the previously loaded stores and a
    /// location failure leaves the user position unset.
    pub async fn load_until<L, F>(&mut self, location: &L, shutdown: F) -> Option<LoadOutcome>
    where
        L: LocationProvider,
        F: Future<Output = ()>,
    {
        let client = &self.client;
        let (feed, position) = tokio::select! {
            results = async { tokio::join!(client.fetch_stores(), location.current_position()) } => results,
            () = shutdown => {
                tracing::info!("map session closed before load finished, discarding results");
                return None;
            }
        };

        let feed = match feed {
            Ok(stores) => {
                let count = stores.len();
                self.controller.set_stores(stores);
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "store feed load failed");
                Err(e)
            }
        };

        match &position {
            Ok(point) => self.controller.set_user_location(*point),
            Err(e) => tracing::warn!(error = %e, "continuing without user location"),
        }

        let region = self.controller.refit();
        Some(LoadOutcome {
            feed,
            location: position,
            region,
        })
    }

    /// Asks `location` for the current position again and returns a close
    /// zoom on it.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`LocationError`]; the last known position, if
    /// any, stays in place.
    pub async fn refresh_location<L>(&mut self, location: &L) -> Result<RecenterIntent, LocationError>
    where
        L: LocationProvider,
    {
        let point = location.current_position().await.map_err(|e| {
            tracing::warn!(error = %e, "could not refresh user location");
            e
        })?;
        self.controller.set_user_location(point);
        Ok(RecenterIntent {
            region: Region::around(point, dankmaps_core::controller::CLOSE_ZOOM_DELTA),
        })
    }

    /// Applies store patches from `updates` until it ends or `shutdown`
    /// resolves. The stream is dropped on return, which closes a live
    /// subscription.
    ///
    /// The viewport is refit whenever a patch changes the set of points on
    /// the map (a store appended or moved).
    pub async fn follow_updates<S, F>(&mut self, updates: S, shutdown: F) -> FollowSummary
    where
        S: Stream<Item = Result<StoreUpdate, FeedError>>,
        F: Future<Output = ()>,
    {
        let mut summary = FollowSummary::default();
        tokio::pin!(updates);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::debug!("stopping store update subscription");
                    break;
                }
                next = updates.next() => match next {
                    Some(Ok(update)) => self.apply(&update, &mut summary),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "dropping unreadable store update");
                        summary.errors += 1;
                    }
                    None => {
                        tracing::info!("store update stream ended");
                        break;
                    }
                },
            }
        }

        summary
    }

    fn apply(&mut self, update: &StoreUpdate, summary: &mut FollowSummary) {
        let moved = update.latitude.is_some() || update.longitude.is_some();
        match self.controller.apply_update(update) {
            PatchOutcome::Updated { .. } => {
                summary.updated += 1;
                if moved {
                    self.controller.refit();
                }
            }
            PatchOutcome::Appended => {
                summary.appended += 1;
                self.controller.refit();
            }
            PatchOutcome::Ignored => summary.ignored += 1,
        }
    }
}
