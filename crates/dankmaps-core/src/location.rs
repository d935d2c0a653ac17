//! Device location seam.
//!
//! The platform location API is permission gated; implementations report a
//! denial as [`LocationError::PermissionDenied`] so callers can run without a
//! user position instead of failing.

use std::future::Future;

use thiserror::Error;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("permission to access location was denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Source of the user's current position.
pub trait LocationProvider {
    /// Requests the current position, prompting for permission if needed.
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, LocationError>> + Send;
}

/// A provider that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoPoint);

impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        Ok(self.0)
    }
}

/// A provider for which the user declined location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedLocation;

impl LocationProvider for DeniedLocation {
    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}
