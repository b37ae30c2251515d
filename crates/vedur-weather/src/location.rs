//! Device location lookup for "my location" searches.

use std::future::Future;

use crate::types::{Location, LocationError};

/// Title given to locations that come from the device.
pub const MY_LOCATION_TITLE: &str = "My location";

/// Source of the device's current position.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> impl Future<Output = Result<Location, LocationError>> + Send;
}

/// Reports a position fixed in configuration, or no position at all.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocation {
    position: Option<(f64, f64)>,
}

impl ConfiguredLocation {
    pub fn new(position: Option<(f64, f64)>) -> Self {
        Self { position }
    }

    /// Provider that always fails, for hosts without location support.
    pub fn unavailable() -> Self {
        Self { position: None }
    }
}

impl LocationProvider for ConfiguredLocation {
    async fn current_location(&self) -> Result<Location, LocationError> {
        match self.position {
            Some((latitude, longitude)) => {
                tracing::info!("Got location: {}, {}", latitude, longitude);
                Ok(Location::new(MY_LOCATION_TITLE, latitude, longitude))
            }
            None => {
                tracing::error!("error getting current position: no device location configured");
                Err(LocationError::ServiceUnavailable)
            }
        }
    }
}
