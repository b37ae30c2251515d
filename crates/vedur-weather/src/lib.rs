//! Forecast client for Veður
//!
//! Fetches hourly temperature and precipitation from the Open-Meteo API and
//! validates the payload into [`ForecastPoint`]s.

pub mod location;
pub mod parse;
pub mod provider;
pub mod types;

pub use location::{ConfiguredLocation, LocationProvider};
pub use parse::parse_forecast;
pub use provider::{ForecastClient, ForecastOptions};
pub use types::*;
