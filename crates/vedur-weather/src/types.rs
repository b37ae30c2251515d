use serde::{Deserialize, Serialize};

/// A named point on the map that can be searched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(title: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            title: title.into(),
            latitude,
            longitude,
        }
    }
}

/// One hourly sample of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Local hour label, e.g. "09:00"
    pub time: String,
    /// Temperature in °C
    pub temperature: f64,
    /// Precipitation in mm
    pub precipitation: f64,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location service unavailable")]
    ServiceUnavailable,
}

/// The forecast could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// DNS, connection, timeout or body transfer failure
    #[error("could not fetch weather")]
    Unreachable(#[source] reqwest::Error),
    /// The API answered with a non-success status
    #[error("could not retrieve weather (HTTP {0})")]
    Status(u16),
}

/// The forecast payload did not have the expected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Payload is not an object with a truthy `hourly` member
    #[error("weather data not in correct form")]
    Data,
    /// `hourly` lacks the expected arrays or their contents are unusable
    #[error("weather forecast not in correct form")]
    Forecast,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Client setup error: {0}")]
    Setup(String),
}

impl WeatherError {
    /// Short message for display; root causes are only logged.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Fetch(FetchError::Unreachable(_)) => "could not fetch weather",
            Self::Fetch(FetchError::Status(_)) => "could not retrieve weather",
            Self::Validation(ValidationError::Data) => "weather data not in correct form",
            Self::Validation(ValidationError::Forecast) => "weather forecast not in correct form",
            Self::Location(_) => "could not retrieve location",
            Self::Setup(_) => "weather service unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_distinct() {
        let data = WeatherError::from(ValidationError::Data);
        let forecast = WeatherError::from(ValidationError::Forecast);
        assert_ne!(data.user_message(), forecast.user_message());
        assert_eq!(data.to_string(), "weather data not in correct form");
        assert_eq!(forecast.to_string(), "weather forecast not in correct form");
    }

    #[test]
    fn test_status_message_hides_code() {
        let err = WeatherError::from(FetchError::Status(503));
        assert_eq!(err.user_message(), "could not retrieve weather");
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_location_error_message() {
        let err = WeatherError::from(LocationError::ServiceUnavailable);
        assert_eq!(err.user_message(), "could not retrieve location");
        assert!(err.to_string().contains("unavailable"));
    }
}
