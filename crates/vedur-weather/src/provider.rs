//! HTTP side of the forecast client.

use std::time::Duration;

use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::parse::parse_forecast;
use crate::types::{FetchError, ForecastPoint, WeatherError};

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com";
const FORECAST_PATH: &str = "v1/forecast";
const HOURLY_VARIABLES: &str = "temperature_2m,precipitation";

/// Tunables for [`ForecastClient`].
#[derive(Debug, Clone)]
pub struct ForecastOptions {
    /// Pause before every request so callers can show a loading state
    pub delay: Duration,
    /// Overall request timeout; `None` keeps the reqwest default
    pub timeout: Option<Duration>,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    endpoint: Url,
    delay: Duration,
}

impl ForecastClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, options: ForecastOptions) -> Result<Self, WeatherError> {
        let endpoint = Url::parse(&format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            FORECAST_PATH
        ))
        .map_err(|e| WeatherError::Setup(format!("invalid API url {}: {}", base_url, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| WeatherError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            delay: options.delay,
        })
    }

    /// Client for the public Open-Meteo API.
    pub fn open_meteo(options: ForecastOptions) -> Result<Self, WeatherError> {
        Self::new(OPEN_METEO_URL, options)
    }

    /// Full request URL for a coordinate pair.
    pub fn forecast_url(&self, latitude: f64, longitude: f64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &latitude.to_string())
            .append_pair("longitude", &longitude.to_string())
            .append_pair("hourly", HOURLY_VARIABLES)
            .append_pair("timezone", "GMT")
            .append_pair("forecast_days", "1");
        url
    }

    /// Fetch today's hourly forecast for a coordinate pair.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<ForecastPoint>, WeatherError> {
        let url = self.forecast_url(latitude, longitude);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::debug!("Requesting forecast: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Error fetching weather: {}", e);
            FetchError::Unreachable(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Forecast API returned status {}", status);
            return Err(FetchError::Status(status.as_u16()).into());
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Error reading forecast body: {}", e);
            FetchError::Unreachable(e)
        })?;

        let points = parse_forecast(&body)?;
        tracing::info!("Fetched {} hourly forecast points", points.len());
        Ok(points)
    }
}
