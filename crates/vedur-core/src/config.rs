use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Forecast API settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Locations offered as search buttons, in display order
    #[serde(default = "default_locations")]
    pub locations: Vec<LocationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the forecast API (without the `/v1/forecast` path)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Delay before each forecast request, so the loading state is visible.
    /// Zero disables it.
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    /// Request timeout; when unset the HTTP client default applies
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Fixed position reported for "my location" searches
    #[serde(default)]
    pub device_location: Option<DevicePosition>,
}

fn default_api_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_fetch_delay_ms() -> u64 {
    1000
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            fetch_delay_ms: default_fetch_delay_ms(),
            request_timeout_secs: None,
            device_location: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevicePosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationConfig {
    fn new(title: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            title: title.to_string(),
            latitude,
            longitude,
        }
    }
}

fn default_locations() -> Vec<LocationConfig> {
    vec![
        LocationConfig::new("Reykjavík", 64.1355, -21.8954),
        LocationConfig::new("Akureyri", 65.6835, -18.0878),
        LocationConfig::new("New York", 40.7128, -74.006),
        LocationConfig::new("Tokyo", 35.6764, 139.65),
        LocationConfig::new("Sydney", -33.8688, 151.2093),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            locations: default_locations(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.api_url, "weather.api_url", &mut result);

        if self.weather.fetch_delay_ms > 10_000 {
            result.add_warning(
                "weather.fetch_delay_ms",
                "Fetch delay is more than 10 seconds",
            );
        }

        if self.weather.request_timeout_secs == Some(0) {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if let Some(pos) = &self.weather.device_location {
            validate_coordinates(
                pos.latitude,
                pos.longitude,
                "weather.device_location",
                &mut result,
            );
        }

        if self.locations.is_empty() {
            result.add_warning("locations", "No locations configured");
        }

        for (i, location) in self.locations.iter().enumerate() {
            let field = format!("locations[{}]", i);
            if location.title.trim().is_empty() {
                result.add_error(&field, "Location title must not be empty");
            }
            validate_coordinates(location.latitude, location.longitude, &field, &mut result);
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("vedur");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_coordinates(latitude: f64, longitude: f64, field: &str, result: &mut ValidationResult) {
    if !(-90.0..=90.0).contains(&latitude) {
        result.add_error(
            format!("{}.latitude", field),
            format!("Latitude out of range: {}", latitude),
        );
    }
    if !(-180.0..=180.0).contains(&longitude) {
        result.add_error(
            format!("{}.longitude", field),
            format!("Longitude out of range: {}", longitude),
        );
    }
}
