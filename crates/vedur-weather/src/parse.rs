//! Typed validation of the Open-Meteo hourly payload.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::Deserialize;
use serde_json::Value;

use crate::types::{ForecastPoint, ValidationError};

/// Formats the API uses for hourly timestamps without an offset.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Numeric-offset forms RFC 3339 does not cover, e.g. no seconds or `+0200`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%dT%H:%M:%S%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

#[derive(Debug, Deserialize)]
struct HourlyPayload {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    precipitation: Vec<f64>,
}

/// Parse a forecast response body into hourly points.
///
/// A body that is not JSON at all is reported as [`ValidationError::Data`].
pub fn parse_forecast(body: &str) -> Result<Vec<ForecastPoint>, ValidationError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        tracing::debug!("Forecast body is not JSON: {}", e);
        ValidationError::Data
    })?;
    parse_value(&value)
}

/// Validate an already decoded payload.
pub fn parse_value(value: &Value) -> Result<Vec<ForecastPoint>, ValidationError> {
    let hourly = value
        .as_object()
        .and_then(|obj| obj.get("hourly"))
        .filter(|h| is_truthy(h))
        .ok_or(ValidationError::Data)?;

    // Derived structs also accept sequences, so check the shape first
    if !hourly.is_object() {
        return Err(ValidationError::Forecast);
    }

    let hourly = HourlyPayload::deserialize(hourly).map_err(|e| {
        tracing::debug!("Hourly forecast has wrong shape: {}", e);
        ValidationError::Forecast
    })?;

    let len = hourly.time.len();
    if hourly.temperature_2m.len() != len || hourly.precipitation.len() != len {
        tracing::debug!(
            time = len,
            temperature = hourly.temperature_2m.len(),
            precipitation = hourly.precipitation.len(),
            "Hourly arrays differ in length"
        );
        return Err(ValidationError::Forecast);
    }

    hourly
        .time
        .iter()
        .zip(hourly.temperature_2m)
        .zip(hourly.precipitation)
        .map(|((time, temperature), precipitation)| point(time, temperature, precipitation))
        .collect()
}

fn point(
    time: &str,
    temperature: f64,
    precipitation: f64,
) -> Result<ForecastPoint, ValidationError> {
    let hour = local_hour(time).ok_or_else(|| {
        tracing::debug!("Unparseable forecast time: {}", time);
        ValidationError::Forecast
    })?;
    Ok(ForecastPoint {
        time: format!("{:02}:00", hour),
        temperature,
        precipitation,
    })
}

/// Hour of day in local time, read the way a browser `Date` reads the string.
///
/// Timestamps without an offset are already local wall-clock time. Ones with an
/// offset are converted, and a bare date means UTC midnight.
pub fn local_hour(time: &str) -> Option<u32> {
    if let Some(dt) = parse_with_offset(time) {
        return Some(dt.with_timezone(&Local).hour());
    }

    if let Some(naive) = parse_naive(time) {
        return Some(naive.hour());
    }

    NaiveDate::parse_from_str(time, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().with_timezone(&Local).hour())
}

fn parse_with_offset(time: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(time) {
        return Some(dt);
    }

    if let Some(utc) = time.strip_suffix('Z') {
        return parse_naive(utc).map(|naive| naive.and_utc().fixed_offset());
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(time, fmt).ok())
}

fn parse_naive(time: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(time, fmt).ok())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
