use crate::{
    Config, WeatherError,
    model::{AirQualityReading, CurrentConditions, Forecast, Location, UnitSystem},
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};

pub mod air_quality;
pub mod forecast;
pub mod geocoding;

pub use air_quality::OpenMeteoAirQuality;
pub use forecast::OpenMeteoForecast;
pub use geocoding::OpenMeteoGeocoder;

/// Resolves free-text queries to ranked candidates. Never fails: upstream
/// trouble yields an empty list.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn search(&self, query: &str) -> Vec<Location>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        location: &Location,
        units: UnitSystem,
    ) -> Result<CurrentConditions, WeatherError>;

    async fn fetch_forecast(
        &self,
        location: &Location,
        units: UnitSystem,
    ) -> Result<Forecast, WeatherError>;
}

/// Never fails: upstream trouble yields [`AirQualityReading::unavailable`].
#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    async fn fetch_index(&self, location: &Location) -> AirQualityReading;
}

/// Build the HTTP client shared by all Open-Meteo adapters.
pub fn http_client_from_config(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs()))
        .user_agent(concat!("meteo/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url` and decode a JSON body, turning non-success statuses into errors.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
    what: &str,
) -> Result<T> {
    tracing::debug!(%url, ?query, "requesting {what}");

    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("Failed to send {what} request to Open-Meteo"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read Open-Meteo {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "Open-Meteo {what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse Open-Meteo {what} JSON"))
}

/// Parse an Open-Meteo local timestamp ("2024-05-01T14:00") at `offset`.
pub(crate) fn parse_local_time(s: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    offset.from_local_datetime(&naive).single()
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
