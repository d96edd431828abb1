use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::{AirQualityReading, Location};

use super::{AirQualityProvider, get_json};

pub const DEFAULT_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1";

#[derive(Debug, Clone)]
pub struct OpenMeteoAirQuality {
    http: Client,
    base_url: String,
}

impl OpenMeteoAirQuality {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn try_fetch_index(&self, location: &Location) -> Result<f64> {
        let url = format!("{}/air-quality", self.base_url.trim_end_matches('/'));

        let parsed: AqResponse = get_json(
            &self.http,
            &url,
            &[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current", "us_aqi".to_string()),
            ],
            "air quality",
        )
        .await?;

        parsed
            .current
            .and_then(|c| c.us_aqi)
            .context("Open-Meteo air quality response contained no us_aqi value")
    }
}

#[derive(Debug, Deserialize)]
struct AqCurrent {
    us_aqi: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AqResponse {
    current: Option<AqCurrent>,
}

#[async_trait]
impl AirQualityProvider for OpenMeteoAirQuality {
    async fn fetch_index(&self, location: &Location) -> AirQualityReading {
        match self.try_fetch_index(location).await {
            Ok(index) => AirQualityReading::from_index(index),
            Err(e) => {
                tracing::warn!(location = %location.name, "Air quality unavailable: {e:#}");
                AirQualityReading::unavailable()
            }
        }
    }
}
