use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::Location;

use super::{Geocoder, get_json};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1";
pub const MAX_CANDIDATES: usize = 5;

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<Location>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let parsed: GeoResponse = get_json(
            &self.http,
            &url,
            &[
                ("name", query.to_string()),
                ("count", MAX_CANDIDATES.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ],
            "geocoding",
        )
        .await?;

        Ok(parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(|place| Location {
                name: place.name,
                country_code: place.country_code.unwrap_or_default(),
                admin_area: place.admin1,
                latitude: place.latitude,
                longitude: place.longitude,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GeoPlace {
    name: String,
    country_code: Option<String>,
    admin1: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Option<Vec<GeoPlace>>,
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn search(&self, query: &str) -> Vec<Location> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.try_search(query).await {
            Ok(locations) => {
                tracing::debug!(query, found = locations.len(), "geocoded");
                locations
            }
            Err(e) => {
                tracing::warn!(query, "Geocoding failed: {e:#}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn place(name: &str, cc: &str, admin: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "country_code": cc,
            "admin1": admin,
            "latitude": 51.5,
            "longitude": -0.12,
        })
    }

    #[tokio::test]
    async fn maps_results_in_upstream_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "London"))
            .and(query_param("count", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    place("London", "GB", Some("England")),
                    place("London", "CA", Some("Ontario")),
                    place("London", "US", None),
                ]
            })))
            .mount(&server)
            .await;

        let geocoder = OpenMeteoGeocoder::new(Client::new(), server.uri());
        let found = geocoder.search("  London ").await;

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].country_code, "GB");
        assert_eq!(found[0].admin_area.as_deref(), Some("England"));
        assert_eq!(found[1].country_code, "CA");
        assert_eq!(found[2].admin_area, None);
    }

    #[tokio::test]
    async fn caps_candidates_at_five() {
        let server = MockServer::start().await;
        let results: Vec<_> = (0..8).map(|i| place(&format!("Springfield {i}"), "US", None)).collect();

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": results })),
            )
            .mount(&server)
            .await;

        let geocoder = OpenMeteoGeocoder::new(Client::new(), server.uri());
        assert_eq!(geocoder.search("Springfield").await.len(), MAX_CANDIDATES);
    }

    #[tokio::test]
    async fn missing_results_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "generationtime_ms": 0.5
            })))
            .mount(&server)
            .await;

        let geocoder = OpenMeteoGeocoder::new(Client::new(), server.uri());
        assert!(geocoder.search("Nowhere").await.is_empty());
    }

    #[tokio::test]
    async fn blank_query_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let geocoder = OpenMeteoGeocoder::new(Client::new(), server.uri());
        assert!(geocoder.search("   ").await.is_empty());
        assert!(geocoder.search("").await.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_swallowed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let geocoder = OpenMeteoGeocoder::new(Client::new(), server.uri());
        assert!(geocoder.search("London").await.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_swallowed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let geocoder = OpenMeteoGeocoder::new(Client::new(), server.uri());
        assert!(geocoder.search("London").await.is_empty());
    }
}
