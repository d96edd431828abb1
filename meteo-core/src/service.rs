use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

use crate::{
    Config, WeatherError,
    cache::ResilienceCache,
    model::{CurrentConditions, Location, Provenance, ServedSnapshot, Snapshot, UnitSystem},
    provider::{
        AirQualityProvider, ForecastProvider, Geocoder, OpenMeteoAirQuality, OpenMeteoForecast,
        OpenMeteoGeocoder, http_client_from_config,
    },
    store::{KeyValueStore, Preferences},
};

/// Entry point for callers: candidate search and the resilient snapshot.
#[derive(Debug, Clone)]
pub struct WeatherService {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastProvider>,
    air_quality: Arc<dyn AirQualityProvider>,
    cache: ResilienceCache,
    preferences: Preferences,
}

impl WeatherService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        forecast: Arc<dyn ForecastProvider>,
        air_quality: Arc<dyn AirQualityProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            geocoder,
            forecast,
            air_quality,
            cache: ResilienceCache::new(Arc::clone(&store)),
            preferences: Preferences::new(store),
        }
    }

    /// Wire the Open-Meteo adapters from config, sharing one HTTP client.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let http = http_client_from_config(config)?;
        let endpoints = config.endpoints();

        Ok(Self::new(
            Arc::new(OpenMeteoGeocoder::new(http.clone(), endpoints.geocoding)),
            Arc::new(OpenMeteoForecast::new(http.clone(), endpoints.forecast)),
            Arc::new(OpenMeteoAirQuality::new(http, endpoints.air_quality)),
            store,
        ))
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn cache(&self) -> &ResilienceCache {
        &self.cache
    }

    pub async fn search(&self, query: &str) -> Vec<Location> {
        self.geocoder.search(query).await
    }

    /// Live snapshot for `query`, or the last stored one when the live run
    /// fails. Fails only when both are unavailable.
    pub async fn get_snapshot(
        &self,
        query: &str,
        units: UnitSystem,
    ) -> Result<ServedSnapshot, WeatherError> {
        let served = self.cache.run(self.fetch_live(query, units)).await?;

        if !served.is_offline() {
            let city = &served.snapshot.current.location.name;
            if let Err(e) = self.preferences.set_last_city(city) {
                tracing::warn!("Failed to remember last city: {e:#}");
            }
        }

        Ok(served)
    }

    /// Live current conditions for two cities, resolved one after the other.
    /// Bypasses the cache: either city failing fails the comparison.
    pub async fn compare(
        &self,
        first: &str,
        second: &str,
        units: UnitSystem,
    ) -> Result<(CurrentConditions, CurrentConditions), WeatherError> {
        let a = self.current_for(first, units).await?;
        let b = self.current_for(second, units).await?;
        Ok((a, b))
    }

    async fn current_for(
        &self,
        query: &str,
        units: UnitSystem,
    ) -> Result<CurrentConditions, WeatherError> {
        let location = self.resolve(query).await?;
        self.forecast.fetch_current(&location, units).await
    }

    /// First geocoding candidate for `query`.
    async fn resolve(&self, query: &str) -> Result<Location, WeatherError> {
        self.geocoder
            .search(query)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::LocationNotFound(query.trim().to_string()))
    }

    /// Geocode, then forecast, then air quality, one after the other.
    async fn fetch_live(
        &self,
        query: &str,
        units: UnitSystem,
    ) -> Result<ServedSnapshot, WeatherError> {
        let location = self.resolve(query).await?;

        let current = self.forecast.fetch_current(&location, units).await?;
        let forecast = self.forecast.fetch_forecast(&location, units).await?;
        let air_quality = self.air_quality.fetch_index(&location).await;

        let provenance = if air_quality.available {
            Provenance::Live
        } else {
            Provenance::Degraded
        };

        tracing::info!(
            location = %location.display_name(),
            %units,
            hourly = forecast.hourly.len(),
            daily = forecast.daily.len(),
            ?provenance,
            "fetched live snapshot"
        );

        Ok(ServedSnapshot {
            snapshot: Snapshot {
                current,
                hourly: forecast.hourly,
                daily: forecast.daily,
                air_quality,
                units,
                fetched_at: Utc::now(),
            },
            provenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codes,
        model::{AirQualityReading, Forecast},
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(&self, query: &str) -> Vec<Location> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.trim().is_empty() || query == "Atlantis" {
                return Vec::new();
            }
            ["GB", "CA"]
                .iter()
                .map(|cc| Location {
                    name: query.to_string(),
                    country_code: cc.to_string(),
                    admin_area: None,
                    latitude: 51.5,
                    longitude: -0.12,
                })
                .collect()
        }
    }

    /// Serves canned data until switched off.
    #[derive(Debug, Default)]
    struct FakeForecast {
        down: Mutex<bool>,
        requested: Mutex<Vec<(String, UnitSystem)>>,
    }

    impl FakeForecast {
        fn set_down(&self, down: bool) {
            *self.down.lock() = down;
        }

        fn check(&self, location: &Location, units: UnitSystem) -> Result<(), WeatherError> {
            self.requested
                .lock()
                .push((location.country_code.clone(), units));
            if *self.down.lock() {
                Err(WeatherError::UpstreamUnavailable("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[async_trait]
    impl ForecastProvider for FakeForecast {
        async fn fetch_current(
            &self,
            location: &Location,
            units: UnitSystem,
        ) -> Result<CurrentConditions, WeatherError> {
            self.check(location, units)?;
            Ok(CurrentConditions {
                location: location.clone(),
                observed_at: at("2024-05-01T12:00:00+01:00"),
                temperature: 21.0,
                feels_like: 20.0,
                humidity_pct: 45,
                pressure_hpa: 1015.0,
                wind_speed: 3.0,
                wind_direction_deg: 90.0,
                visibility_meters: 12_000.0,
                uv_index: Some(4.0),
                condition: codes::decode(0),
                sunrise: at("2024-05-01T05:30:00+01:00"),
                sunset: at("2024-05-01T20:30:00+01:00"),
                utc_offset_seconds: 3600,
            })
        }

        async fn fetch_forecast(
            &self,
            location: &Location,
            units: UnitSystem,
        ) -> Result<Forecast, WeatherError> {
            self.check(location, units)?;
            Ok(Forecast::default())
        }
    }

    #[derive(Debug)]
    struct FixedAirQuality(AirQualityReading);

    #[async_trait]
    impl AirQualityProvider for FixedAirQuality {
        async fn fetch_index(&self, _location: &Location) -> AirQualityReading {
            self.0
        }
    }

    struct Harness {
        service: WeatherService,
        geocoder: Arc<FakeGeocoder>,
        forecast: Arc<FakeForecast>,
    }

    fn harness(air: AirQualityReading) -> Harness {
        let geocoder = Arc::new(FakeGeocoder::default());
        let forecast = Arc::new(FakeForecast::default());
        let service = WeatherService::new(
            geocoder.clone(),
            forecast.clone(),
            Arc::new(FixedAirQuality(air)),
            Arc::new(MemoryStore::new()),
        );
        Harness {
            service,
            geocoder,
            forecast,
        }
    }

    #[tokio::test]
    async fn live_run_uses_first_candidate_and_requested_units() {
        let h = harness(AirQualityReading::from_index(30.0));

        let served = h
            .service
            .get_snapshot("London", UnitSystem::Imperial)
            .await
            .unwrap();

        assert_eq!(served.provenance, Provenance::Live);
        assert_eq!(served.snapshot.current.location.country_code, "GB");
        assert_eq!(served.snapshot.units, UnitSystem::Imperial);
        assert_eq!(
            *h.forecast.requested.lock(),
            vec![
                ("GB".to_string(), UnitSystem::Imperial),
                ("GB".to_string(), UnitSystem::Imperial),
            ]
        );
        assert_eq!(
            h.service.preferences().last_city().unwrap().as_deref(),
            Some("London")
        );
    }

    #[tokio::test]
    async fn air_quality_outage_is_degraded_not_fatal() {
        let h = harness(AirQualityReading::unavailable());

        let served = h.service.get_snapshot("London", UnitSystem::Metric).await.unwrap();

        assert_eq!(served.provenance, Provenance::Degraded);
        assert!(served.is_degraded());
        assert!(!served.is_offline());
        assert_eq!(served.snapshot.air_quality.category_level, 1);
        assert!(h.service.cache().last_snapshot().is_some());
    }

    #[tokio::test]
    async fn forecast_outage_falls_back_to_previous_snapshot() {
        let h = harness(AirQualityReading::from_index(30.0));
        let first = h.service.get_snapshot("London", UnitSystem::Metric).await.unwrap();

        h.forecast.set_down(true);
        let second = h.service.get_snapshot("Paris", UnitSystem::Metric).await.unwrap();

        assert!(second.is_offline());
        assert_eq!(second.snapshot, first.snapshot);
        assert_eq!(second.snapshot.fetched_at, first.snapshot.fetched_at);
        // An offline answer does not move the last city.
        assert_eq!(
            h.service.preferences().last_city().unwrap().as_deref(),
            Some("London")
        );
    }

    #[tokio::test]
    async fn unknown_city_without_cache_is_cache_miss() {
        let h = harness(AirQualityReading::from_index(30.0));

        let err = h
            .service
            .get_snapshot("Atlantis", UnitSystem::Metric)
            .await
            .unwrap_err();

        match err {
            WeatherError::CacheMiss { source } => match *source {
                WeatherError::LocationNotFound(query) => assert_eq!(query, "Atlantis"),
                other => panic!("unexpected source: {other:?}"),
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(h.forecast.requested.lock().is_empty());
    }

    #[tokio::test]
    async fn unknown_city_with_cache_serves_cache() {
        let h = harness(AirQualityReading::from_index(30.0));
        h.service.get_snapshot("London", UnitSystem::Metric).await.unwrap();

        let served = h.service.get_snapshot("Atlantis", UnitSystem::Metric).await.unwrap();
        assert!(served.is_offline());
        assert_eq!(served.snapshot.current.location.name, "London");
    }

    #[tokio::test]
    async fn forecast_failure_leaves_no_partial_snapshot() {
        let h = harness(AirQualityReading::from_index(30.0));
        h.forecast.set_down(true);

        assert!(h.service.get_snapshot("London", UnitSystem::Metric).await.is_err());
        assert_eq!(h.service.cache().last_snapshot(), None);
    }

    #[tokio::test]
    async fn search_delegates_to_geocoder() {
        let h = harness(AirQualityReading::from_index(30.0));
        let found = h.service.search("London").await;

        assert_eq!(found.len(), 2);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn compare_fetches_both_cities_live() {
        let h = harness(AirQualityReading::from_index(30.0));

        let (a, b) = h
            .service
            .compare("Lisbon", "Madrid", UnitSystem::Metric)
            .await
            .unwrap();

        assert_eq!(a.location.name, "Lisbon");
        assert_eq!(b.location.name, "Madrid");
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.forecast.requested.lock().len(), 2);
        // Comparisons are not cached snapshots.
        assert_eq!(h.service.cache().last_snapshot(), None);
        assert_eq!(h.service.preferences().last_city().unwrap(), None);
    }

    #[tokio::test]
    async fn compare_fails_when_either_city_is_unknown() {
        let h = harness(AirQualityReading::from_index(30.0));
        h.service.get_snapshot("London", UnitSystem::Metric).await.unwrap();

        let err = h
            .service
            .compare("London", "Atlantis", UnitSystem::Metric)
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::LocationNotFound(ref q) if q == "Atlantis"));
    }

    #[tokio::test]
    async fn compare_does_not_fall_back_to_cache() {
        let h = harness(AirQualityReading::from_index(30.0));
        h.service.get_snapshot("London", UnitSystem::Metric).await.unwrap();
        h.forecast.set_down(true);

        let err = h
            .service
            .compare("London", "Paris", UnitSystem::Metric)
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamUnavailable(_)));
    }
}
