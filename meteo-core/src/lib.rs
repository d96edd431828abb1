//! Core library for the `meteo` weather tool.
//!
//! This crate defines:
//! - The canonical weather model (locations, conditions, snapshots)
//! - Open-Meteo adapters for geocoding, forecast and air quality
//! - Derived attributes (comfort status, theme, alerts)
//! - A single-slot offline fallback around the fetch pipeline
//! - Configuration and key-value backed preferences
//!
//! It is used by `meteo-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod codes;
pub mod config;
pub mod derive;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;

pub use cache::ResilienceCache;
pub use config::{Config, Endpoints};
pub use error::WeatherError;
pub use model::{
    AirQualityReading, ConditionCode, ConditionFamily, CurrentConditions, DailySummary, Forecast,
    HourlyPoint, Location, Provenance, ServedSnapshot, Snapshot, UnitSystem,
};
pub use provider::{AirQualityProvider, ForecastProvider, Geocoder};
pub use service::WeatherService;
pub use store::{FileStore, KeyValueStore, MemoryStore, Preferences, Theme};
