use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    model::UnitSystem,
    provider::{
        air_quality::DEFAULT_AIR_QUALITY_URL, forecast::DEFAULT_FORECAST_URL,
        geocoding::DEFAULT_GEOCODING_URL,
    },
};

pub const DEFAULT_CITY: &str = "London";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Base URLs of the upstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub geocoding: String,
    pub forecast: String,
    pub air_quality: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: DEFAULT_GEOCODING_URL.to_string(),
            forecast: DEFAULT_FORECAST_URL.to_string(),
            air_quality: DEFAULT_AIR_QUALITY_URL.to_string(),
        }
    }
}

/// Optional overrides for individual endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointOverrides {
    pub geocoding: Option<String>,
    pub forecast: Option<String>,
    pub air_quality: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// "metric" or "imperial".
    pub default_units: Option<String>,

    pub default_city: Option<String>,

    pub request_timeout_secs: Option<u64>,

    /// Example TOML:
    /// [endpoints]
    /// forecast = "http://localhost:8080/v1"
    #[serde(default)]
    pub endpoints: EndpointOverrides,
}

impl Config {
    /// Configured unit system, metric when unset.
    pub fn default_units(&self) -> Result<UnitSystem> {
        match self.default_units.as_deref() {
            Some(s) => UnitSystem::try_from(s),
            None => Ok(UnitSystem::default()),
        }
    }

    pub fn set_default_units(&mut self, units: UnitSystem) {
        self.default_units = Some(units.as_str().to_string());
    }

    pub fn default_city(&self) -> &str {
        self.default_city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CITY)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Effective endpoints after applying overrides.
    pub fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        Endpoints {
            geocoding: self.endpoints.geocoding.clone().unwrap_or(defaults.geocoding),
            forecast: self.endpoints.forecast.clone().unwrap_or(defaults.forecast),
            air_quality: self.endpoints.air_quality.clone().unwrap_or(defaults.air_quality),
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        // Reject bad unit names at load time rather than on first use.
        cfg.default_units()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "meteo", "meteo")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the JSON file holding preferences and the cached snapshot.
    pub fn state_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("state.json"))
    }
}
