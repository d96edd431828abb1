use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Unit system requested from the upstream forecast endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }

    /// Value of the upstream `temperature_unit` parameter.
    pub fn temperature_param(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "celsius",
            UnitSystem::Imperial => "fahrenheit",
        }
    }

    /// Value of the upstream `windspeed_unit` parameter.
    pub fn wind_speed_param(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "ms",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_speed_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported unit systems: metric, imperial."
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country_code: String,
    pub admin_area: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// "Name, Admin, CC" with the admin area left out when unknown.
    pub fn display_name(&self) -> String {
        match self.admin_area.as_deref().filter(|a| !a.is_empty()) {
            Some(admin) => format!("{}, {}, {}", self.name, admin, self.country_code),
            None => format!("{}, {}", self.name, self.country_code),
        }
    }
}

/// Grouping of condition ids used by theme and alert logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionFamily {
    Clear,
    Clouds,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
}

impl ConditionFamily {
    /// Family of an internal condition id, by contiguous id band.
    /// Ids outside every band are treated as clear.
    pub fn from_internal_id(id: u16) -> Self {
        match id {
            200..=232 => Self::Thunderstorm,
            300..=321 => Self::Drizzle,
            500..=531 => Self::Rain,
            600..=622 => Self::Snow,
            700..=781 => Self::Fog,
            801..=804 => Self::Clouds,
            _ => Self::Clear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

impl fmt::Display for ConditionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical weather condition. Built by [`crate::codes::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCode {
    pub(crate) internal_id: u16,
    pub(crate) family: ConditionFamily,
    pub(crate) description: String,
    pub(crate) icon_key: String,
}

impl ConditionCode {
    pub fn internal_id(&self) -> u16 {
        self.internal_id
    }

    pub fn family(&self) -> ConditionFamily {
        self.family
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn icon_key(&self) -> &str {
        &self.icon_key
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: Location,
    pub observed_at: DateTime<FixedOffset>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed: f64,
    pub wind_direction_deg: f64,
    pub visibility_meters: f64,
    pub uv_index: Option<f64>,
    pub condition: ConditionCode,
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
    pub utc_offset_seconds: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub temperature: f64,
    pub condition: ConditionCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub timestamp: DateTime<FixedOffset>,
    pub temperature: f64,
    pub condition: ConditionCode,
}

/// Hourly series plus the noon-sampled daily series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailySummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    /// 1 (good) ..= 5 (very poor).
    pub category_level: u8,
    pub raw_index: Option<f64>,
    /// False when the reading is the level-1 stand-in for a failed fetch.
    pub available: bool,
}

impl AirQualityReading {
    pub fn from_index(index: f64) -> Self {
        Self {
            category_level: category_level(index),
            raw_index: Some(index),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            category_level: 1,
            raw_index: None,
            available: false,
        }
    }

    pub fn category_label(&self) -> &'static str {
        match self.category_level {
            0 | 1 => "Good",
            2 => "Fair",
            3 => "Moderate",
            4 => "Poor",
            _ => "Very Poor",
        }
    }
}

/// US AQI (0-500) to the 5-level ordinal scale.
pub fn category_level(index: f64) -> u8 {
    if index > 200.0 {
        5
    } else if index > 150.0 {
        4
    } else if index > 100.0 {
        3
    } else if index > 50.0 {
        2
    } else {
        1
    }
}

/// Everything one successful pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailySummary>,
    pub air_quality: AirQualityReading,
    pub units: UnitSystem,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Provenance {
    Live,
    /// Live forecast, but air quality fell back to the optimistic default.
    Degraded,
    /// The live run failed; this is the last stored snapshot.
    Cached { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServedSnapshot {
    pub snapshot: Snapshot,
    pub provenance: Provenance,
}

impl ServedSnapshot {
    pub fn is_offline(&self) -> bool {
        matches!(self.provenance, Provenance::Cached { .. })
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self.provenance, Provenance::Live)
    }
}
