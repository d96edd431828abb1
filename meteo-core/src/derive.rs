//! Secondary attributes computed from the canonical model. No I/O.

use chrono::{DateTime, TimeZone};
use std::fmt;

use crate::model::{ConditionFamily, Snapshot};

pub const HEAT_THRESHOLD: f64 = 35.0;
pub const FREEZE_THRESHOLD: f64 = 0.0;
/// Compared against the raw wind speed in whatever unit the snapshot uses.
pub const HIGH_WIND_THRESHOLD: f64 = 15.0;
pub const POOR_AIR_QUALITY_LEVEL: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityStatus {
    Dry,
    Comfortable,
    Humid,
}

impl HumidityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dry => "Dry",
            Self::Comfortable => "Comfortable",
            Self::Humid => "Humid",
        }
    }
}

impl fmt::Display for HumidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn humidity_status(pct: u8) -> HumidityStatus {
    if pct < 30 {
        HumidityStatus::Dry
    } else if pct < 60 {
        HumidityStatus::Comfortable
    } else {
        HumidityStatus::Humid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityStatus {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl VisibilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for VisibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn visibility_status(meters: f64) -> VisibilityStatus {
    if meters > 10_000.0 {
        VisibilityStatus::Excellent
    } else if meters > 5_000.0 {
        VisibilityStatus::Good
    } else if meters > 2_000.0 {
        VisibilityStatus::Moderate
    } else {
        VisibilityStatus::Poor
    }
}

/// Night is after today's sunset or before today's sunrise. A sunset
/// falling after local midnight is not accounted for.
pub fn is_night<A, B, C>(now: DateTime<A>, sunrise: DateTime<B>, sunset: DateTime<C>) -> bool
where
    A: TimeZone,
    B: TimeZone,
    C: TimeZone,
{
    let now = now.timestamp();
    now > sunset.timestamp() || now < sunrise.timestamp()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeClass {
    Dark,
    Night,
    Rain,
    Snow,
    Sunny,
    Neutral,
}

impl ThemeClass {
    /// Stylesheet class to apply, if any.
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Self::Dark => Some("dark-mode"),
            Self::Rain => Some("theme-rain"),
            Self::Snow => Some("theme-snow"),
            Self::Sunny => Some("theme-sunny"),
            Self::Night | Self::Neutral => None,
        }
    }
}

pub fn theme_class(family: ConditionFamily, is_night: bool, dark_mode: bool) -> ThemeClass {
    if dark_mode {
        return ThemeClass::Dark;
    }
    if is_night {
        return ThemeClass::Night;
    }

    match family {
        ConditionFamily::Thunderstorm | ConditionFamily::Drizzle | ConditionFamily::Rain => {
            ThemeClass::Rain
        }
        ConditionFamily::Snow => ThemeClass::Snow,
        ConditionFamily::Clear => ThemeClass::Sunny,
        ConditionFamily::Clouds | ConditionFamily::Fog => ThemeClass::Neutral,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    ExtremeHeat,
    Freezing,
    HighWind,
    PoorAirQuality,
    Thunderstorm,
    Rain,
}

impl Alert {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ExtremeHeat => "Extreme Heat Warning: Stay hydrated!",
            Self::Freezing => "Freezing Warning: Wear warm clothes!",
            Self::HighWind => "High Wind Warning",
            Self::PoorAirQuality => "Poor Air Quality Warning",
            Self::Thunderstorm => "Thunderstorm Alert",
            Self::Rain => "Rain Warning",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Every applicable alert, always in the same order.
pub fn alerts(snapshot: &Snapshot) -> Vec<Alert> {
    let current = &snapshot.current;
    let family = current.condition.family();

    let checks = [
        (current.temperature > HEAT_THRESHOLD, Alert::ExtremeHeat),
        (current.temperature < FREEZE_THRESHOLD, Alert::Freezing),
        (current.wind_speed > HIGH_WIND_THRESHOLD, Alert::HighWind),
        (
            snapshot.air_quality.category_level >= POOR_AIR_QUALITY_LEVEL,
            Alert::PoorAirQuality,
        ),
        (family == ConditionFamily::Thunderstorm, Alert::Thunderstorm),
        (family == ConditionFamily::Rain, Alert::Rain),
    ];

    checks
        .into_iter()
        .filter_map(|(hit, alert)| hit.then_some(alert))
        .collect()
}

/// 8-point compass direction for a bearing in degrees.
pub fn wind_direction(deg: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let sector = (deg.rem_euclid(360.0) / 45.0).round() as usize % 8;
    DIRECTIONS[sector]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codes,
        model::{AirQualityReading, CurrentConditions, Location, UnitSystem},
    };
    use chrono::{FixedOffset, Utc};

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn snapshot(temp: f64, wind: f64, aqi_level: u8, wmo: i32) -> Snapshot {
        Snapshot {
            current: CurrentConditions {
                location: Location {
                    name: "Test".into(),
                    country_code: "TT".into(),
                    admin_area: None,
                    latitude: 0.0,
                    longitude: 0.0,
                },
                observed_at: at("2024-07-01T12:00:00+00:00"),
                temperature: temp,
                feels_like: temp,
                humidity_pct: 50,
                pressure_hpa: 1013.0,
                wind_speed: wind,
                wind_direction_deg: 0.0,
                visibility_meters: 10_000.0,
                uv_index: None,
                condition: codes::decode(wmo),
                sunrise: at("2024-07-01T05:00:00+00:00"),
                sunset: at("2024-07-01T21:00:00+00:00"),
                utc_offset_seconds: 0,
            },
            hourly: Vec::new(),
            daily: Vec::new(),
            air_quality: AirQualityReading {
                category_level: aqi_level,
                raw_index: None,
                available: true,
            },
            units: UnitSystem::Metric,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn humidity_boundaries() {
        assert_eq!(humidity_status(0), HumidityStatus::Dry);
        assert_eq!(humidity_status(29), HumidityStatus::Dry);
        assert_eq!(humidity_status(30), HumidityStatus::Comfortable);
        assert_eq!(humidity_status(59), HumidityStatus::Comfortable);
        assert_eq!(humidity_status(60), HumidityStatus::Humid);
        assert_eq!(humidity_status(100).as_str(), "Humid");
    }

    #[test]
    fn visibility_boundaries() {
        assert_eq!(visibility_status(10_001.0), VisibilityStatus::Excellent);
        assert_eq!(visibility_status(10_000.0), VisibilityStatus::Good);
        assert_eq!(visibility_status(5_000.0), VisibilityStatus::Moderate);
        assert_eq!(visibility_status(2_000.0), VisibilityStatus::Poor);
        assert_eq!(visibility_status(0.0).as_str(), "Poor");
    }

    #[test]
    fn night_outside_daylight_window() {
        let sunrise = at("2024-07-01T05:00:00+02:00");
        let sunset = at("2024-07-01T21:00:00+02:00");

        assert!(is_night(at("2024-07-01T04:59:00+02:00"), sunrise, sunset));
        assert!(!is_night(at("2024-07-01T12:00:00+02:00"), sunrise, sunset));
        assert!(is_night(at("2024-07-01T21:01:00+02:00"), sunrise, sunset));
        // Same instant expressed in UTC.
        let noon_utc = at("2024-07-01T10:00:00+00:00").with_timezone(&Utc);
        assert!(!is_night(noon_utc, sunrise, sunset));
    }

    #[test]
    fn dark_mode_overrides_everything() {
        assert_eq!(theme_class(ConditionFamily::Snow, false, true), ThemeClass::Dark);
        assert_eq!(theme_class(ConditionFamily::Clear, true, true), ThemeClass::Dark);
        assert_eq!(ThemeClass::Dark.css_class(), Some("dark-mode"));
    }

    #[test]
    fn night_suppresses_weather_theme() {
        let theme = theme_class(ConditionFamily::Rain, true, false);
        assert_eq!(theme, ThemeClass::Night);
        assert_eq!(theme.css_class(), None);
    }

    #[test]
    fn daytime_theme_by_family() {
        for family in [
            ConditionFamily::Thunderstorm,
            ConditionFamily::Drizzle,
            ConditionFamily::Rain,
        ] {
            assert_eq!(theme_class(family, false, false), ThemeClass::Rain);
        }
        assert_eq!(theme_class(ConditionFamily::Snow, false, false), ThemeClass::Snow);
        assert_eq!(theme_class(ConditionFamily::Clear, false, false), ThemeClass::Sunny);
        assert_eq!(theme_class(ConditionFamily::Clouds, false, false), ThemeClass::Neutral);
        assert_eq!(theme_class(ConditionFamily::Fog, false, false), ThemeClass::Neutral);
    }

    #[test]
    fn stormy_hot_windy_smoggy_day_raises_every_applicable_alert() {
        let snap = snapshot(36.0, 20.0, 4, 95);
        let expected = vec![
            Alert::ExtremeHeat,
            Alert::HighWind,
            Alert::PoorAirQuality,
            Alert::Thunderstorm,
        ];

        assert_eq!(alerts(&snap), expected);
        assert_eq!(alerts(&snap), expected);
    }

    #[test]
    fn freezing_rain() {
        assert_eq!(alerts(&snapshot(-2.0, 3.0, 1, 63)), vec![Alert::Freezing, Alert::Rain]);
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert!(alerts(&snapshot(35.0, 15.0, 3, 0)).is_empty());
        assert!(alerts(&snapshot(0.0, 0.0, 1, 3)).is_empty());
    }

    #[test]
    fn drizzle_is_not_a_rain_alert() {
        assert!(alerts(&snapshot(12.0, 2.0, 1, 53)).is_empty());
    }

    #[test]
    fn alert_messages() {
        assert_eq!(Alert::HighWind.to_string(), "High Wind Warning");
        assert!(Alert::ExtremeHeat.message().contains("Heat"));
    }

    #[test]
    fn compass_directions() {
        assert_eq!(wind_direction(0.0), "N");
        assert_eq!(wind_direction(22.0), "N");
        assert_eq!(wind_direction(23.0), "NE");
        assert_eq!(wind_direction(180.0), "S");
        assert_eq!(wind_direction(225.0), "SW");
        assert_eq!(wind_direction(350.0), "N");
        assert_eq!(wind_direction(-90.0), "W");
    }
}
