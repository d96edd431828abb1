use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;

use crate::{
    WeatherError, codes,
    model::{CurrentConditions, DailySummary, Forecast, HourlyPoint, Location, UnitSystem},
};

use super::{ForecastProvider, get_json, parse_local_time};

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1";
pub const MAX_DAILY_ENTRIES: usize = 7;

const DEFAULT_HUMIDITY_PCT: f64 = 0.0;
const DEFAULT_PRESSURE_HPA: f64 = 1013.0;
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    http: Client,
    base_url: String,
}

impl OpenMeteoForecast {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/forecast", self.base_url.trim_end_matches('/'))
    }

    async fn try_fetch_current(
        &self,
        location: &Location,
        units: UnitSystem,
    ) -> Result<CurrentConditions> {
        let parsed: OmCurrentResponse = get_json(
            &self.http,
            &self.url(),
            &[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current_weather", "true".to_string()),
                (
                    "hourly",
                    "relativehumidity_2m,surface_pressure,visibility,apparent_temperature"
                        .to_string(),
                ),
                ("daily", "sunrise,sunset,uv_index_max".to_string()),
                ("timezone", "auto".to_string()),
                ("temperature_unit", units.temperature_param().to_string()),
                ("windspeed_unit", units.wind_speed_param().to_string()),
            ],
            "current weather",
        )
        .await?;

        build_current(parsed, location, Utc::now())
    }

    async fn try_fetch_forecast(&self, location: &Location, units: UnitSystem) -> Result<Forecast> {
        let parsed: OmSeriesResponse = get_json(
            &self.http,
            &self.url(),
            &[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("hourly", "temperature_2m,weathercode".to_string()),
                ("timezone", "auto".to_string()),
                ("temperature_unit", units.temperature_param().to_string()),
            ],
            "forecast",
        )
        .await?;

        build_forecast(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: i32,
    #[serde(default)]
    time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OmConditionsHourly {
    #[serde(default)]
    relativehumidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    surface_pressure: Vec<Option<f64>>,
    #[serde(default)]
    visibility: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    sunrise: Vec<String>,
    sunset: Vec<String>,
    #[serde(default)]
    uv_index_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentResponse {
    utc_offset_seconds: i32,
    current_weather: OmCurrentWeather,
    #[serde(default)]
    hourly: OmConditionsHourly,
    daily: OmDaily,
}

#[derive(Debug, Deserialize)]
struct OmSeriesHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct OmSeriesResponse {
    utc_offset_seconds: i32,
    hourly: OmSeriesHourly,
}

fn utc_offset(seconds: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(seconds)
        .with_context(|| format!("Open-Meteo returned an invalid UTC offset: {seconds}s"))
}

fn value_at(series: &[Option<f64>], idx: usize) -> Option<f64> {
    series.get(idx).copied().flatten()
}

/// Hourly values are read at the location's current local hour, since
/// the hourly arrays start at local midnight of the current day.
fn build_current(
    resp: OmCurrentResponse,
    location: &Location,
    now: DateTime<Utc>,
) -> Result<CurrentConditions> {
    let offset = utc_offset(resp.utc_offset_seconds)?;
    let hour = now.with_timezone(&offset).hour() as usize;
    let current = resp.current_weather;
    let hourly = &resp.hourly;

    let sunrise = resp
        .daily
        .sunrise
        .first()
        .and_then(|s| parse_local_time(s, offset))
        .context("Open-Meteo response contained no usable sunrise")?;
    let sunset = resp
        .daily
        .sunset
        .first()
        .and_then(|s| parse_local_time(s, offset))
        .context("Open-Meteo response contained no usable sunset")?;

    let observed_at = current
        .time
        .as_deref()
        .and_then(|s| parse_local_time(s, offset))
        .unwrap_or_else(|| now.with_timezone(&offset));

    let humidity = value_at(&hourly.relativehumidity_2m, hour).unwrap_or(DEFAULT_HUMIDITY_PCT);

    Ok(CurrentConditions {
        location: location.clone(),
        observed_at,
        temperature: current.temperature,
        feels_like: value_at(&hourly.apparent_temperature, hour).unwrap_or(current.temperature),
        humidity_pct: humidity.round().clamp(0.0, 100.0) as u8,
        pressure_hpa: value_at(&hourly.surface_pressure, hour).unwrap_or(DEFAULT_PRESSURE_HPA),
        wind_speed: current.windspeed,
        wind_direction_deg: current.winddirection,
        visibility_meters: value_at(&hourly.visibility, hour).unwrap_or(DEFAULT_VISIBILITY_M),
        uv_index: value_at(&resp.daily.uv_index_max, 0),
        condition: codes::decode(current.weathercode),
        sunrise,
        sunset,
        utc_offset_seconds: resp.utc_offset_seconds,
    })
}

/// Slots without a parsable time or a temperature are dropped.
///
/// Every slot gets the response's current UTC offset, so instants past a
/// DST change in the window are an hour off. Wall-clock fields (and with
/// them noon detection) are unaffected.
fn build_forecast(resp: OmSeriesResponse) -> Result<Forecast> {
    let offset = utc_offset(resp.utc_offset_seconds)?;
    let series = resp.hourly;

    let hourly: Vec<HourlyPoint> = series
        .time
        .iter()
        .enumerate()
        .filter_map(|(idx, time)| {
            let timestamp = parse_local_time(time, offset)?;
            let temperature = value_at(&series.temperature_2m, idx)?;
            let condition = match series.weathercode.get(idx).copied().flatten() {
                Some(code) => codes::decode(code),
                None => codes::unknown(),
            };
            Some(HourlyPoint {
                timestamp,
                temperature,
                condition,
            })
        })
        .collect();

    let daily = daily_from_hourly(&hourly);
    Ok(Forecast { hourly, daily })
}

fn is_noon(t: &DateTime<FixedOffset>) -> bool {
    t.hour() == 12 && t.minute() == 0 && t.second() == 0
}

/// One summary per local date, taken from the sample at exactly noon.
/// Dates without a noon sample are left out.
pub fn daily_from_hourly(hourly: &[HourlyPoint]) -> Vec<DailySummary> {
    let mut seen: HashSet<NaiveDate> = HashSet::new();

    hourly
        .iter()
        .filter(|p| is_noon(&p.timestamp))
        .filter(|p| seen.insert(p.timestamp.date_naive()))
        .take(MAX_DAILY_ENTRIES)
        .map(|p| DailySummary {
            timestamp: p.timestamp,
            temperature: p.temperature,
            condition: p.condition.clone(),
        })
        .collect()
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecast {
    async fn fetch_current(
        &self,
        location: &Location,
        units: UnitSystem,
    ) -> Result<CurrentConditions, WeatherError> {
        self.try_fetch_current(location, units)
            .await
            .map_err(WeatherError::upstream)
    }

    async fn fetch_forecast(
        &self,
        location: &Location,
        units: UnitSystem,
    ) -> Result<Forecast, WeatherError> {
        self.try_fetch_forecast(location, units)
            .await
            .map_err(WeatherError::upstream)
    }
}
