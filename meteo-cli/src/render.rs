use chrono::Utc;
use meteo_core::{
    CurrentConditions, Provenance, ServedSnapshot, Theme, UnitSystem,
    derive::{self, alerts, humidity_status, is_night, theme_class, visibility_status},
};

const HOURLY_ROWS: usize = 8;

pub fn snapshot(served: &ServedSnapshot, theme: Theme, favorite: bool) {
    let snap = &served.snapshot;
    let cur = &snap.current;
    let units = snap.units;
    let deg = units.temperature_symbol();

    match &served.provenance {
        Provenance::Live => {}
        Provenance::Degraded => println!("(air quality unavailable)"),
        Provenance::Cached { .. } => println!(
            "Offline mode: showing cached data from {}",
            snap.fetched_at.format("%Y-%m-%d %H:%M UTC")
        ),
    }

    let star = if favorite { " *" } else { "" };
    println!("{}{star}", cur.location.display_name());
    println!("{}", cur.observed_at.format("%A, %-d %b %H:%M"));
    println!(
        "{:.0}{deg}  {}  (feels like {:.0}{deg})",
        cur.temperature,
        cur.condition.description(),
        cur.feels_like
    );
    println!();

    println!(
        "Wind        {} {} {}",
        cur.wind_speed,
        units.wind_speed_symbol(),
        derive::wind_direction(cur.wind_direction_deg)
    );
    println!(
        "Humidity    {}% ({})",
        cur.humidity_pct,
        humidity_status(cur.humidity_pct)
    );
    println!(
        "Visibility  {:.1} km ({})",
        cur.visibility_meters / 1000.0,
        visibility_status(cur.visibility_meters)
    );
    println!("Pressure    {:.0} hPa", cur.pressure_hpa);
    match cur.uv_index {
        Some(uv) => println!("UV index    {uv}"),
        None => println!("UV index    N/A"),
    }
    if snap.air_quality.available {
        println!(
            "Air quality {} ({})",
            snap.air_quality.category_level,
            snap.air_quality.category_label()
        );
    } else {
        println!("Air quality --");
    }
    println!(
        "Sunrise     {}   Sunset {}",
        cur.sunrise.format("%H:%M"),
        cur.sunset.format("%H:%M")
    );

    let night = is_night(Utc::now(), cur.sunrise, cur.sunset);
    let class = theme_class(cur.condition.family(), night, theme.is_dark());
    if let Some(css) = class.css_class() {
        println!("Theme       {css}");
    }

    if !snap.hourly.is_empty() {
        println!();
        println!("Next hours:");
        for p in snap.hourly.iter().take(HOURLY_ROWS) {
            println!(
                "  {}  {:>4.0}{deg}  {}",
                p.timestamp.format("%H:%M"),
                p.temperature,
                p.condition.description()
            );
        }
    }

    if !snap.daily.is_empty() {
        println!();
        println!("Daily (noon):");
        for d in &snap.daily {
            println!(
                "  {}  {:>4.0}{deg}  {}",
                d.timestamp.format("%a %-d %b"),
                d.temperature,
                d.condition.description()
            );
        }
    }

    let warnings = alerts(snap);
    if !warnings.is_empty() {
        println!();
        for alert in warnings {
            println!("! {alert}");
        }
    }
}

/// Two columns of current conditions, one per city.
pub fn comparison(a: &CurrentConditions, b: &CurrentConditions, units: UnitSystem) {
    let deg = units.temperature_symbol();
    let wind = units.wind_speed_symbol();

    let rows = [
        ("", a.location.display_name(), b.location.display_name()),
        (
            "Temperature",
            format!("{:.0}{deg}", a.temperature),
            format!("{:.0}{deg}", b.temperature),
        ),
        (
            "Feels like",
            format!("{:.0}{deg}", a.feels_like),
            format!("{:.0}{deg}", b.feels_like),
        ),
        (
            "Conditions",
            a.condition.description().to_string(),
            b.condition.description().to_string(),
        ),
        (
            "Humidity",
            format!("{}%", a.humidity_pct),
            format!("{}%", b.humidity_pct),
        ),
        (
            "Wind",
            format!("{} {wind}", a.wind_speed),
            format!("{} {wind}", b.wind_speed),
        ),
        (
            "Pressure",
            format!("{:.0} hPa", a.pressure_hpa),
            format!("{:.0} hPa", b.pressure_hpa),
        ),
    ];

    let width = rows.iter().map(|(_, left, _)| left.len()).max().unwrap_or(0);
    for (label, left, right) in rows {
        println!("{label:<12}{left:<width$}  {right}");
    }
}
