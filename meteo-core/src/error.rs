//! Error taxonomy of the weather pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    /// The geocoder returned no candidates for the query.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Transport, status or parse failure of a required upstream call.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The live run failed and there is no stored snapshot to fall back on.
    #[error("No weather data available: {source}")]
    CacheMiss {
        #[source]
        source: Box<WeatherError>,
    },
}

impl WeatherError {
    /// Wrap an adapter error, keeping its whole context chain in the message.
    pub fn upstream(err: anyhow::Error) -> Self {
        Self::UpstreamUnavailable(format!("{err:#}"))
    }

    pub fn cache_miss(source: WeatherError) -> Self {
        Self::CacheMiss {
            source: Box::new(source),
        }
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::LocationNotFound(query) => format!("City not found: {query}"),
            Self::UpstreamUnavailable(_) => {
                "Weather service unavailable. Check your connection.".to_string()
            }
            Self::CacheMiss { source } => match source.as_ref() {
                Self::LocationNotFound(query) => {
                    format!("City not found: {query}, and no cached data is available.")
                }
                _ => "Weather service unavailable, and no cached data is available.".to_string(),
            },
        }
    }
}
