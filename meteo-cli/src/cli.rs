use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use meteo_core::{Config, FileStore, KeyValueStore, Preferences, UnitSystem, WeatherService};
use std::sync::Arc;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Weather CLI with offline fallback")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose default units and city.
    Configure,

    /// List locations matching a name.
    Search {
        query: String,
    },

    /// Show weather for a city, falling back to cached data when offline.
    Show {
        /// City name; defaults to the last city shown.
        city: Option<String>,

        /// "metric" or "imperial"; defaults to the saved preference.
        #[arg(long)]
        units: Option<String>,
    },

    /// Save the preferred unit system.
    Units {
        units: String,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Compare current conditions in two cities side by side.
    Compare {
        first: String,
        second: String,

        /// "metric" or "imperial"; defaults to the saved preference.
        #[arg(long)]
        units: Option<String>,
    },

    /// Show the theme preference, or toggle it.
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum ThemeAction {
    /// Switch between light and dark.
    Toggle,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum FavoritesAction {
    List,
    Add { city: String },
    Remove { city: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(Config::state_file_path()?));
        let prefs = Preferences::new(Arc::clone(&store));

        match self.command {
            Command::Configure => configure(config)?,
            Command::Search { query } => {
                let service = WeatherService::from_config(&config, store)?;
                let found = service.search(&query).await;
                if found.is_empty() {
                    println!("No locations found for '{query}'.");
                }
                for (i, loc) in found.iter().enumerate() {
                    println!(
                        "{}. {} ({:.2}, {:.2})",
                        i + 1,
                        loc.display_name(),
                        loc.latitude,
                        loc.longitude
                    );
                }
            }
            Command::Show { city, units } => {
                let units = resolve_units(units.as_deref(), &prefs, &config)?;
                let city = match city {
                    Some(c) => c,
                    None => prefs
                        .last_city()?
                        .unwrap_or_else(|| config.default_city().to_string()),
                };

                let service = WeatherService::from_config(&config, store)?;
                let served = service
                    .get_snapshot(&city, units)
                    .await
                    .map_err(|e| {
                        let msg = e.user_message();
                        anyhow::Error::new(e).context(msg)
                    })?;

                let favorite = prefs.is_favorite(&served.snapshot.current.location.name)?;
                render::snapshot(&served, prefs.theme()?, favorite);
            }
            Command::Units { units } => {
                let units = UnitSystem::try_from(units.as_str())?;
                prefs.set_units(units)?;
                println!("Units set to {units}.");
            }
            Command::Favorites { action } => match action.unwrap_or(FavoritesAction::List) {
                FavoritesAction::List => {
                    let favs = prefs.favorites()?;
                    if favs.is_empty() {
                        println!("No favorites added yet.");
                    }
                    for city in favs {
                        println!("* {city}");
                    }
                }
                FavoritesAction::Add { city } => {
                    if prefs.add_favorite(&city)? {
                        println!("Added {city} to favorites.");
                    } else {
                        println!("{city} is already a favorite.");
                    }
                }
                FavoritesAction::Remove { city } => {
                    if prefs.remove_favorite(&city)? {
                        println!("Removed {city} from favorites.");
                    } else {
                        println!("{city} is not a favorite.");
                    }
                }
            },
            Command::Compare {
                first,
                second,
                units,
            } => {
                let units = resolve_units(units.as_deref(), &prefs, &config)?;
                let service = WeatherService::from_config(&config, store)?;
                let (a, b) = service
                    .compare(&first, &second, units)
                    .await
                    .map_err(|e| {
                        let msg = e.user_message();
                        anyhow::Error::new(e).context(msg)
                    })?;

                render::comparison(&a, &b, units);
            }
            Command::Theme { action } => {
                let theme = match action {
                    Some(ThemeAction::Toggle) => prefs.toggle_theme()?,
                    None => prefs.theme()?,
                };
                println!("Theme: {theme}");
            }
        }

        Ok(())
    }
}

/// Explicit flag, then the saved preference, then the config default.
fn resolve_units(
    flag: Option<&str>,
    prefs: &Preferences,
    config: &Config,
) -> anyhow::Result<UnitSystem> {
    if let Some(u) = flag {
        return UnitSystem::try_from(u);
    }
    match prefs.stored_units()? {
        Some(u) => Ok(u),
        None => config.default_units(),
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let units = Select::new("Default unit system:", UnitSystem::all().to_vec())
        .prompt()
        .context("Unit selection cancelled")?;

    let city = Text::new("Default city:")
        .with_default(config.default_city())
        .prompt()
        .context("City input cancelled")?;

    config.set_default_units(units);
    config.default_city = Some(city.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
