use crate::{
    Config, Coordinates, Forecast, LocationCandidate, WeatherError,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of geocoding results and forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve a free-text place name; an empty list means nothing matched.
    async fn geocode(&self, query: &str) -> Result<Vec<LocationCandidate>, WeatherError>;

    /// Current conditions and the daily outlook for a point.
    async fn forecast(&self, coords: Coordinates) -> Result<Forecast, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    if config.openweather.api_key.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "No API key configured for OpenWeather.\n\
             Hint: set {} or run `weather-bot configure`.",
            crate::config::API_KEY_ENV
        ));
    }

    let provider = OpenWeatherProvider::from_config(&config.openweather)?;
    Ok(Box::new(provider))
}
