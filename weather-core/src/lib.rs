//! Core library for the OpenWeather Telegram bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the weather provider (geocoding + one-call forecast)
//! - Shared domain models (location candidates, forecasts, button payloads)
//!
//! It is used by `weather-bot`, but carries no chat-transport dependencies.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, OpenWeatherConfig, TelegramConfig};
pub use error::WeatherError;
pub use model::{
    Coordinates, CurrentWeather, DailyForecast, Forecast, LocationCandidate, PayloadError,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
