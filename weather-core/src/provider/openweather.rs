use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::OpenWeatherConfig,
    error::truncate_body,
    model::{Coordinates, CurrentWeather, DailyForecast, Forecast, LocationCandidate},
    WeatherError,
};

use super::WeatherProvider;

const GEOCODING_ENDPOINT: &str = "OpenWeather geocoding";
const ONECALL_ENDPOINT: &str = "OpenWeather one-call";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: String,
    lang: String,
    geocode_limit: u8,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_client(&OpenWeatherConfig { api_key, ..Default::default() }, Client::new())
    }

    pub fn from_config(cfg: &OpenWeatherConfig) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(secs) = cfg.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http = builder
            .build()
            .map_err(|source| WeatherError::Request { endpoint: "OpenWeather client", source })?;

        Ok(Self::with_client(cfg, http))
    }

    fn with_client(cfg: &OpenWeatherConfig, http: Client) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            units: cfg.units.clone(),
            lang: cfg.lang.clone(),
            geocode_limit: cfg.effective_geocode_limit(),
            http,
        }
    }

    /// Point the provider at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| WeatherError::Request { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| WeatherError::Request { endpoint, source })?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| WeatherError::Decode { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

impl From<OwGeoEntry> for LocationCandidate {
    fn from(e: OwGeoEntry) -> Self {
        LocationCandidate {
            name: e.name,
            state: e.state.unwrap_or_default(),
            country: e.country,
            lat: e.lat,
            lon: e.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: i64,
    temp: f64,
    humidity: u8,
    pressure: u32,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    day: f64,
    night: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    humidity: u8,
    pressure: u32,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    current: OwCurrent,
    #[serde(default)]
    daily: Vec<OwDaily>,
}

fn first_description(weather: Vec<OwWeather>) -> String {
    weather.into_iter().next().map(|w| w.description).unwrap_or_default()
}

fn timestamp(dt: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(dt, 0)
        .ok_or(WeatherError::InvalidTimestamp { endpoint: ONECALL_ENDPOINT, dt })
}

impl TryFrom<OwOneCallResponse> for Forecast {
    type Error = WeatherError;

    fn try_from(r: OwOneCallResponse) -> Result<Self, Self::Error> {
        let current = CurrentWeather {
            observed_at: timestamp(r.current.dt)?,
            temp: r.current.temp,
            humidity: r.current.humidity,
            pressure: r.current.pressure,
            wind_speed: r.current.wind_speed,
            description: first_description(r.current.weather),
        };

        let daily = r
            .daily
            .into_iter()
            .map(|d| {
                Ok(DailyForecast {
                    date: timestamp(d.dt)?,
                    temp_night: d.temp.night,
                    temp_day: d.temp.day,
                    humidity: d.humidity,
                    pressure: d.pressure,
                    wind_speed: d.wind_speed,
                    description: first_description(d.weather),
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        Ok(Forecast { current, daily })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, query: &str) -> Result<Vec<LocationCandidate>, WeatherError> {
        let limit = self.geocode_limit.to_string();
        debug!("geocoding {query:?} (limit {limit})");

        let entries: Vec<OwGeoEntry> = self
            .get_json(GEOCODING_ENDPOINT, "/geo/1.0/direct", &[("q", query), ("limit", limit.as_str())])
            .await?;

        if entries.is_empty() {
            info!("no locations found for {query:?}");
        }

        Ok(entries.into_iter().take(self.geocode_limit as usize).map(Into::into).collect())
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Forecast, WeatherError> {
        let lat = coords.lat.to_string();
        let lon = coords.lon.to_string();
        debug!("fetching forecast for {coords}");

        let parsed: OwOneCallResponse = self
            .get_json(
                ONECALL_ENDPOINT,
                "/data/2.5/onecall",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("exclude", "minutely,hourly"),
                    ("units", self.units.as_str()),
                    ("lang", self.lang.as_str()),
                ],
            )
            .await?;

        parsed.try_into()
    }
}
