use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// One match returned by the geocoding endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCandidate {
    pub name: String,
    /// Region name; empty when the provider does not report one.
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl LocationCandidate {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lon: self.lon }
    }
}

/// A latitude/longitude pair as carried by a selection button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("expected \"<lat> <lon>\", got {0:?}")]
    Shape(String),

    #[error("{0:?} is not a finite coordinate")]
    Number(String),
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Encode as `"<lat> <lon>"`.
    ///
    /// `f64`'s `Display` prints the shortest text that parses back to the same
    /// value, so [`Coordinates::from_payload`] restores the exact pair.
    pub fn to_payload(&self) -> String {
        format!("{} {}", self.lat, self.lon)
    }

    pub fn from_payload(payload: &str) -> Result<Self, PayloadError> {
        let mut parts = payload.split_whitespace();
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PayloadError::Shape(payload.to_string()));
        };

        Ok(Self { lat: parse_coordinate(lat)?, lon: parse_coordinate(lon)? })
    }
}

fn parse_coordinate(text: &str) -> Result<f64, PayloadError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PayloadError::Number(text.to_string()))
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Conditions at the time of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub observed_at: DateTime<Utc>,
    pub temp: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub description: String,
}

/// One entry of the daily forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: DateTime<Utc>,
    pub temp_night: f64,
    pub temp_day: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub description: String,
}

/// Current conditions plus the daily outlook, index 0 being today.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub current: CurrentWeather,
    pub daily: Vec<DailyForecast>,
}

impl Forecast {
    /// Daily entries after today, at most `days` of them.
    pub fn upcoming(&self, days: usize) -> &[DailyForecast] {
        let end = self.daily.len().min(days.saturating_add(1));
        self.daily.get(1..end).unwrap_or(&[])
    }
}
