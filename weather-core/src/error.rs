use thiserror::Error;

/// Failure talking to the weather provider.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to send request to {endpoint}: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} returned an out-of-range timestamp: {dt}")]
    InvalidTimestamp { endpoint: &'static str, dt: i64 },
}

impl WeatherError {
    /// HTTP status of the upstream response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            WeatherError::Status { status, .. } => Some(*status),
            WeatherError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            WeatherError::Decode { .. } | WeatherError::InvalidTimestamp { .. } => None,
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
