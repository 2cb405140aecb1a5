//! The two-step interaction: city name, then a pick from the menu.
//!
//! No state survives between interactions. [`ConversationState`] exists so a
//! single interaction walks an explicit path (`AwaitingCity` to `Selecting` and
//! back) and stray events are rejected by [`transition`] rather than ignored.

use chrono::Local;
use log::{debug, error, info, warn};
use std::sync::Arc;
use thiserror::Error;
use weather_core::{Coordinates, PayloadError, WeatherError, WeatherProvider};

use crate::format::{self, MenuButton};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConversationState {
    AwaitingCity,
    Selecting(Coordinates),
}

/// Inbound chat event, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Help,
    CityQuery(String),
    /// Callback payload of a pressed menu button.
    Selection(String),
}

/// Outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Menu { text: String, buttons: Vec<MenuButton> },
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("invalid selection payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    #[error("a selection for {0} is still being resolved")]
    Busy(Coordinates),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("weather provider failed: {0}")]
    Upstream(#[from] WeatherError),
}

pub fn transition(
    state: ConversationState,
    event: &Event,
) -> Result<ConversationState, TransitionError> {
    match (state, event) {
        (state, Event::Help) => Ok(state),
        (ConversationState::AwaitingCity, Event::CityQuery(_)) => {
            Ok(ConversationState::AwaitingCity)
        }
        (ConversationState::AwaitingCity, Event::Selection(payload)) => {
            Ok(ConversationState::Selecting(Coordinates::from_payload(payload)?))
        }
        (ConversationState::Selecting(coords), _) => Err(TransitionError::Busy(coords)),
    }
}

/// Handler settings taken from the config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub forecast_days: usize,
    pub fail_fast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { forecast_days: 3, fail_fast: false }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    provider: Arc<dyn WeatherProvider>,
    settings: Settings,
}

impl Conversation {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: Settings) -> Self {
        Self { provider, settings }
    }

    /// Run one interaction to completion.
    ///
    /// Returns `Err` only for upstream failures with `fail_fast` enabled; every
    /// other outcome, including upstream failures otherwise, is a reply.
    pub async fn handle(&self, event: Event) -> Result<Vec<Reply>, HandlerError> {
        let outcome = match transition(ConversationState::AwaitingCity, &event) {
            Ok(ConversationState::Selecting(coords)) => self.render_forecast(coords).await,
            Ok(ConversationState::AwaitingCity) => match event {
                Event::CityQuery(query) => self.lookup_city(&query).await,
                // a selection never leaves the state at AwaitingCity
                _ => Ok(vec![Reply::Text(format::HELP_PROMPT.to_string())]),
            },
            Err(err) => {
                warn!("rejected {event:?}: {err}");
                return Ok(vec![Reply::Text(format::INVALID_SELECTION.to_string())]);
            }
        };

        match outcome {
            Ok(replies) => Ok(replies),
            Err(err) if self.settings.fail_fast => Err(HandlerError::Upstream(err)),
            Err(err) => {
                error!("{err}");
                Ok(vec![Reply::Text(format::SERVICE_UNAVAILABLE.to_string())])
            }
        }
    }

    async fn lookup_city(&self, query: &str) -> Result<Vec<Reply>, WeatherError> {
        let query = query.trim();
        debug!("city query {query:?}");

        if query.is_empty() {
            return Ok(vec![Reply::Text(format::CITY_NOT_FOUND.to_string())]);
        }

        let candidates = self.provider.geocode(query).await?;
        if candidates.is_empty() {
            return Ok(vec![Reply::Text(format::CITY_NOT_FOUND.to_string())]);
        }

        info!("{} candidate(s) for {query:?}", candidates.len());
        Ok(vec![Reply::Menu {
            text: format::MENU_PROMPT.to_string(),
            buttons: format::selection_menu(&candidates),
        }])
    }

    async fn render_forecast(&self, coords: Coordinates) -> Result<Vec<Reply>, WeatherError> {
        let forecast = self.provider.forecast(coords).await?;

        Ok(format::forecast_cards(&forecast, &Local, self.settings.forecast_days)
            .into_iter()
            .map(Reply::Text)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;
    use weather_core::{CurrentWeather, DailyForecast, Forecast, LocationCandidate};

    #[derive(Debug, Default)]
    struct FakeProvider {
        candidates: Vec<LocationCandidate>,
        daily_len: usize,
        fail_status: Option<u16>,
        geocode_calls: Mutex<Vec<String>>,
        forecast_calls: Mutex<Vec<Coordinates>>,
    }

    impl FakeProvider {
        fn failure(&self, endpoint: &'static str) -> Option<WeatherError> {
            self.fail_status.map(|status| WeatherError::Status {
                endpoint,
                status,
                body: String::new(),
            })
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn geocode(&self, query: &str) -> Result<Vec<LocationCandidate>, WeatherError> {
            self.geocode_calls.lock().unwrap().push(query.to_string());
            match self.failure("geocoding") {
                Some(err) => Err(err),
                None => Ok(self.candidates.clone()),
            }
        }

        async fn forecast(&self, coords: Coordinates) -> Result<Forecast, WeatherError> {
            self.forecast_calls.lock().unwrap().push(coords);
            if let Some(err) = self.failure("one-call") {
                return Err(err);
            }

            Ok(Forecast {
                current: CurrentWeather {
                    observed_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                    temp: 15.4,
                    humidity: 80,
                    pressure: 1013,
                    wind_speed: 3.2,
                    description: "ясно".into(),
                },
                daily: (0..self.daily_len as i64)
                    .map(|i| DailyForecast {
                        date: DateTime::from_timestamp(1_700_000_000 + i * 86_400, 0).unwrap(),
                        temp_night: 1.0,
                        temp_day: 5.0,
                        humidity: 70,
                        pressure: 1000,
                        wind_speed: 2.0,
                        description: format!("день {i}"),
                    })
                    .collect(),
            })
        }
    }

    fn candidate(i: usize) -> LocationCandidate {
        LocationCandidate {
            name: format!("City {i}"),
            state: String::new(),
            country: "RU".into(),
            lat: 50.0 + i as f64 * 0.123456789,
            lon: 30.0 - i as f64 * 0.987654321,
        }
    }

    fn conversation(provider: FakeProvider, fail_fast: bool) -> (Conversation, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let settings = Settings { forecast_days: 3, fail_fast };
        (Conversation::new(provider.clone(), settings), provider)
    }

    #[test]
    fn help_keeps_state() {
        let selecting = ConversationState::Selecting(Coordinates::new(1.0, 2.0));
        assert_eq!(transition(selecting, &Event::Help), Ok(selecting));
        assert_eq!(
            transition(ConversationState::AwaitingCity, &Event::Help),
            Ok(ConversationState::AwaitingCity)
        );
    }

    #[test]
    fn city_query_stays_awaiting() {
        let next = transition(ConversationState::AwaitingCity, &Event::CityQuery("Omsk".into()));
        assert_eq!(next, Ok(ConversationState::AwaitingCity));
    }

    #[test]
    fn selection_moves_to_selecting() {
        let next = transition(ConversationState::AwaitingCity, &Event::Selection("54.99 73.37".into()));
        assert_eq!(next, Ok(ConversationState::Selecting(Coordinates::new(54.99, 73.37))));
    }

    #[test]
    fn selection_never_stays_awaiting() {
        for payload in ["54.99 73.37", "", "1", "a b", "1 2 3", "-0 0"] {
            let next = transition(ConversationState::AwaitingCity, &Event::Selection(payload.into()));
            assert!(
                !matches!(next, Ok(ConversationState::AwaitingCity)),
                "{payload:?} left the conversation awaiting a city"
            );
        }
    }

    #[test]
    fn bad_payload_is_rejected() {
        let next = transition(ConversationState::AwaitingCity, &Event::Selection("garbage".into()));
        assert!(matches!(next, Err(TransitionError::InvalidPayload(_))));
    }

    #[test]
    fn events_while_selecting_are_illegal() {
        let selecting = ConversationState::Selecting(Coordinates::new(1.0, 2.0));
        assert!(matches!(
            transition(selecting, &Event::CityQuery("Omsk".into())),
            Err(TransitionError::Busy(_))
        ));
        assert!(matches!(
            transition(selecting, &Event::Selection("3 4".into())),
            Err(TransitionError::Busy(_))
        ));
    }

    #[tokio::test]
    async fn help_replies_with_prompt_only() {
        let (conv, provider) = conversation(FakeProvider::default(), false);

        let replies = conv.handle(Event::Help).await.unwrap();

        assert_eq!(replies, vec![Reply::Text(format::HELP_PROMPT.to_string())]);
        assert!(provider.geocode_calls.lock().unwrap().is_empty());
        assert!(provider.forecast_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn menu_has_one_button_per_candidate() {
        for n in 1..=5 {
            let fake = FakeProvider { candidates: (0..n).map(candidate).collect(), ..Default::default() };
            let (conv, _) = conversation(fake, false);

            let replies = conv.handle(Event::CityQuery("City".into())).await.unwrap();

            let [Reply::Menu { text, buttons }] = replies.as_slice() else {
                panic!("expected a single menu, got {replies:?}");
            };
            assert_eq!(text, format::MENU_PROMPT);
            assert_eq!(buttons.len(), n);
            for (i, button) in buttons.iter().enumerate() {
                let coords = Coordinates::from_payload(&button.payload).unwrap();
                assert_eq!(coords, candidate(i).coordinates());
            }
        }
    }

    #[tokio::test]
    async fn no_candidates_means_city_not_found() {
        let (conv, provider) = conversation(FakeProvider::default(), false);

        let replies = conv.handle(Event::CityQuery("  Atlantis ".into())).await.unwrap();

        assert_eq!(replies, vec![Reply::Text(format::CITY_NOT_FOUND.to_string())]);
        assert_eq!(*provider.geocode_calls.lock().unwrap(), vec!["Atlantis".to_string()]);
    }

    #[tokio::test]
    async fn blank_query_skips_geocoding() {
        let (conv, provider) = conversation(FakeProvider::default(), false);

        let replies = conv.handle(Event::CityQuery("   ".into())).await.unwrap();

        assert_eq!(replies, vec![Reply::Text(format::CITY_NOT_FOUND.to_string())]);
        assert!(provider.geocode_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn selection_sends_current_then_three_days() {
        let fake = FakeProvider { daily_len: 8, ..Default::default() };
        let (conv, provider) = conversation(fake, false);

        let replies = conv.handle(Event::Selection("55.75 37.61".into())).await.unwrap();

        assert_eq!(replies.len(), 4);
        let texts: Vec<&str> = replies
            .iter()
            .map(|r| match r {
                Reply::Text(t) => t.as_str(),
                Reply::Menu { .. } => panic!("unexpected menu"),
            })
            .collect();
        assert!(texts[0].contains("Текущая погода"));
        assert!(texts[0].contains("15°C"));
        assert!(texts[1].contains("День 1"));
        assert!(texts[2].contains("День 2"));
        assert!(texts[3].contains("День 3"));
        assert!(texts.iter().all(|t| !t.contains("День 0")));
        assert_eq!(*provider.forecast_calls.lock().unwrap(), vec![Coordinates::new(55.75, 37.61)]);
    }

    #[tokio::test]
    async fn invalid_payload_is_reported_to_user() {
        let (conv, provider) = conversation(FakeProvider::default(), true);

        let replies = conv.handle(Event::Selection("not coordinates".into())).await.unwrap();

        assert_eq!(replies, vec![Reply::Text(format::INVALID_SELECTION.to_string())]);
        assert!(provider.forecast_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_surfaced_by_default() {
        let fake = FakeProvider { fail_status: Some(500), ..Default::default() };
        let (conv, _) = conversation(fake, false);

        let replies = conv.handle(Event::CityQuery("Paris".into())).await.unwrap();
        assert_eq!(replies, vec![Reply::Text(format::SERVICE_UNAVAILABLE.to_string())]);

        let replies = conv.handle(Event::Selection("1 2".into())).await.unwrap();
        assert_eq!(replies, vec![Reply::Text(format::SERVICE_UNAVAILABLE.to_string())]);
    }

    #[tokio::test]
    async fn upstream_failure_escalates_when_fail_fast() {
        let fake = FakeProvider { fail_status: Some(401), ..Default::default() };
        let (conv, _) = conversation(fake, true);

        let err = conv.handle(Event::Selection("1 2".into())).await.unwrap_err();
        let HandlerError::Upstream(inner) = err;
        assert_eq!(inner.status(), Some(401));
    }
}
