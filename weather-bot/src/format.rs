//! Rendering of forecasts and menus into chat text.
//!
//! Everything here is pure: the conversation layer decides what to send, this
//! module only decides how it reads. Cards are HTML (sent with HTML parse mode),
//! button labels are plain text.

use chrono::{DateTime, Datelike, TimeZone};
use std::fmt::Display;
use teloxide::utils::html::{bold, escape};
use weather_core::{CurrentWeather, DailyForecast, Forecast, LocationCandidate};

/// Monday-first weekday names.
pub const DAYS_OF_WEEK: [&str; 7] =
    ["Понедельник", "Вторник", "Среда", "Четверг", "Пятница", "Суббота", "Воскресенье"];

pub const HELP_PROMPT: &str = "Введите название города:";
pub const MENU_PROMPT: &str = "Уточните город:";
pub const CITY_NOT_FOUND: &str = "⚠ Город не найден ⚠";
pub const SERVICE_UNAVAILABLE: &str = "⚠ Сервис погоды недоступен, попробуйте позже ⚠";
pub const INVALID_SELECTION: &str = "⚠ Не удалось распознать выбранный город ⚠";

/// One inline button of the city selection menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuButton {
    pub label: String,
    pub payload: String,
}

pub fn weekday_name(index: usize) -> &'static str {
    DAYS_OF_WEEK[index % DAYS_OF_WEEK.len()]
}

/// One button per candidate, in the order the geocoder returned them.
pub fn selection_menu(candidates: &[LocationCandidate]) -> Vec<MenuButton> {
    candidates
        .iter()
        .map(|c| MenuButton {
            label: format!("{} - ({}), {}", c.name, c.country, c.state),
            payload: c.coordinates().to_payload(),
        })
        .collect()
}

/// Round half to even and print as an integer, so `-0.4` shows as `0`.
pub fn round_temp(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Upper-case the first letter of every word, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

fn weekday_of<Tz: TimeZone>(dt: &DateTime<Tz>) -> &'static str {
    weekday_name(dt.weekday().num_days_from_monday() as usize)
}

pub fn current_card<Tz>(current: &CurrentWeather, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let at = current.observed_at.with_timezone(tz);

    format!(
        "{}\n\
         {} {} \n\
         Температура: {}°C, {}\n\
         Влажность: {}%\n\
         Давление: {} мм.рт.ст.\n\
         Ветер: {} м/с",
        bold("Текущая погода:"),
        at.format("%d/%m/%Y %H:%M"),
        weekday_of(&at),
        round_temp(current.temp),
        escape(&title_case(&current.description)),
        current.humidity,
        current.pressure,
        current.wind_speed,
    )
}

pub fn daily_card<Tz>(day: &DailyForecast, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = day.date.with_timezone(tz);

    format!(
        "{} {}\n\
         Температура: {}...{}°C,\n\
         {}\n\
         Влажность: {}%\n\
         Давление: {} мм.рт.ст.\n\
         Ветер: {} м/с",
        bold(&date.format("%d/%m/%Y").to_string()),
        bold(weekday_of(&date)),
        round_temp(day.temp_night),
        round_temp(day.temp_day),
        escape(&title_case(&day.description)),
        day.humidity,
        day.pressure,
        day.wind_speed,
    )
}

/// The current card followed by one card per upcoming day; today's daily
/// entry is left out since the current card covers it.
pub fn forecast_cards<Tz>(forecast: &Forecast, tz: &Tz, days: usize) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    std::iter::once(current_card(&forecast.current, tz))
        .chain(forecast.upcoming(days).iter().map(|d| daily_card(d, tz)))
        .collect()
}
