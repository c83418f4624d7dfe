//! The provider seam between weather handlers and their data source.

use chrono::{Days, Local, NaiveDate};

use crate::types::{ForecastDay, WeatherReading};

/// Errors raised by a weather provider.
///
/// Messages are safe to show to a remote caller: they never carry request
/// URLs (which may hold credentials) or local paths.
#[derive(thiserror::Error, Debug)]
pub enum WeatherError {
    #[error("City name must not be empty")]
    EmptyCity,

    #[error("Forecast must cover at least one day")]
    NoDays,

    #[error("Forecast horizon is {available} days, {requested} requested")]
    HorizonExceeded { requested: u32, available: u32 },

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Weather provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Provider(e.without_url().to_string())
    }
}

pub type WeatherResult<T> = Result<T, WeatherError>;

/// A source of weather data.
///
/// Implementations are called from blocking worker threads, possibly
/// several at once.
pub trait WeatherProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Current conditions for `city`.
    fn current(&self, city: &str) -> WeatherResult<WeatherReading>;

    /// Daily forecast for `city`, exactly `days` entries numbered from 1.
    fn forecast(&self, city: &str, days: u32) -> WeatherResult<Vec<ForecastDay>>;
}

/// Reject blank city names before any provider work. Returns the trimmed
/// name for lookups; readings keep the caller's spelling.
pub fn validate_city(city: &str) -> WeatherResult<&str> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        return Err(WeatherError::EmptyCity);
    }
    Ok(trimmed)
}

/// Calendar date `day` days after today.
pub(crate) fn forecast_date(day: u32) -> NaiveDate {
    let today = Local::now().date_naive();
    today
        .checked_add_days(Days::new(u64::from(day)))
        .unwrap_or(today)
}
