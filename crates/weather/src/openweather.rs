//! Live provider backed by the OpenWeather HTTP API.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::provider::{forecast_date, validate_city, WeatherError, WeatherProvider, WeatherResult};
use crate::types::{ForecastDay, WeatherReading};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

const REQUEST_TIMEOUT_SECS: u64 = 10;
/// The free forecast endpoint covers five days in 3-hour steps.
const FORECAST_HORIZON_DAYS: u32 = 5;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: String,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<WeatherBlock>,
    #[serde(default)]
    wind: WindBlock,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
    city: ForecastCity,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<WeatherBlock>,
}

#[derive(Debug, Deserialize)]
struct ForecastCity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherBlock {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct WindBlock {
    /// Metres per second in metric units.
    #[serde(default)]
    speed: f64,
}

fn describe(weather: &[WeatherBlock]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Weather provider that queries OpenWeather in metric units.
///
/// A blocking client is built per request so that it is created and dropped
/// on the worker thread making the call, never inside an async context.
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: impl Into<String>) -> WeatherResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the provider at a different API root (e.g. a local mock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> WeatherResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WeatherError::Provider("API key must not be empty".to_string()));
        }
        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from `OPENWEATHER_API_KEY`, if set and non-empty.
    pub fn from_env() -> Option<WeatherResult<Self>> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str, city: &str) -> WeatherResult<T> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let url = format!("{}/{endpoint}", self.base_url);
        let response = client
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()?;

        match response.status() {
            StatusCode::OK => Ok(response.json()?),
            StatusCode::NOT_FOUND => Err(WeatherError::CityNotFound(city.to_string())),
            status => {
                tracing::warn!("OpenWeather {endpoint} returned {status} for {city}");
                Err(WeatherError::Provider(format!(
                    "Unable to fetch weather data (status {})",
                    status.as_u16()
                )))
            }
        }
    }
}

impl WeatherProvider for OpenWeatherProvider {
    fn name(&self) -> &'static str {
        "openweather"
    }

    fn current(&self, city: &str) -> WeatherResult<WeatherReading> {
        let city = validate_city(city)?;
        tracing::info!("Fetching current weather for {city}");

        let data: CurrentResponse = self.get("weather", city)?;
        Ok(WeatherReading {
            city: data.name,
            temperature: data.main.temp,
            condition: describe(&data.weather),
            humidity: data.main.humidity,
            wind_speed: (data.wind.speed * 3.6 * 10.0).round() / 10.0,
        })
    }

    fn forecast(&self, city: &str, days: u32) -> WeatherResult<Vec<ForecastDay>> {
        let city = validate_city(city)?;
        if days == 0 {
            return Err(WeatherError::NoDays);
        }
        if days > FORECAST_HORIZON_DAYS {
            return Err(WeatherError::HorizonExceeded {
                requested: days,
                available: FORECAST_HORIZON_DAYS,
            });
        }
        tracing::info!("Fetching {days}-day forecast for {city}");

        let data: ForecastResponse = self.get("forecast", city)?;

        // One entry per calendar day, preferring the midday slot.
        let mut daily: Vec<ForecastDay> = Vec::new();
        for day in 1..=days {
            let date = forecast_date(day);
            let prefix = date.format("%Y-%m-%d").to_string();
            let mut slots = data.list.iter().filter(|e| e.dt_txt.starts_with(&prefix));
            let entry = slots
                .clone()
                .find(|e| e.dt_txt.ends_with("12:00:00"))
                .or_else(|| slots.next())
                .ok_or(WeatherError::HorizonExceeded {
                    requested: days,
                    available: day - 1,
                })?;
            daily.push(ForecastDay {
                day,
                date,
                city: data.city.name.clone(),
                temperature: entry.main.temp,
                condition: describe(&entry.weather),
            });
        }
        Ok(daily)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_payload() {
        let raw = serde_json::json!({
            "name": "Paris",
            "main": { "temp": 18.4, "humidity": 62 },
            "weather": [{ "description": "light rain" }],
            "wind": { "speed": 4.1 }
        });
        let data: CurrentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(data.name, "Paris");
        assert_eq!(describe(&data.weather), "light rain");
        assert_eq!(data.main.humidity, 62.0);
    }

    #[test]
    fn missing_weather_block_is_unknown() {
        assert_eq!(describe(&[]), "unknown");
    }

    #[test]
    fn over_horizon_forecast_fails_before_any_request() {
        let provider = OpenWeatherProvider::with_base_url("key", "http://127.0.0.1:9").unwrap();
        let err = provider.forecast("Paris", 9).unwrap_err();
        assert!(matches!(
            err,
            WeatherError::HorizonExceeded { requested: 9, available: 5 }
        ));
    }
}
