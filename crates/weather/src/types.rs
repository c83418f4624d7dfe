//! Core data types for weather readings and forecasts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sky condition reported by the simulated provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Sunny,
    Cloudy,
    Rainy,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Stormy,
}

impl Condition {
    /// Every condition a current reading may report.
    pub const ALL: [Condition; 5] = [
        Condition::Sunny,
        Condition::Cloudy,
        Condition::Rainy,
        Condition::PartlyCloudy,
        Condition::Stormy,
    ];

    /// Conditions used for forecast days. Storms are never forecast.
    pub const FORECAST: [Condition; 4] = [
        Condition::Sunny,
        Condition::Cloudy,
        Condition::Rainy,
        Condition::PartlyCloudy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sunny => "Sunny",
            Condition::Cloudy => "Cloudy",
            Condition::Rainy => "Rainy",
            Condition::PartlyCloudy => "Partly Cloudy",
            Condition::Stormy => "Stormy",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for a single city.
///
/// `condition` is free text: simulated readings use [`Condition`] names,
/// live providers pass through their own description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub city: String,
    /// Degrees Celsius.
    pub temperature: f64,
    pub condition: String,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Kilometres per hour.
    pub wind_speed: f64,
}

impl WeatherReading {
    /// One-line human readable summary of the reading.
    pub fn summary(&self) -> String {
        format!(
            "Current weather in {}: {}, {}°C, Humidity: {}%, Wind: {} km/h",
            self.city, self.condition, self.temperature, self.humidity, self.wind_speed
        )
    }
}

/// One day of a multi-day forecast. `day` counts from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: u32,
    pub date: NaiveDate,
    pub city: String,
    pub temperature: f64,
    pub condition: String,
}
