//! Placeholder provider that synthesizes plausible random readings.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::provider::{forecast_date, validate_city, WeatherError, WeatherProvider, WeatherResult};
use crate::types::{Condition, ForecastDay, WeatherReading};

pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<i32> = 10..=35;
pub const HUMIDITY_RANGE: std::ops::RangeInclusive<i32> = 30..=90;
pub const WIND_SPEED_RANGE: std::ops::RangeInclusive<i32> = 5..=25;

/// Longest forecast the generator will produce, in days.
pub const FORECAST_HORIZON: u32 = 16;

/// Random weather generator.
pub struct SimulatedProvider {
    rng: Mutex<StdRng>,
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn pick(rng: &mut StdRng, set: &[Condition]) -> Condition {
    set.choose(rng).copied().unwrap_or(Condition::Sunny)
}

impl WeatherProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn current(&self, city: &str) -> WeatherResult<WeatherReading> {
        validate_city(city)?;
        Ok(self.with_rng(|rng| WeatherReading {
            city: city.to_string(),
            temperature: f64::from(rng.gen_range(TEMPERATURE_RANGE)),
            condition: pick(rng, &Condition::ALL).to_string(),
            humidity: f64::from(rng.gen_range(HUMIDITY_RANGE)),
            wind_speed: f64::from(rng.gen_range(WIND_SPEED_RANGE)),
        }))
    }

    fn forecast(&self, city: &str, days: u32) -> WeatherResult<Vec<ForecastDay>> {
        validate_city(city)?;
        if days == 0 {
            return Err(WeatherError::NoDays);
        }
        if days > FORECAST_HORIZON {
            return Err(WeatherError::HorizonExceeded {
                requested: days,
                available: FORECAST_HORIZON,
            });
        }

        tracing::debug!("Simulating {days}-day forecast for {city}");

        Ok(self.with_rng(|rng| {
            (1..=days)
                .map(|day| ForecastDay {
                    day,
                    date: forecast_date(day),
                    city: city.to_string(),
                    temperature: f64::from(rng.gen_range(TEMPERATURE_RANGE)),
                    condition: pick(rng, &Condition::FORECAST).to_string(),
                })
                .collect()
        }))
    }
}
