//! Weather domain library: readings, forecasts, and their providers.

pub mod openweather;
pub mod provider;
pub mod simulated;
pub mod types;

pub use openweather::OpenWeatherProvider;
pub use provider::{WeatherError, WeatherProvider, WeatherResult};
pub use simulated::SimulatedProvider;
pub use types::*;
