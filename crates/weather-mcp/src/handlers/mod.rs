//! Weather capabilities and their registration.

pub mod analyze_weather;
pub mod city_weather;
pub mod get_forecast;
pub mod get_weather;

use std::sync::Arc;

use weather::WeatherProvider;

use crate::registry::{Arguments, CapabilityRegistry, HandlerError, RegistryError};

/// Build the server's registry. Called once, before any transport starts.
pub fn build_registry(
    provider: Arc<dyn WeatherProvider>,
) -> Result<CapabilityRegistry, RegistryError> {
    let mut registry = CapabilityRegistry::new();
    registry.register(get_weather::capability(provider.clone()))?;
    registry.register(get_forecast::capability(provider.clone()))?;
    registry.register(city_weather::capability(provider)?)?;
    registry.register(analyze_weather::capability())?;
    Ok(registry)
}

/// Read a validated string argument.
pub(crate) fn str_arg<'a>(args: &'a Arguments, name: &str) -> Result<&'a str, HandlerError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerError::new(format!("'{name}' argument is required")))
}

/// Read a validated integer argument.
pub(crate) fn int_arg(args: &Arguments, name: &str) -> Result<i64, HandlerError> {
    args.get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerError::new(format!("'{name}' argument is required")))
}
