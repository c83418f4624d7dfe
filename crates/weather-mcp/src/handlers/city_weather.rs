//! Resource: weather://{city}

use std::sync::Arc;

use serde_json::Value;
use weather::WeatherProvider;

use crate::registry::{Capability, RegistryError};

use super::str_arg;

pub const URI_TEMPLATE: &str = "weather://{city}";

pub fn capability(provider: Arc<dyn WeatherProvider>) -> Result<Capability, RegistryError> {
    Capability::resource(
        URI_TEMPLATE,
        "City Weather",
        "Current weather summary for a city",
        move |args| {
            let city = str_arg(args, "city")?;
            let reading = provider.current(city)?;
            Ok(Value::String(reading.summary()))
        },
    )
}
