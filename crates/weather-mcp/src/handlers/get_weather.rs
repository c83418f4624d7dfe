//! Tool: get_weather: current conditions for a city.

use std::sync::Arc;

use weather::WeatherProvider;

use crate::registry::{Capability, ParamSchema, ParamSpec, ParamType};

use super::str_arg;

pub const NAME: &str = "get_weather";

pub fn capability(provider: Arc<dyn WeatherProvider>) -> Capability {
    let schema = ParamSchema::new()
        .param(ParamSpec::required("city", ParamType::String).describe("Name of the city"));

    Capability::tool(
        NAME,
        "Get current weather information for a city",
        schema,
        move |args| {
            let city = str_arg(args, "city")?;
            let reading = provider.current(city)?;
            Ok(serde_json::to_value(reading)?)
        },
    )
}
