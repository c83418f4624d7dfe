//! Prompt: analyze_weather: ask for outdoor activity recommendations.

use serde_json::Value;

use crate::registry::{Capability, ParamSchema, ParamSpec, ParamType};

use super::str_arg;

pub const NAME: &str = "analyze_weather";

pub fn capability() -> Capability {
    let schema = ParamSchema::new()
        .param(ParamSpec::required("city", ParamType::String).describe("Name of the city"));

    Capability::prompt(
        NAME,
        "Prompt for analyzing a city's weather and suggesting outdoor activities",
        schema,
        |args| {
            let city = str_arg(args, "city")?;
            Ok(Value::String(format!(
                "Analyze the current weather conditions in {city} and provide \
                 recommendations for outdoor activities."
            )))
        },
    )
}
