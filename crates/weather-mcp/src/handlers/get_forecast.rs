//! Tool: get_forecast: daily outlook for the next few days.

use std::sync::Arc;

use weather::WeatherProvider;

use crate::registry::{Capability, HandlerError, ParamSchema, ParamSpec, ParamType};

use super::{int_arg, str_arg};

pub const NAME: &str = "get_forecast";
pub const DEFAULT_DAYS: i64 = 3;
pub const MAX_DAYS: u32 = weather::simulated::FORECAST_HORIZON;

pub fn capability(provider: Arc<dyn WeatherProvider>) -> Capability {
    let schema = ParamSchema::new()
        .param(ParamSpec::required("city", ParamType::String).describe("Name of the city"))
        .param(
            ParamSpec::optional("days", ParamType::Integer)
                .describe("Number of days to forecast")
                .with_default(DEFAULT_DAYS)
                .with_minimum(1.0)
                .with_maximum(f64::from(MAX_DAYS)),
        );

    Capability::tool(
        NAME,
        "Get weather forecast for the next few days",
        schema,
        move |args| {
            let city = str_arg(args, "city")?;
            let days = u32::try_from(int_arg(args, "days")?)
                .map_err(|_| HandlerError::new("'days' is out of range"))?;
            let forecast = provider.forecast(city, days)?;
            Ok(serde_json::to_value(forecast)?)
        },
    )
}
