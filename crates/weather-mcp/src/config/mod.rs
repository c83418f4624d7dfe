//! Configuration loading and resolution: CLI flag > environment > default.

use std::sync::Arc;
use std::time::Duration;

use weather::{OpenWeatherProvider, SimulatedProvider, WeatherProvider};

use crate::types::{McpError, McpResult};

pub const TOKEN_ENV: &str = "WEATHER_MCP_TOKEN";
pub const TIMEOUT_ENV: &str = "WEATHER_MCP_TIMEOUT_SECS";
pub const STRICT_ENV: &str = "WEATHER_MCP_STRICT_ARGS";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Which weather backend the handlers call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    /// OpenWeather when `OPENWEATHER_API_KEY` is set, simulated otherwise.
    Auto,
    Simulated,
    #[value(name = "openweather")]
    OpenWeather,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolve the bearer token for the HTTP transport.
pub fn resolve_token(explicit: Option<String>) -> Option<String> {
    explicit.or_else(|| env_var(TOKEN_ENV))
}

/// Resolve the per-request timeout. Zero disables it.
pub fn resolve_timeout(explicit: Option<u64>) -> Option<Duration> {
    timeout_from(explicit, env_var(TIMEOUT_ENV))
}

fn timeout_from(explicit: Option<u64>, env: Option<String>) -> Option<Duration> {
    let secs = explicit
        .or_else(|| {
            env.as_deref().and_then(|raw| {
                let parsed: Option<u64> = raw.trim().parse().ok();
                if parsed.is_none() {
                    tracing::warn!("Ignoring invalid {TIMEOUT_ENV}={raw}");
                }
                parsed
            })
        })
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Resolve argument strictness; `--lenient` always wins.
pub fn resolve_strict(lenient: bool) -> bool {
    strict_from(lenient, env_var(STRICT_ENV))
}

fn strict_from(lenient: bool, env: Option<String>) -> bool {
    if lenient {
        return false;
    }
    env.as_deref().and_then(parse_bool).unwrap_or(true)
}

/// Build the weather provider the handlers will share.
pub fn build_provider(kind: ProviderKind) -> McpResult<Arc<dyn WeatherProvider>> {
    let live = || {
        OpenWeatherProvider::from_env()
            .transpose()
            .map_err(|e| McpError::InternalError(e.to_string()))
    };

    let provider: Arc<dyn WeatherProvider> = match kind {
        ProviderKind::Simulated => Arc::new(SimulatedProvider::new()),
        ProviderKind::OpenWeather => match live()? {
            Some(provider) => Arc::new(provider),
            None => {
                return Err(McpError::InternalError(format!(
                    "{} must be set for the openweather provider",
                    weather::openweather::API_KEY_ENV
                )))
            }
        },
        ProviderKind::Auto => match live()? {
            Some(provider) => Arc::new(provider),
            None => Arc::new(SimulatedProvider::new()),
        },
    };

    tracing::info!("Weather provider: {}", provider.name());
    Ok(provider)
}
