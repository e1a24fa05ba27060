use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "http://localhost:8001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Origin of the lost & found API; the visual search path is appended to it.
    pub api_base: String,
}

impl Config {
    /// Reads the process environment. Call `dotenv` first if a `.env` file should count.
    pub fn load() -> Self {
        Self { api_base: try_load("SEARCH_API_BASE", DEFAULT_API_BASE) }
    }
}

fn try_load<T>(key: &str, default: &str) -> T
where
    T: FromStr + From<String>,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value ({e}), using default: {default}");
        T::from(default.to_string())
    })
}
