//! Runtime configuration for the chart binary, read from the environment.
//!
//! Variables (a `.env` file in the working directory is honoured):
//! - `CHART_DATA`: path to a JSON series file (required)
//! - `CHART_TICKER`, `CHART_PERIOD`: chart metadata (required)
//! - `CHART_FILENAME`, `CHART_STYLE`: output overrides (optional)

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ChartRequest;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub ticker: String,
    pub period: String,
    pub filename: Option<String>,
    pub style: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            data_path: PathBuf::from(require("CHART_DATA")?),
            ticker: require("CHART_TICKER")?,
            period: require("CHART_PERIOD")?,
            filename: get("CHART_FILENAME"),
            style: get("CHART_STYLE"),
        })
    }

    pub fn request(&self) -> ChartRequest {
        ChartRequest {
            ticker: self.ticker.clone(),
            period: self.period.clone(),
            filename: self.filename.clone(),
            style: self.style.clone(),
        }
    }
}
