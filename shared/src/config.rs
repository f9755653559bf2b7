//! Core configuration.
//!
//! Shells hand the core a JSON document (usually baked in at build time or
//! read from the environment) with `Event::ConfigLoaded`. Every field has a
//! default, so an empty object is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_QUAKES_PATH: &str = "/earthquakes/earthquakes/";
pub const DEFAULT_MAGNITUDE_CEILING: i32 = 9;
pub const MIN_CEILING: i32 = 1;
pub const MAX_CEILING: i32 = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid api base url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported url scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("overflow ceiling {0} outside 1..=12")]
    InvalidCeiling(i32),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub api_base_url: String,
    pub quakes_path: String,
    /// Overflow ceiling for the magnitude chart (`9` renders a `9+` bucket).
    pub magnitude_chart_ceiling: i32,
    /// Overflow ceiling for the per-date stacked breakdown.
    pub date_chart_ceiling: i32,
    pub magnitude_presets: Vec<f64>,
    pub recency_presets_hours: Vec<f64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            quakes_path: DEFAULT_QUAKES_PATH.to_owned(),
            magnitude_chart_ceiling: DEFAULT_MAGNITUDE_CEILING,
            date_chart_ceiling: DEFAULT_MAGNITUDE_CEILING,
            magnitude_presets: vec![3.0, 4.0, 5.0, 6.0],
            recency_presets_hours: vec![1.0, 24.0, 72.0, 168.0],
        }
    }
}

impl CoreConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quakes_url()?;
        for ceiling in [self.magnitude_chart_ceiling, self.date_chart_ceiling] {
            if !(MIN_CEILING..=MAX_CEILING).contains(&ceiling) {
                return Err(ConfigError::InvalidCeiling(ceiling));
            }
        }
        Ok(())
    }

    /// Full URL of the event feed.
    pub fn quakes_url(&self) -> Result<Url, ConfigError> {
        let invalid = |source| ConfigError::InvalidUrl {
            url: self.api_base_url.clone(),
            source,
        };
        let mut base = Url::parse(&self.api_base_url).map_err(invalid)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base.scheme().to_owned()));
        }
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(self.quakes_path.trim_start_matches('/'))
            .map_err(invalid)
    }
}
