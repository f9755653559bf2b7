//! Attribute filters: country, minimum magnitude and recency window.
//!
//! Every recompute starts from the full collection and applies the
//! conjunction of whatever filters are active. Filtering is stable, so a
//! collection that was already sorted stays sorted.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::event::ValidationError;
use crate::model::{Quake, Snapshot};

/// Upper bound on the recency window, ten years.
pub const MAX_RECENCY_HOURS: f64 = 24.0 * 365.0 * 10.0;

/// A validated "newer than" window in hours.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecencyWindow {
    hours: f64,
}

impl RecencyWindow {
    pub fn new(hours: f64) -> Result<Self, ValidationError> {
        if !hours.is_finite() || hours <= 0.0 || hours > MAX_RECENCY_HOURS {
            return Err(ValidationError::InvalidRecency(hours));
        }
        Ok(Self { hours })
    }

    #[must_use]
    pub const fn hours(self) -> f64 {
        self.hours
    }

    /// Oldest admissible event time for a recompute happening at `now`.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        #[allow(clippy::cast_possible_truncation)]
        let millis = (self.hours * 3_600_000.0).round() as i64;
        TimeDelta::try_milliseconds(millis).and_then(|delta| now.checked_sub_signed(delta))
    }
}

/// Parses a minimum-magnitude threshold typed or picked in the UI.
pub fn parse_magnitude(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim().trim_end_matches('+');
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber(raw.to_owned()))?;
    validate_magnitude(value)
}

pub fn validate_magnitude(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::InvalidMagnitude(value))
    }
}

/// Parses a recency window in hours.
pub fn parse_recency(raw: &str) -> Result<RecencyWindow, ValidationError> {
    let hours: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber(raw.to_owned()))?;
    RecencyWindow::new(hours)
}

/// Normalizes a country choice; blank input clears the filter.
#[must_use]
pub fn normalize_country(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// The active filter predicates. `None` means "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub country: Option<String>,
    pub min_magnitude: Option<f64>,
    pub recency: Option<RecencyWindow>,
}

impl FilterState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.min_magnitude.is_none() && self.recency.is_none()
    }

    /// Binds the filters to a single `now`, yielding a reusable predicate.
    #[must_use]
    pub fn predicate(&self, now: DateTime<Utc>) -> FilterPredicate<'_> {
        FilterPredicate {
            country: self.country.as_deref(),
            min_magnitude: self.min_magnitude,
            cutoff: self.recency.and_then(|window| window.cutoff(now)),
        }
    }

    /// Recomputes the filtered collection from `all`, preserving order.
    #[must_use]
    pub fn apply(&self, all: &[Arc<Quake>], now: DateTime<Utc>) -> Snapshot {
        if self.is_empty() {
            return all.iter().cloned().collect();
        }
        let predicate = self.predicate(now);
        all.iter()
            .filter(|quake| predicate.matches(quake))
            .cloned()
            .collect()
    }
}

#[derive(Copy, Clone, Debug)]
pub struct FilterPredicate<'a> {
    country: Option<&'a str>,
    min_magnitude: Option<f64>,
    cutoff: Option<DateTime<Utc>>,
}

impl FilterPredicate<'_> {
    #[must_use]
    pub fn matches(&self, quake: &Quake) -> bool {
        if let Some(country) = self.country {
            if quake.country.as_deref() != Some(country) {
                return false;
            }
        }
        if let Some(min) = self.min_magnitude {
            if quake.magnitude < min {
                return false;
            }
        }
        if let Some(cutoff) = self.cutoff {
            if quake.time < cutoff {
                return false;
            }
        }
        true
    }
}
