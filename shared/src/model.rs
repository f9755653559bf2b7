use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

use crate::aggregate::MagnitudeBucket;
use crate::config::CoreConfig;
use crate::engine::{QuakeEngine, Topic};
use crate::geo_bounds::LngLat;
use crate::AppError;

/// Event identifier as delivered by the feed: either text or a number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuakeId {
    Numeric(i64),
    Text(String),
}

impl QuakeId {
    pub fn new(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

impl fmt::Display for QuakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QuakeId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<i64> for QuakeId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

/// A single earthquake record. Immutable once ingested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quake {
    #[serde(rename = "earthquake_id")]
    pub id: QuakeId,
    #[serde(default)]
    pub place: String,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub depth: f64,
    pub magnitude: f64,
    #[serde(default)]
    pub country: Option<String>,
}

impl Quake {
    #[must_use]
    pub fn position(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    /// The country label, or the oceanic sentinel when absent.
    #[must_use]
    pub fn country_label(&self) -> &str {
        self.country.as_deref().unwrap_or(crate::INTERNATIONAL)
    }

    /// Calendar date of the event in UTC.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

/// Immutable, shareable collection. Every recompute produces a new one.
pub type Snapshot = Arc<[Arc<Quake>]>;

#[must_use]
pub fn empty_snapshot() -> Snapshot {
    Arc::from(Vec::<Arc<Quake>>::new())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    List,
    Filter,
    Graph,
}

/// Sidebar panels. At most one is open at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarPanels {
    open: Option<Panel>,
}

impl Default for SidebarPanels {
    fn default() -> Self {
        Self {
            open: Some(Panel::List),
        }
    }
}

impl SidebarPanels {
    #[must_use]
    pub const fn open_panel(&self) -> Option<Panel> {
        self.open
    }

    #[must_use]
    pub fn is_open(&self, panel: Panel) -> bool {
        self.open == Some(panel)
    }

    #[must_use]
    pub const fn any_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open(&mut self, panel: Panel) {
        self.open = Some(panel);
    }

    /// Opens `panel`, or closes it if it is already the open one.
    pub fn toggle(&mut self, panel: Panel) {
        self.open = if self.is_open(panel) { None } else { Some(panel) };
    }

    pub fn close_all(&mut self) {
        self.open = None;
    }
}

/// Which collection the graph panel summarizes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationScope {
    #[default]
    InView,
    Filtered,
}

/// The chart segment currently under the pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartHover {
    Magnitude { bucket: MagnitudeBucket, count: usize },
    Date { date: NaiveDate, count: usize },
    Country { country: String, count: usize },
}

impl ChartHover {
    #[must_use]
    pub fn caption(&self) -> String {
        match self {
            Self::Magnitude { bucket, count } => {
                format!("Magnitude {bucket}: {count} {}", plural(*count))
            }
            Self::Date { date, count } => {
                format!("{}: {count} {}", date.format("%b %-d"), plural(*count))
            }
            Self::Country { country, count } => {
                format!("{country}: {count} {}", plural(*count))
            }
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "earthquake"
    } else {
        "earthquakes"
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Crux model. The engine owns every collection; the rest is UI chrome.
#[derive(Debug, Default)]
pub struct Model {
    pub engine: QuakeEngine,
    pub config: CoreConfig,
    pub panels: SidebarPanels,
    pub scope: AggregationScope,
    pub hover: Option<ChartHover>,
    pub fetch_status: FetchStatus,
    pub active_error: Option<AppError>,
    /// Topics touched by the last update, for renderers that repaint selectively.
    pub changed: Vec<Topic>,
}

impl Model {
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.fetch_status, FetchStatus::Loading)
    }
}
