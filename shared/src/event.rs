use serde::{Deserialize, Serialize};

use crate::geo_bounds::RawViewport;
use crate::model::{AggregationScope, ChartHover, Panel, Quake, QuakeId};
use crate::sort::SortKey;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("invalid magnitude threshold: {0}")]
    InvalidMagnitude(f64),
    #[error("invalid recency window: {0} hours")]
    InvalidRecency(f64),
}

pub type FetchResult = crux_http::Result<crux_http::Response<Vec<Quake>>>;

// --- Event enum: the whole mutation surface the shells dispatch ---

#[derive(Serialize, Deserialize, Debug)]
pub enum Event {
    // Lifecycle & Fetch
    AppStarted,
    ConfigLoaded {
        json: String,
    },
    RefreshRequested,
    QuakesLoaded(Vec<Quake>),
    FetchFailed {
        reason: String,
    },

    // Filters & Sort
    CountrySelected {
        country: Option<String>,
    },
    MinMagnitudeChanged {
        value: Option<String>,
    },
    RecencyChanged {
        hours: Option<String>,
    },
    FiltersCleared,
    SortChanged {
        key: SortKey,
    },

    // Map & Selection
    ViewportSettled {
        viewport: RawViewport,
    },
    QuakeTapped {
        id: QuakeId,
    },
    SelectionCleared,

    // Sidebar & Charts
    PanelToggled {
        panel: Panel,
    },
    PanelsClosed,
    ScopeChanged {
        scope: AggregationScope,
    },
    ChartHovered {
        hover: ChartHover,
    },
    ChartHoverCleared,

    // Capability Responses (boxed to keep enum size small)
    #[serde(skip)]
    QuakesFetched(Box<FetchResult>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::ConfigLoaded { .. } => "config_loaded",
            Self::RefreshRequested => "refresh_requested",
            Self::QuakesLoaded(_) => "quakes_loaded",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::CountrySelected { .. } => "country_selected",
            Self::MinMagnitudeChanged { .. } => "min_magnitude_changed",
            Self::RecencyChanged { .. } => "recency_changed",
            Self::FiltersCleared => "filters_cleared",
            Self::SortChanged { .. } => "sort_changed",
            Self::ViewportSettled { .. } => "viewport_settled",
            Self::QuakeTapped { .. } => "quake_tapped",
            Self::SelectionCleared => "selection_cleared",
            Self::PanelToggled { .. } => "panel_toggled",
            Self::PanelsClosed => "panels_closed",
            Self::ScopeChanged { .. } => "scope_changed",
            Self::ChartHovered { .. } => "chart_hovered",
            Self::ChartHoverCleared => "chart_hover_cleared",
            Self::QuakesFetched(_) => "quakes_fetched",
        }
    }

    /// Events that change which events are visible.
    #[must_use]
    pub const fn touches_pipeline(&self) -> bool {
        matches!(
            self,
            Self::QuakesLoaded(_)
                | Self::FetchFailed { .. }
                | Self::QuakesFetched(_)
                | Self::CountrySelected { .. }
                | Self::MinMagnitudeChanged { .. }
                | Self::RecencyChanged { .. }
                | Self::FiltersCleared
                | Self::SortChanged { .. }
                | Self::ViewportSettled { .. }
        )
    }
}
