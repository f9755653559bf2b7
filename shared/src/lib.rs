// lib.rs - Earthquake explorer core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod aggregate;
pub mod capabilities;
pub mod config;
pub mod engine;
pub mod event;
pub mod export;
pub mod filter;
pub mod geo_bounds;
pub mod model;
pub mod palette;
pub mod sort;
pub mod viewport;

use chrono::{DateTime, TimeDelta, Utc};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

use crate::aggregate::{MagnitudeBucket, Summary};
use crate::config::ConfigError;
use crate::engine::Topic;
use crate::model::{AggregationScope, Panel, Quake, QuakeId};
use crate::palette::magnitude_color;
use crate::sort::SortKey;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;

/// Category for events without a country (mostly oceanic).
pub const INTERNATIONAL: &str = "International";
pub const LIST_DATE_FORMAT: &str = "%b %-d, %Y";
pub const LIST_TIME_FORMAT: &str = "%-I:%M %p UTC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Deserialization,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIG_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to load earthquakes. Please check your connection and try again.".into()
            }
            ErrorKind::Deserialization => {
                "The earthquake feed returned data we could not read.".into()
            }
            ErrorKind::Configuration => self.message.clone(),
        }
    }
}

impl AppError {
    /// A feed that arrives but does not decode is not a connectivity problem.
    #[must_use]
    pub fn from_fetch_error(error: &crux_http::Error) -> Self {
        let kind = match error {
            crux_http::Error::Json(_) => ErrorKind::Deserialization,
            _ => ErrorKind::Network,
        };
        Self::new(kind, "failed to fetch earthquakes").with_internal(error.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::new(ErrorKind::Configuration, format!("Invalid configuration: {e}"))
    }
}

#[must_use]
pub fn format_time_ago(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(time);
    if diff < TimeDelta::zero() {
        return if -diff < TimeDelta::minutes(1) {
            "Just now".into()
        } else {
            "Upcoming".into()
        };
    }

    let diff_secs = diff.num_seconds();
    if diff_secs < 5 {
        return "Just now".into();
    }
    if diff_secs < 60 {
        return format!("{diff_secs}s ago");
    }

    let diff_mins = diff.num_minutes();
    if diff_mins < 60 {
        return format!("{diff_mins}m ago");
    }

    let diff_hours = diff.num_hours();
    if diff_hours < 24 {
        return format!("{diff_hours}h ago");
    }

    let diff_days = diff.num_days();
    if diff_days < 7 {
        return format!("{diff_days}d ago");
    }
    if diff_days < 30 {
        return format!("{}w ago", diff_days / 7);
    }
    if diff_days < 365 {
        return format!("{}mo ago", diff_days / 30);
    }

    format!("{}y ago", diff_days / 365)
}

#[must_use]
pub fn format_magnitude(magnitude: f64) -> String {
    format!("{magnitude:.1}")
}

#[must_use]
pub fn format_depth(depth_km: f64) -> String {
    format!("{depth_km:.1} km")
}

// --- View model ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuakeListItem {
    pub id: QuakeId,
    pub place: String,
    pub country: String,
    pub magnitude: f64,
    pub magnitude_text: String,
    pub depth_text: String,
    pub date_text: String,
    pub time_text: String,
    pub time_ago: String,
    pub color_token: String,
    pub is_selected: bool,
}

impl QuakeListItem {
    fn new(quake: &Quake, is_selected: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: quake.id.clone(),
            place: quake.place.clone(),
            country: quake.country_label().to_owned(),
            magnitude: quake.magnitude,
            magnitude_text: format_magnitude(quake.magnitude),
            depth_text: format_depth(quake.depth),
            date_text: quake.time.format(LIST_DATE_FORMAT).to_string(),
            time_text: quake.time.format(LIST_TIME_FORMAT).to_string(),
            time_ago: format_time_ago(quake.time, now),
            color_token: magnitude_color(quake.magnitude).token.to_owned(),
            is_selected,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuakeDetail {
    pub id: QuakeId,
    pub place: String,
    pub country: String,
    pub magnitude_text: String,
    pub depth_text: String,
    pub latitude: f64,
    pub longitude: f64,
    pub time: DateTime<Utc>,
    pub color_hex: String,
    /// Whether the event passes the active filters.
    pub is_filtered_in: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FilterView {
    pub country: Option<String>,
    pub country_options: Vec<String>,
    pub min_magnitude: Option<f64>,
    pub recency_hours: Option<f64>,
    pub magnitude_presets: Vec<f64>,
    pub recency_presets_hours: Vec<f64>,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SortView {
    pub key: SortKey,
    pub options: Vec<SortKey>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MagnitudeSegment {
    pub bucket: MagnitudeBucket,
    pub label: String,
    pub count: usize,
    pub color_hex: String,
    pub hover_hex: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChartView {
    pub scope: AggregationScope,
    pub summary: Summary,
    pub magnitude_segments: Vec<MagnitudeSegment>,
    pub hover_caption: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counts {
    pub all: usize,
    pub filtered: usize,
    pub in_view: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub markers: FeatureCollection,
    pub list: Vec<QuakeListItem>,
    pub selected: Option<QuakeDetail>,
    pub filters: FilterView,
    pub sort: SortView,
    pub open_panel: Option<Panel>,
    pub charts: Option<ChartView>,
    pub counts: Counts,
    pub changed: Vec<Topic>,
    pub is_loading: bool,
    pub is_recomputing: bool,
    pub error: Option<UserFacingError>,
}

pub mod app {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::config::CoreConfig;
    use crate::export::marker_layer;
    use crate::filter::{normalize_country, parse_magnitude, parse_recency, FilterState, RecencyWindow};
    use crate::model::{ChartHover, FetchStatus};
    use tracing::{debug, warn};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn fetch_quakes(model: &mut Model, caps: &Capabilities) {
            let url = match model.config.quakes_url() {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build feed url");
                    model.fetch_status = FetchStatus::Failed;
                    model.active_error = Some(e.into());
                    return;
                }
            };

            debug!(%url, "fetching earthquakes");
            model.fetch_status = FetchStatus::Loading;
            caps.http
                .get(url.as_str())
                .expect_json::<Vec<Quake>>()
                .send(|result| Event::QuakesFetched(Box::new(result)));
        }

        fn quakes_loaded(model: &mut Model, quakes: Vec<Quake>, now: DateTime<Utc>) {
            debug!(count = quakes.len(), "earthquakes loaded");
            model.engine.set_all(quakes, now);
            model.fetch_status = FetchStatus::Loaded;
            model.active_error = None;
        }

        /// A failed fetch leaves an empty collection behind.
        fn fetch_failed(model: &mut Model, error: AppError, now: DateTime<Utc>) {
            warn!(%error, "earthquake fetch failed");
            model.engine.set_all(Vec::new(), now);
            model.fetch_status = FetchStatus::Failed;
            model.active_error = Some(error);
        }

        fn handle_fetched(model: &mut Model, result: event::FetchResult, now: DateTime<Utc>) {
            match result {
                Ok(mut response) => match response.take_body() {
                    Some(quakes) => Self::quakes_loaded(model, quakes, now),
                    None => Self::fetch_failed(
                        model,
                        AppError::new(ErrorKind::Deserialization, "empty response body"),
                        now,
                    ),
                },
                Err(e) => Self::fetch_failed(model, AppError::from_fetch_error(&e), now),
            }
        }

        fn non_blank(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|s| !s.is_empty())
        }

        fn build_list_items(model: &Model, now: DateTime<Utc>) -> Vec<QuakeListItem> {
            let selected = model.engine.selected_id();
            model
                .engine
                .selected_first()
                .iter()
                .map(|quake| QuakeListItem::new(quake, selected == Some(&quake.id), now))
                .collect()
        }

        fn build_detail(model: &Model) -> Option<QuakeDetail> {
            let quake = model.engine.selected()?;
            Some(QuakeDetail {
                id: quake.id.clone(),
                place: quake.place.clone(),
                country: quake.country_label().to_owned(),
                magnitude_text: format_magnitude(quake.magnitude),
                depth_text: format_depth(quake.depth),
                latitude: quake.latitude,
                longitude: quake.longitude,
                time: quake.time,
                color_hex: magnitude_color(quake.magnitude).hex.to_owned(),
                is_filtered_in: model.engine.filtered().iter().any(|q| q.id == quake.id),
            })
        }

        fn build_filters(model: &Model) -> FilterView {
            let filter = model.engine.filter();
            FilterView {
                country: filter.country.clone(),
                country_options: model.engine.country_options(),
                min_magnitude: filter.min_magnitude,
                recency_hours: filter.recency.map(RecencyWindow::hours),
                magnitude_presets: model.config.magnitude_presets.clone(),
                recency_presets_hours: model.config.recency_presets_hours.clone(),
                is_active: !filter.is_empty(),
            }
        }

        fn build_charts(model: &Model) -> Option<ChartView> {
            if !model.panels.is_open(Panel::Graph) {
                return None;
            }
            let summary = model.engine.summary(
                model.scope,
                model.config.magnitude_chart_ceiling,
                model.config.date_chart_ceiling,
            );
            let magnitude_segments = summary
                .magnitudes
                .iter()
                .map(|c| {
                    let color = magnitude_color(f64::from(c.category.lower_bound()));
                    MagnitudeSegment {
                        bucket: c.category,
                        label: c.category.to_string(),
                        count: c.count,
                        color_hex: color.hex.to_owned(),
                        hover_hex: color.hover_hex,
                    }
                })
                .collect();
            Some(ChartView {
                scope: model.scope,
                summary,
                magnitude_segments,
                hover_caption: model.hover.as_ref().map(ChartHover::caption),
            })
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            debug!(event = event.name(), "update");
            let now = Utc::now();

            // Counts under the pointer go stale once the collections change.
            if event.touches_pipeline() {
                model.hover = None;
            }

            match event {
                Event::AppStarted | Event::RefreshRequested => {
                    Self::fetch_quakes(model, caps);
                }

                Event::ConfigLoaded { json } => match CoreConfig::from_json(&json) {
                    Ok(config) => {
                        debug!(api = %config.api_base_url, "config loaded");
                        model.config = config;
                        model.active_error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "config rejected, keeping previous");
                        model.active_error = Some(e.into());
                    }
                },

                Event::QuakesFetched(result) => Self::handle_fetched(model, *result, now),

                Event::QuakesLoaded(quakes) => Self::quakes_loaded(model, quakes, now),

                Event::FetchFailed { reason } => Self::fetch_failed(
                    model,
                    AppError::new(ErrorKind::Network, "failed to fetch earthquakes")
                        .with_internal(reason),
                    now,
                ),

                Event::CountrySelected { country } => {
                    model
                        .engine
                        .set_country(normalize_country(country.as_deref()), now);
                }

                Event::MinMagnitudeChanged { value } => {
                    let result = Self::non_blank(value.as_deref())
                        .map(parse_magnitude)
                        .transpose()
                        .and_then(|magnitude| model.engine.set_min_magnitude(magnitude, now));
                    if let Err(e) = result {
                        warn!(error = %e, "magnitude filter rejected");
                    }
                }

                Event::RecencyChanged { hours } => {
                    let result = Self::non_blank(hours.as_deref())
                        .map(parse_recency)
                        .transpose()
                        .and_then(|window| {
                            model
                                .engine
                                .set_recency_hours(window.map(RecencyWindow::hours), now)
                        });
                    if let Err(e) = result {
                        warn!(error = %e, "recency filter rejected");
                    }
                }

                Event::FiltersCleared => model.engine.set_filters(FilterState::default(), now),

                Event::SortChanged { key } => model.engine.set_sort(key),

                Event::ViewportSettled { viewport } => model.engine.set_viewport(viewport),

                Event::QuakeTapped { id } => {
                    model.engine.select(&id);
                }

                Event::SelectionCleared => {
                    model.engine.clear_selection();
                }

                Event::PanelToggled { panel } => {
                    model.panels.toggle(panel);
                    if !model.panels.is_open(Panel::Graph) {
                        model.hover = None;
                    }
                }

                Event::PanelsClosed => {
                    model.panels.close_all();
                    model.hover = None;
                }

                Event::ScopeChanged { scope } => {
                    model.scope = scope;
                    model.hover = None;
                }

                Event::ChartHovered { hover } => model.hover = Some(hover),

                Event::ChartHoverCleared => model.hover = None,
            }

            let mut changed: Vec<Topic> = Vec::new();
            for notice in model.engine.notices().drain() {
                debug!(?notice, "engine notice");
                if !changed.contains(&notice.topic()) {
                    changed.push(notice.topic());
                }
            }
            model.changed = changed;

            debug!(
                all = model.engine.all().len(),
                filtered = model.engine.filtered().len(),
                in_view = model.engine.in_view().len(),
                "collections"
            );
            caps.render.render();
        }

        fn view(&self, model: &Model) -> ViewModel {
            let now = Utc::now();
            let engine = &model.engine;

            ViewModel {
                markers: marker_layer(engine.filtered(), engine.selected_id()),
                list: Self::build_list_items(model, now),
                selected: Self::build_detail(model),
                filters: Self::build_filters(model),
                sort: SortView {
                    key: engine.sort_key(),
                    options: SortKey::ALL.to_vec(),
                },
                open_panel: model.panels.open_panel(),
                charts: Self::build_charts(model),
                counts: Counts {
                    all: engine.all().len(),
                    filtered: engine.filtered().len(),
                    in_view: engine.in_view().len(),
                },
                changed: model.changed.clone(),
                is_loading: model.is_loading(),
                is_recomputing: engine.is_recomputing(),
                error: model.active_error.as_ref().map(UserFacingError::from),
            }
        }
    }
}
