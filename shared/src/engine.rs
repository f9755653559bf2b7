//! The filter/sort/viewport pipeline.
//!
//! [`QuakeEngine`] owns the raw collection and every piece of state derived
//! from it:
//!
//! ```text
//! all ──filter──▶ filtered ──viewport──▶ in_view ──aggregate──▶ charts
//!  ▲                 ▲
//!  └──── sort ───────┘
//! ```
//!
//! Derived collections are [`Snapshot`]s: every recompute allocates a new
//! one instead of mutating the previous one, so a consumer holding an old
//! snapshot always sees a consistent, if outdated, collection. All mutation
//! goes through the methods below, each of which runs to completion before
//! returning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::aggregate::{country_options, Summary};
use crate::event::ValidationError;
use crate::filter::{validate_magnitude, FilterState, RecencyWindow};
use crate::geo_bounds::{RawViewport, ViewportTest};
use crate::model::{empty_snapshot, AggregationScope, Quake, QuakeId, Snapshot};
use crate::sort::SortKey;
use crate::viewport::{compute_in_view, InViewTracker, RecomputeError};

/// What a notice is about. Renderers keep the topics they observe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    All,
    Filtered,
    InView,
    Selection,
    Recomputing,
}

/// Change notifications emitted by the engine, in the order they happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    AllReplaced { len: usize },
    FilteredChanged { len: usize },
    AllReordered { key: SortKey },
    FilteredReordered { key: SortKey },
    RecomputeStarted,
    InViewCommitted { len: usize },
    SelectionChanged { selected: Option<QuakeId> },
}

impl Notice {
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::AllReplaced { .. } | Self::AllReordered { .. } => Topic::All,
            Self::FilteredChanged { .. } | Self::FilteredReordered { .. } => Topic::Filtered,
            Self::RecomputeStarted => Topic::Recomputing,
            Self::InViewCommitted { .. } => Topic::InView,
            Self::SelectionChanged { .. } => Topic::Selection,
        }
    }
}

#[derive(Debug, Default)]
pub struct NoticeBus {
    notices: Vec<Notice>,
}

impl NoticeBus {
    pub fn emit(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Drains everything, keeping only notices on `topics`.
    pub fn drain_topics(&mut self, topics: &[Topic]) -> Vec<Notice> {
        self.drain()
            .into_iter()
            .filter(|notice| topics.contains(&notice.topic()))
            .collect()
    }
}

#[derive(Debug)]
pub struct QuakeEngine {
    all: Snapshot,
    filtered: Snapshot,
    in_view: InViewTracker,
    filter: FilterState,
    sort: SortKey,
    viewport: Option<RawViewport>,
    membership: ViewportTest,
    selected: Option<QuakeId>,
    bus: NoticeBus,
}

impl Default for QuakeEngine {
    fn default() -> Self {
        Self {
            all: empty_snapshot(),
            filtered: empty_snapshot(),
            in_view: InViewTracker::default(),
            filter: FilterState::default(),
            sort: SortKey::default(),
            viewport: None,
            membership: ViewportTest::Global,
            selected: None,
            bus: NoticeBus::default(),
        }
    }
}

impl QuakeEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read-only snapshots ---

    #[must_use]
    pub fn all(&self) -> &Snapshot {
        &self.all
    }

    #[must_use]
    pub fn filtered(&self) -> &Snapshot {
        &self.filtered
    }

    #[must_use]
    pub fn in_view(&self) -> &Snapshot {
        self.in_view.current()
    }

    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub const fn sort_key(&self) -> SortKey {
        self.sort
    }

    #[must_use]
    pub const fn viewport(&self) -> Option<RawViewport> {
        self.viewport
    }

    #[must_use]
    pub const fn is_recomputing(&self) -> bool {
        self.in_view.is_recomputing()
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&QuakeId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Arc<Quake>> {
        let id = self.selected.as_ref()?;
        self.all.iter().find(|quake| &quake.id == id)
    }

    /// The in-view collection with the selected event, if visible, first.
    #[must_use]
    pub fn selected_first(&self) -> Vec<Arc<Quake>> {
        let in_view = self.in_view();
        let Some(id) = self.selected.as_ref() else {
            return in_view.to_vec();
        };
        let mut ordered = Vec::with_capacity(in_view.len());
        ordered.extend(in_view.iter().filter(|q| &q.id == id).cloned());
        ordered.extend(in_view.iter().filter(|q| &q.id != id).cloned());
        ordered
    }

    #[must_use]
    pub fn country_options(&self) -> Vec<String> {
        country_options(&self.all)
    }

    #[must_use]
    pub fn summary(
        &self,
        scope: AggregationScope,
        magnitude_ceiling: i32,
        date_ceiling: i32,
    ) -> Summary {
        let source = match scope {
            AggregationScope::InView => self.in_view(),
            AggregationScope::Filtered => &self.filtered,
        };
        Summary::of(source, magnitude_ceiling, date_ceiling)
    }

    pub fn notices(&mut self) -> &mut NoticeBus {
        &mut self.bus
    }

    // --- Mutations ---

    /// Replaces the raw collection wholesale. A failed fetch is an empty one.
    #[instrument(skip_all, fields(len = quakes.len()))]
    pub fn set_all(&mut self, quakes: Vec<Quake>, now: DateTime<Utc>) {
        let incoming: Vec<Arc<Quake>> = quakes.into_iter().map(Arc::new).collect();
        self.all = self.sort.sorted(&incoming);
        self.bus.emit(Notice::AllReplaced {
            len: self.all.len(),
        });

        if let Some(id) = self.selected.clone() {
            if !self.all.iter().any(|quake| quake.id == id) {
                self.set_selection(None);
            }
        }

        self.refilter(now);
    }

    pub fn set_country(&mut self, country: Option<String>, now: DateTime<Utc>) {
        self.filter.country = country;
        self.refilter(now);
    }

    /// Rejects non-finite thresholds, leaving the previous one in place.
    pub fn set_min_magnitude(
        &mut self,
        magnitude: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let magnitude = magnitude.map(validate_magnitude).transpose()?;
        self.filter.min_magnitude = magnitude;
        self.refilter(now);
        Ok(())
    }

    pub fn set_recency_hours(
        &mut self,
        hours: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let window = hours.map(RecencyWindow::new).transpose()?;
        self.filter.recency = window;
        self.refilter(now);
        Ok(())
    }

    /// Applies a complete filter set at once.
    pub fn set_filters(&mut self, filter: FilterState, now: DateTime<Utc>) {
        self.filter = filter;
        self.refilter(now);
    }

    /// Reorders `all` and `filtered` with the same comparator.
    #[instrument(skip(self))]
    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = key;
        self.all = key.sorted(&self.all);
        self.filtered = key.sorted(&self.filtered);
        self.bus.emit(Notice::AllReordered { key });
        self.bus.emit(Notice::FilteredReordered { key });
        self.refresh_in_view();
    }

    pub fn set_viewport(&mut self, viewport: RawViewport) {
        self.membership = viewport.normalize();
        self.viewport = Some(viewport);
        debug!(?viewport, membership = ?self.membership, "viewport settled");
        self.refresh_in_view();
    }

    /// Toggles: selecting the selected event clears it; selecting an
    /// unknown identifier does nothing. Returns whether selection changed.
    pub fn select(&mut self, id: &QuakeId) -> bool {
        if self.selected.as_ref() == Some(id) {
            self.set_selection(None);
            return true;
        }
        if !self.all.iter().any(|quake| &quake.id == id) {
            warn!(%id, "ignoring selection of unknown event");
            return false;
        }
        self.set_selection(Some(id.clone()));
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selected.is_none() {
            return false;
        }
        self.set_selection(None);
        true
    }

    fn set_selection(&mut self, selected: Option<QuakeId>) {
        self.selected = selected;
        self.bus.emit(Notice::SelectionChanged {
            selected: self.selected.clone(),
        });
    }

    /// Rebuilds `filtered` from `all` using every active filter.
    fn refilter(&mut self, now: DateTime<Utc>) {
        self.filtered = self.filter.apply(&self.all, now);
        debug!(
            all = self.all.len(),
            filtered = self.filtered.len(),
            "filters applied"
        );
        self.bus.emit(Notice::FilteredChanged {
            len: self.filtered.len(),
        });
        self.refresh_in_view();
    }

    fn refresh_in_view(&mut self) {
        if let Err(err) = self.try_refresh_in_view() {
            warn!(%err, "in-view recompute skipped");
        }
    }

    fn try_refresh_in_view(&mut self) -> Result<(), RecomputeError> {
        let pending = self.in_view.begin()?;
        self.bus.emit(Notice::RecomputeStarted);
        let result = compute_in_view(&self.filtered, &self.membership);
        let len = self.in_view.commit(pending, result).len();
        debug!(in_view = len, "in-view committed");
        self.bus.emit(Notice::InViewCommitted { len });
        Ok(())
    }
}
