//! Viewport normalization.
//!
//! Map viewports arrive as two raw corners whose longitudes may sit outside
//! `[-180, 180]`: the map reports a pan across the seam as `east = 190`
//! rather than `-170`, and a fully zoomed-out view can span more than one
//! revolution. [`RawViewport::normalize`] resolves a pair of corners into a
//! reusable [`ViewportTest`] that is applied to every candidate point.

use serde::{Deserialize, Serialize};

/// A raw longitude/latitude pair in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// The two corners of a map viewport exactly as the map reported them.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawViewport {
    pub south_west: LngLat,
    pub north_east: LngLat,
}

/// Wraps a longitude into `[-180, 180]` by whole revolutions.
///
/// Values already in range (including both endpoints) are returned as-is.
/// Non-finite input is passed through so that membership tests reject it.
#[must_use]
pub fn normalize_lng(lng: f64) -> f64 {
    if !lng.is_finite() {
        return lng;
    }
    if lng > 180.0 {
        lng - 360.0 * ((lng - 180.0) / 360.0).ceil()
    } else if lng < -180.0 {
        lng + 360.0 * ((-180.0 - lng) / 360.0).ceil()
    } else {
        lng
    }
}

/// Point-in-viewport predicate built once per viewport change.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum ViewportTest {
    /// The viewport covers the whole globe.
    #[default]
    Global,
    /// A bounded rectangle; `west > east` means it crosses the ±180° seam.
    Bounded {
        west: f64,
        east: f64,
        south: f64,
        north: f64,
    },
}

impl RawViewport {
    #[must_use]
    pub const fn new(south_west: LngLat, north_east: LngLat) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    #[must_use]
    pub fn west(&self) -> f64 {
        self.south_west.lng
    }

    #[must_use]
    pub fn east(&self) -> f64 {
        self.north_east.lng
    }

    /// Whether the raw corners describe a view of the entire globe.
    #[must_use]
    pub fn is_global(&self) -> bool {
        let (west, east) = (self.west(), self.east());
        west <= -360.0 || east >= 360.0 || east - west > 360.0
    }

    /// Resolves the raw corners into a membership test.
    #[must_use]
    pub fn normalize(&self) -> ViewportTest {
        if self.is_global() {
            return ViewportTest::Global;
        }

        let (south, north) = if self.south_west.lat <= self.north_east.lat {
            (self.south_west.lat, self.north_east.lat)
        } else {
            (self.north_east.lat, self.south_west.lat)
        };

        ViewportTest::Bounded {
            west: normalize_lng(self.west()),
            east: normalize_lng(self.east()),
            south,
            north,
        }
    }
}

impl ViewportTest {
    #[must_use]
    pub fn crosses_seam(&self) -> bool {
        matches!(self, Self::Bounded { west, east, .. } if west > east)
    }

    #[must_use]
    pub fn contains(&self, point: LngLat) -> bool {
        match *self {
            Self::Global => true,
            Self::Bounded {
                west,
                east,
                south,
                north,
            } => {
                if !(south..=north).contains(&point.lat) {
                    return false;
                }
                let lng = normalize_lng(point.lng);
                if !lng.is_finite() {
                    return false;
                }
                if west <= east {
                    west <= lng && lng <= east
                } else {
                    lng >= west || lng <= east
                }
            }
        }
    }
}
