//! Grouped counts for the summary charts.
//!
//! Every function here is pure and deterministic: the same input collection
//! always yields the same buckets in the same order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::model::Quake;
use crate::sort::collate;

/// Magnitude category: the integer floor, or the overflow bucket at and
/// above a configured ceiling. Overflow always orders last.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeBucket {
    Floor(i32),
    Overflow(i32),
}

impl MagnitudeBucket {
    #[must_use]
    pub fn classify(magnitude: f64, ceiling: i32) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let floor = magnitude.floor() as i32;
        if floor >= ceiling {
            Self::Overflow(ceiling)
        } else {
            Self::Floor(floor)
        }
    }

    /// Lower edge of the bucket, used to pick a colour.
    #[must_use]
    pub const fn lower_bound(self) -> i32 {
        match self {
            Self::Floor(n) | Self::Overflow(n) => n,
        }
    }
}

impl fmt::Display for MagnitudeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Floor(n) => write!(f, "{n}-{}", n + 1),
            Self::Overflow(n) => write!(f, "{n}+"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount<C> {
    pub category: C,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBucket {
    pub date: NaiveDate,
    pub count: usize,
    /// Per-magnitude split of `count`, for stacked bars.
    pub breakdown: Vec<CategoryCount<MagnitudeBucket>>,
}

fn count_by_magnitude<'a>(
    quakes: impl IntoIterator<Item = &'a Arc<Quake>>,
    ceiling: i32,
) -> Vec<CategoryCount<MagnitudeBucket>> {
    let mut buckets: BTreeMap<MagnitudeBucket, usize> = BTreeMap::new();
    for quake in quakes {
        *buckets
            .entry(MagnitudeBucket::classify(quake.magnitude, ceiling))
            .or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect()
}

/// Counts per magnitude floor, ascending, overflow bucket last.
#[must_use]
pub fn by_magnitude(quakes: &[Arc<Quake>], ceiling: i32) -> Vec<CategoryCount<MagnitudeBucket>> {
    count_by_magnitude(quakes, ceiling)
}

/// Counts per UTC calendar date, oldest first, each with a magnitude split.
#[must_use]
pub fn by_date(quakes: &[Arc<Quake>], ceiling: i32) -> Vec<DateBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<&Arc<Quake>>> = BTreeMap::new();
    for quake in quakes {
        days.entry(quake.date()).or_default().push(quake);
    }
    days.into_iter()
        .map(|(date, members)| DateBucket {
            date,
            count: members.len(),
            breakdown: count_by_magnitude(members, ceiling),
        })
        .collect()
}

/// Counts per country label, most frequent first. Ties keep first-seen order.
#[must_use]
pub fn by_country(quakes: &[Arc<Quake>]) -> Vec<CategoryCount<String>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount<String>> = Vec::new();
    for quake in quakes {
        let label = quake.country_label();
        match index.get(label) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(label, counts.len());
                counts.push(CategoryCount {
                    category: label.to_owned(),
                    count: 1,
                });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Distinct country labels present in `quakes`, in collation order.
#[must_use]
pub fn country_options(quakes: &[Arc<Quake>]) -> Vec<String> {
    let mut options: Vec<String> = quakes
        .iter()
        .filter_map(|quake| quake.country.clone())
        .collect();
    options.sort_by(|a, b| collate(a, b));
    options.dedup();
    options
}

/// All three chart aggregations over one collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub magnitudes: Vec<CategoryCount<MagnitudeBucket>>,
    pub dates: Vec<DateBucket>,
    pub countries: Vec<CategoryCount<String>>,
}

impl Summary {
    #[must_use]
    pub fn of(quakes: &[Arc<Quake>], magnitude_ceiling: i32, date_ceiling: i32) -> Self {
        Self {
            total: quakes.len(),
            magnitudes: by_magnitude(quakes, magnitude_ceiling),
            dates: by_date(quakes, date_ceiling),
            countries: by_country(quakes),
        }
    }

    #[must_use]
    pub fn magnitude_count(&self, bucket: MagnitudeBucket) -> usize {
        self.magnitudes
            .iter()
            .find(|c| c.category == bucket)
            .map_or(0, |c| c.count)
    }
}
