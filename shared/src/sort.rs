//! Ordering of event collections.
//!
//! Sorting is stable. `all` and `filtered` are always ordered with the same
//! comparator, so restricting the sorted `all` to the members of `filtered`
//! yields exactly the sorted `filtered`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::model::{Quake, Snapshot};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Largest magnitude first.
    Magnitude,
    /// Most recent first.
    #[default]
    Time,
    /// Country label ascending, events without a country last.
    Country,
}

impl SortKey {
    pub const ALL: [Self; 3] = [Self::Magnitude, Self::Time, Self::Country];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Magnitude => "magnitude",
            Self::Time => "time",
            Self::Country => "country",
        }
    }

    #[must_use]
    pub fn compare(self, a: &Quake, b: &Quake) -> Ordering {
        match self {
            Self::Magnitude => b.magnitude.total_cmp(&a.magnitude),
            Self::Time => b.time.cmp(&a.time),
            Self::Country => compare_country(a.country.as_deref(), b.country.as_deref()),
        }
    }

    /// Returns a newly allocated, stably sorted copy of `quakes`.
    #[must_use]
    pub fn sorted(self, quakes: &[Arc<Quake>]) -> Snapshot {
        let mut ordered = quakes.to_vec();
        ordered.sort_by(|a, b| self.compare(a, b));
        ordered.into()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absent countries sort after every labelled one.
#[must_use]
pub fn compare_country(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => collate(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Orders labels by their Unicode lowercase code points, then by the raw text.
///
/// This is not locale collation: accented initials sort after `z`, so
/// "Éire" comes after "Zambia".
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuakeId;
    use chrono::{TimeDelta, TimeZone, Utc};
    use proptest::prelude::*;

    fn quake(id: &str, magnitude: f64, country: Option<&str>, minutes_ago: i64) -> Arc<Quake> {
        Arc::new(Quake {
            id: QuakeId::new(id),
            place: String::new(),
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                - TimeDelta::minutes(minutes_ago),
            latitude: 0.0,
            longitude: 0.0,
            depth: 0.0,
            magnitude,
            country: country.map(str::to_owned),
        })
    }

    fn ids(snapshot: &Snapshot) -> Vec<String> {
        snapshot.iter().map(|q| q.id.to_string()).collect()
    }

    #[test]
    fn country_sort_puts_missing_country_last() {
        let quakes = vec![
            quake("jp", 1.0, Some("Japan"), 0),
            quake("sea", 1.0, None, 0),
            quake("cl", 1.0, Some("Chile"), 0),
        ];
        assert_eq!(ids(&SortKey::Country.sorted(&quakes)), ["cl", "jp", "sea"]);
    }

    #[test]
    fn country_collation_ignores_case() {
        let quakes = vec![
            quake("upper", 1.0, Some("Peru"), 0),
            quake("lower", 1.0, Some("argentina"), 0),
        ];
        assert_eq!(ids(&SortKey::Country.sorted(&quakes)), ["lower", "upper"]);
    }

    #[test]
    fn magnitude_sort_is_descending_and_stable() {
        let quakes = vec![
            quake("a", 3.0, None, 0),
            quake("b", 5.0, None, 0),
            quake("c", 3.0, None, 0),
            quake("d", 7.2, None, 0),
        ];
        assert_eq!(ids(&SortKey::Magnitude.sorted(&quakes)), ["d", "b", "a", "c"]);
    }

    #[test]
    fn time_sort_is_most_recent_first() {
        let quakes = vec![
            quake("old", 1.0, None, 90),
            quake("new", 1.0, None, 1),
            quake("mid", 1.0, None, 30),
        ];
        assert_eq!(ids(&SortKey::Time.sorted(&quakes)), ["new", "mid", "old"]);
    }

    #[test]
    fn collation_is_code_point_order_after_lowercasing() {
        assert_eq!(collate("Éire", "Zambia"), Ordering::Greater);
        assert_eq!(collate("éire", "Éire"), Ordering::Greater);
        assert_eq!(collate("chile", "Chile"), Ordering::Greater);
        assert_eq!(SortKey::default(), SortKey::Time);
    }

    proptest! {
        #[test]
        fn sorting_a_subset_matches_restricting_the_sorted_whole(
            mags in proptest::collection::vec(0u8..10, 0..40),
            keep in proptest::collection::vec(any::<bool>(), 40),
            key in prop_oneof![
                Just(SortKey::Magnitude),
                Just(SortKey::Time),
                Just(SortKey::Country),
            ],
        ) {
            let countries = [Some("Chile"), None, Some("Japan"), Some("chile")];
            let all: Vec<_> = mags
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let minutes = i64::from(*m) * 7 % 5;
                    quake(&i.to_string(), f64::from(*m), countries[i % 4], minutes)
                })
                .collect();
            let subset: Vec<_> = all
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(q, _)| Arc::clone(q))
                .collect();

            let sorted_all = key.sorted(&all);
            let sorted_subset = key.sorted(&subset);
            let restricted: Vec<_> = sorted_all
                .iter()
                .filter(|q| subset.iter().any(|s| s.id == q.id))
                .map(|q| q.id.clone())
                .collect();
            let direct: Vec<_> = sorted_subset.iter().map(|q| q.id.clone()).collect();
            prop_assert_eq!(restricted, direct);
        }
    }
}
