//! In-view membership.
//!
//! Recomputing the in-view collection is exposed as two explicit phase
//! transitions, [`InViewTracker::begin`] then [`InViewTracker::commit`], so a
//! presentation layer can show a transient loading state. The computation
//! itself is synchronous; the phases only gate observers and reentrancy.

use thiserror::Error;

use crate::geo_bounds::ViewportTest;
use crate::model::{empty_snapshot, Snapshot};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeError {
    #[error("in-view recompute already in progress")]
    AlreadyRecomputing,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Recomputing,
}

/// Proof that [`InViewTracker::begin`] succeeded. Consumed by `commit`.
#[derive(Debug)]
#[must_use = "a started recompute must be committed"]
pub struct PendingRecompute {
    generation: u64,
}

#[derive(Debug)]
pub struct InViewTracker {
    phase: Phase,
    current: Snapshot,
    generation: u64,
}

impl Default for InViewTracker {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            current: empty_snapshot(),
            generation: 0,
        }
    }
}

/// Keeps the members of `filtered` inside `test`, in `filtered` order.
#[must_use]
pub fn compute_in_view(filtered: &Snapshot, test: &ViewportTest) -> Snapshot {
    if filtered.is_empty() {
        return empty_snapshot();
    }
    if matches!(test, ViewportTest::Global) {
        return filtered.iter().cloned().collect();
    }
    filtered
        .iter()
        .filter(|quake| test.contains(quake.position()))
        .cloned()
        .collect()
}

impl InViewTracker {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn is_recomputing(&self) -> bool {
        matches!(self.phase, Phase::Recomputing)
    }

    /// The last committed in-view collection.
    #[must_use]
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// Number of commits so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn begin(&mut self) -> Result<PendingRecompute, RecomputeError> {
        if self.is_recomputing() {
            return Err(RecomputeError::AlreadyRecomputing);
        }
        self.phase = Phase::Recomputing;
        Ok(PendingRecompute {
            generation: self.generation,
        })
    }

    pub fn commit(&mut self, pending: PendingRecompute, result: Snapshot) -> &Snapshot {
        debug_assert_eq!(pending.generation, self.generation);
        self.current = result;
        self.generation += 1;
        self.phase = Phase::Idle;
        &self.current
    }

    /// Runs a full begin/compute/commit cycle.
    pub fn recompute(
        &mut self,
        filtered: &Snapshot,
        test: &ViewportTest,
    ) -> Result<&Snapshot, RecomputeError> {
        let pending = self.begin()?;
        let result = compute_in_view(filtered, test);
        Ok(self.commit(pending, result))
    }
}
