//! Snapshot reconstruction with a per-step memo
//!
//! `build(step)` starts from the closest cached step at or below the target
//! and folds the deltas forward. Step 0 is cached from the start, so a fold
//! never has to look further back. Committed steps never change, which makes
//! every cache entry valid until the owning session is dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Delta, Timeline};
use crate::error::{CoreError, Result};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone)]
pub struct SnapshotReconstructor {
    timeline: Timeline,
    cache: BTreeMap<usize, Arc<Snapshot>>,
}

impl SnapshotReconstructor {
    pub fn new(timeline: Timeline) -> Self {
        let mut cache = BTreeMap::new();
        cache.insert(0, Arc::new(timeline.baseline().clone()));
        Self { timeline, cache }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    pub fn last_step(&self) -> usize {
        self.timeline.last_step()
    }

    /// Full snapshot at `step`, `0 <= step <= N`.
    pub fn build(&mut self, step: usize) -> Result<Arc<Snapshot>> {
        let max = self.timeline.last_step();
        if step > max {
            return Err(CoreError::StepOutOfRange { requested: step as f64, max });
        }
        if let Some(hit) = self.cache.get(&step) {
            return Ok(Arc::clone(hit));
        }

        let (from, mut work) = match self.cache.range(..=step).next_back() {
            Some((&s, snap)) => (s, Snapshot::clone(snap)),
            None => (0, self.timeline.baseline().clone()),
        };
        for s in from + 1..=step {
            if let Some(delta) = self.timeline.delta(s) {
                delta.apply_to(&mut work);
            }
        }
        tracing::trace!(step, from, "snapshot folded");

        let built = Arc::new(work);
        self.cache.insert(step, Arc::clone(&built));
        Ok(built)
    }

    /// Fold from the baseline without touching the cache.
    pub fn build_uncached(&self, step: usize) -> Result<Snapshot> {
        let max = self.timeline.last_step();
        if step > max {
            return Err(CoreError::StepOutOfRange { requested: step as f64, max });
        }
        let mut work = self.timeline.baseline().clone();
        for s in 1..=step {
            if let Some(delta) = self.timeline.delta(s) {
                delta.apply_to(&mut work);
            }
        }
        Ok(work)
    }

    /// Append a delta whose full result is already known.
    ///
    /// `result` must equal the fold of `delta` over the previous last step;
    /// the recorder guarantees this by producing both from the same fold.
    pub(crate) fn append(&mut self, delta: Delta, result: Snapshot) -> usize {
        let step = self.timeline.push(delta);
        self.cache.insert(step, Arc::new(result));
        step
    }

    pub fn is_cached(&self, step: usize) -> bool {
        self.cache.contains_key(&step)
    }

    pub fn cached_steps(&self) -> usize {
        self.cache.len()
    }
}
