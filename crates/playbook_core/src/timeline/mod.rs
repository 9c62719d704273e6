//! Delta-encoded play timeline
//!
//! Step 0 is the baseline and lists every roster slot. Every later step is a
//! sparse delta holding only the slots that moved since the step before it.
//! The timeline only ever grows at the end.
//!
//! - `recorder`: captures the baseline and appends deltas
//! - `reconstruct`: folds deltas into full snapshots, memoized per step
//! - `interpolate`: continuous-time blending and the playback cursor
//! - `links`: leader/follower links applied while recording

pub mod interpolate;
pub mod links;
pub mod reconstruct;
pub mod recorder;

pub use interpolate::{positions_at, LoopMode, PlaybackCursor};
pub use links::{FollowLink, FollowLinks};
pub use reconstruct::SnapshotReconstructor;
pub use recorder::{CommitOutcome, DeltaRecorder};

use crate::error::{CoreError, Result};
use crate::field::Pos;
use crate::roster::Roster;
use crate::snapshot::Snapshot;

/// Per-axis movement below this is not a change.
pub const CHANGE_EPSILON: f64 = 1e-6;

/// Sparse step: `(slot, position)` pairs sorted by slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Delta {
    entries: Vec<(usize, Pos)>,
}

impl Delta {
    /// Build from arbitrary pairs; a repeated slot keeps its last position.
    pub fn new(entries: impl IntoIterator<Item = (usize, Pos)>) -> Self {
        let mut entries: Vec<(usize, Pos)> = entries.into_iter().collect();
        // stable sort keeps input order among equal slots, so the last one survives the dedup below
        entries.sort_by_key(|(slot, _)| *slot);
        let mut out: Vec<(usize, Pos)> = Vec::with_capacity(entries.len());
        for (slot, pos) in entries {
            match out.last_mut() {
                Some(last) if last.0 == slot => last.1 = pos,
                _ => out.push((slot, pos)),
            }
        }
        Self { entries: out }
    }

    /// Slots of `current` that differ from `previous` by more than `epsilon`.
    pub fn between(previous: &Snapshot, current: &Snapshot, epsilon: f64) -> Self {
        let entries = previous
            .iter()
            .zip(current.iter())
            .filter(|((_, before), (_, after))| !before.approx_eq(after, epsilon))
            .map(|(_, (slot, after))| (slot, after))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, Pos)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.entries.binary_search_by_key(&slot, |(s, _)| *s).is_ok()
    }

    /// Overwrite the touched slots of `snapshot`.
    pub fn apply_to(&self, snapshot: &mut Snapshot) {
        for &(slot, pos) in &self.entries {
            snapshot.set(slot, pos);
        }
    }
}

/// Roster, baseline and the ordered deltas of one recorded play
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    roster: Roster,
    baseline: Snapshot,
    deltas: Vec<Delta>,
}

impl Timeline {
    /// Start a timeline from a baseline covering every roster slot.
    pub fn new(roster: Roster, baseline: Snapshot) -> Result<Self> {
        if baseline.len() != roster.len() {
            let missing = roster.labels().skip(baseline.len()).map(str::to_string).collect();
            let extra = (roster.len()..baseline.len()).map(|slot| format!("slot {}", slot)).collect();
            return Err(CoreError::InvalidBaseline { missing, extra });
        }
        Ok(Self { roster, baseline, deltas: Vec::new() })
    }

    /// Assemble a whole timeline, checking every delta slot against the roster.
    pub fn from_parts(roster: Roster, baseline: Snapshot, deltas: Vec<Delta>) -> Result<Self> {
        let mut timeline = Self::new(roster, baseline)?;
        for delta in &deltas {
            if let Some(&(slot, _)) = delta.entries().iter().find(|(slot, _)| *slot >= timeline.roster.len()) {
                return Err(CoreError::UnknownLabel { label: format!("slot {}", slot) });
            }
        }
        timeline.deltas = deltas;
        Ok(timeline)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    /// Index of the last committed step (N).
    pub fn last_step(&self) -> usize {
        self.deltas.len()
    }

    /// Number of steps including the baseline (N + 1).
    pub fn step_count(&self) -> usize {
        self.deltas.len() + 1
    }

    /// Delta stored at `step`; `None` for the baseline and past the end.
    pub fn delta(&self, step: usize) -> Option<&Delta> {
        step.checked_sub(1).and_then(|i| self.deltas.get(i))
    }

    /// Entries recorded at `step`, the baseline listing every slot.
    pub fn step_entries(&self, step: usize) -> Option<Vec<(usize, Pos)>> {
        if step == 0 {
            return Some(self.baseline.iter().collect());
        }
        self.delta(step).map(|d| d.entries().to_vec())
    }

    pub(crate) fn push(&mut self, delta: Delta) -> usize {
        self.deltas.push(delta);
        self.deltas.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Entity, Team};

    fn roster2() -> Roster {
        Roster::new(vec![Entity::player("A", Team::Blue), Entity::player("B", Team::Red)])
    }

    #[test]
    fn test_delta_between_respects_epsilon() {
        let before = Snapshot::new(vec![Pos::new(0.0, 0.0), Pos::new(10.0, 10.0)]);
        let after = Snapshot::new(vec![Pos::new(1.0, 1.0), Pos::new(10.0 + 1e-7, 10.0)]);
        let delta = Delta::between(&before, &after, CHANGE_EPSILON);
        assert_eq!(delta.entries(), &[(0, Pos::new(1.0, 1.0))]);
        assert!(delta.contains(0));
        assert!(!delta.contains(1));
    }

    #[test]
    fn test_delta_new_sorts_and_keeps_last() {
        let delta = Delta::new(vec![
            (3, Pos::new(3.0, 3.0)),
            (1, Pos::new(1.0, 1.0)),
            (3, Pos::new(4.0, 4.0)),
        ]);
        assert_eq!(delta.entries(), &[(1, Pos::new(1.0, 1.0)), (3, Pos::new(4.0, 4.0))]);
    }

    #[test]
    fn test_timeline_indexing() {
        let mut t = Timeline::new(roster2(), Snapshot::new(vec![Pos::default(); 2])).unwrap();
        assert_eq!(t.last_step(), 0);
        assert_eq!(t.step_count(), 1);
        assert!(t.delta(0).is_none());
        assert_eq!(t.step_entries(0).unwrap().len(), 2);

        assert_eq!(t.push(Delta::default()), 1);
        assert!(t.delta(1).unwrap().is_empty());
        assert!(t.delta(2).is_none());
        assert!(t.step_entries(2).is_none());
    }

    #[test]
    fn test_baseline_must_match_roster() {
        let err = Timeline::new(roster2(), Snapshot::new(vec![Pos::default()])).unwrap_err();
        assert_eq!(err, CoreError::InvalidBaseline { missing: vec!["B".into()], extra: vec![] });
    }

    #[test]
    fn test_from_parts_rejects_foreign_slot() {
        let err = Timeline::from_parts(
            roster2(),
            Snapshot::new(vec![Pos::default(); 2]),
            vec![Delta::new(vec![(5, Pos::default())])],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownLabel { .. }));
    }
}
