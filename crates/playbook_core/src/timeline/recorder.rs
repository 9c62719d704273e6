//! Baseline capture and sparse step commits

use std::sync::Arc;

use super::{Delta, FollowLinks, SnapshotReconstructor, Timeline};
use crate::config::RecordingConfig;
use crate::error::{CoreError, Result};
use crate::roster::Roster;
use crate::snapshot::Snapshot;

/// Result of one `commit_step`
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// Index of the new step
    pub step: usize,
    /// What was stored for it
    pub delta: Delta,
    /// Full positions at the new step
    pub snapshot: Arc<Snapshot>,
    /// Slots moved by follow links during this commit
    pub followers_moved: Vec<usize>,
}

/// Owns the growing timeline while a play is being recorded.
#[derive(Debug, Clone)]
pub struct DeltaRecorder {
    recon: SnapshotReconstructor,
    epsilon: f64,
}

impl DeltaRecorder {
    /// Write `baseline` as step 0.
    pub fn start(roster: Roster, baseline: Snapshot, cfg: &RecordingConfig) -> Result<Self> {
        let timeline = Timeline::new(roster, baseline)?;
        tracing::info!(entities = timeline.roster().len(), "recording started");
        Ok(Self { recon: SnapshotReconstructor::new(timeline), epsilon: cfg.change_epsilon })
    }

    pub fn timeline(&self) -> &Timeline {
        self.recon.timeline()
    }

    pub fn last_step(&self) -> usize {
        self.recon.last_step()
    }

    pub fn reconstructor(&mut self) -> &mut SnapshotReconstructor {
        &mut self.recon
    }

    pub fn into_reconstructor(self) -> SnapshotReconstructor {
        self.recon
    }

    /// Append the next step from the full current positions.
    ///
    /// The diff is taken against the reconstructed last step, not the
    /// previous input; sub-epsilon jitter never reaches the timeline. An
    /// unchanged scene still appends an empty step.
    pub fn commit_step(&mut self, current: &Snapshot, links: &FollowLinks) -> Result<CommitOutcome> {
        let roster = self.recon.timeline().roster();
        if current.len() != roster.len() {
            let missing = roster.labels().skip(current.len()).map(str::to_string).collect();
            let extra = (roster.len()..current.len()).map(|slot| format!("slot {}", slot)).collect();
            return Err(CoreError::InvalidBaseline { missing, extra });
        }

        let last = self.recon.last_step();
        let step = last + 1;
        let prev = self.recon.build(last)?;

        let mut applied = current.clone();
        let followers_moved = self.apply_links(step, &prev, &mut applied, links)?;

        let delta = Delta::between(&prev, &applied, self.epsilon);
        let mut result = Snapshot::clone(&prev);
        delta.apply_to(&mut result);

        let changed = delta.len();
        let step = self.recon.append(delta.clone(), result);
        let snapshot = self.recon.build(step)?;
        tracing::debug!(step, changed, followers = followers_moved.len(), "step committed");

        Ok(CommitOutcome { step, delta, snapshot, followers_moved })
    }

    /// Move followers whose leader moved `delay` steps before `step`.
    fn apply_links(
        &mut self,
        step: usize,
        prev: &Snapshot,
        applied: &mut Snapshot,
        links: &FollowLinks,
    ) -> Result<Vec<usize>> {
        let mut moved = Vec::new();
        for link in links.iter() {
            let Some(source) = step.checked_sub(link.delay) else { continue };
            let target = if source == step {
                match (prev.get(link.leader), applied.get(link.leader)) {
                    (Some(before), Some(now)) if !before.approx_eq(&now, self.epsilon) => Some(now),
                    _ => None,
                }
            } else if source >= 1
                && self.recon.timeline().delta(source).is_some_and(|d| d.contains(link.leader))
            {
                self.recon.build(source)?.get(link.leader)
            } else {
                None
            };

            if let Some(pos) = target {
                if applied.set(link.follower, pos) {
                    moved.push(link.follower);
                }
            }
        }
        Ok(moved)
    }
}
