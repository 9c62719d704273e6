//! Editing session: the Idle / Recording / Playback state machine
//!
//! The session is a plain value owned by one controller. It holds the fixed
//! roster, the editable scene (what the user drags), follow links, and the
//! recorder or player for the current mode.
//!
//! | Mode      | drag | commit | start | finish | scrub |
//! |-----------|------|--------|-------|--------|-------|
//! | Idle      | yes  | no     | yes   | no     | no    |
//! | Recording | yes  | yes    | no    | yes    | no    |
//! | Playback  | no   | no     | no    | no     | yes   |

use std::fmt;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{contract_violation, CoreError, Result};
use crate::field::{snap_pos, Pos};
use crate::roster::Roster;
use crate::snapshot::{Formation, Snapshot};
use crate::timeline::{
    positions_at, CommitOutcome, DeltaRecorder, FollowLinks, LoopMode, PlaybackCursor,
    SnapshotReconstructor, Timeline,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Recording,
    Playback,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Mode::Idle => "Idle",
            Mode::Recording => "Recording",
            Mode::Playback => "Playback",
        };
        f.write_str(name)
    }
}

enum State {
    Idle,
    Recording(DeltaRecorder),
    Playback { recon: SnapshotReconstructor, cursor: PlaybackCursor },
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Idle => f.write_str("Idle"),
            State::Recording(rec) => write!(f, "Recording(last_step={})", rec.last_step()),
            State::Playback { cursor, .. } => write!(f, "Playback(cursor={})", cursor.position()),
        }
    }
}

/// Status bar data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStatus {
    pub mode: Mode,
    /// Recorded steps including the baseline; 0 before any recording
    pub steps: usize,
    /// Playback cursor, only in Playback
    pub cursor: Option<f64>,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Mode: {}  •  Steps: {}", self.mode, self.steps)?;
        if let Some(t) = self.cursor {
            if (t - t.round()).abs() < 1e-6 {
                write!(f, "  •  Step: {}", t.round() as i64)?;
            } else {
                write!(f, "  •  Step: {:.2}", t)?;
            }
        }
        Ok(())
    }
}

fn illegal(operation: &'static str, state: Mode) -> CoreError {
    contract_violation(CoreError::IllegalStateTransition { operation, state })
}

#[derive(Debug)]
pub struct Session {
    config: EngineConfig,
    roster: Roster,
    scene: Snapshot,
    links: FollowLinks,
    state: State,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Formation::default(), EngineConfig::default())
    }
}

impl Session {
    /// New Idle session on `formation`.
    pub fn new(formation: Formation, config: EngineConfig) -> Self {
        Self {
            config,
            roster: formation.roster,
            scene: formation.positions,
            links: FollowLinks::new(),
            state: State::Idle,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            State::Idle => Mode::Idle,
            State::Recording(_) => Mode::Recording,
            State::Playback { .. } => Mode::Playback,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Editable positions, including drags not yet committed.
    pub fn scene(&self) -> &Snapshot {
        &self.scene
    }

    pub fn links(&self) -> &FollowLinks {
        &self.links
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        match &self.state {
            State::Idle => None,
            State::Recording(rec) => Some(rec.timeline()),
            State::Playback { recon, .. } => Some(recon.timeline()),
        }
    }

    pub fn cursor(&self) -> Option<&PlaybackCursor> {
        match &self.state {
            State::Playback { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            mode: self.mode(),
            steps: self.timeline().map_or(0, Timeline::step_count),
            cursor: self.cursor().map(PlaybackCursor::position),
        }
    }

    fn illegal(&self, operation: &'static str) -> CoreError {
        illegal(operation, self.mode())
    }

    fn require_editable(&self, operation: &'static str) -> Result<()> {
        match self.state {
            State::Idle | State::Recording(_) => Ok(()),
            State::Playback { .. } => Err(self.illegal(operation)),
        }
    }

    fn slot_of(&self, label: &str) -> Result<usize> {
        self.roster.slot(label).ok_or_else(|| CoreError::UnknownLabel { label: label.to_string() })
    }

    // ========================================
    // Editing (Idle / Recording)
    // ========================================

    /// Drag an entity: snap each axis, clamp to the field, store in the scene.
    pub fn drag_entity(&mut self, slot: usize, x: f64, y: f64) -> Result<Pos> {
        self.require_editable("drag_entity")?;
        let pos = snap_pos(Pos::new(x, y), &self.config.snap).clamped();
        if !self.scene.set(slot, pos) {
            return Err(CoreError::UnknownLabel { label: format!("slot {}", slot) });
        }
        Ok(pos)
    }

    pub fn drag_label(&mut self, label: &str, x: f64, y: f64) -> Result<Pos> {
        self.require_editable("drag_entity")?;
        let slot = self.slot_of(label)?;
        self.drag_entity(slot, x, y)
    }

    /// Place an entity exactly, without snapping. The caller clamps.
    pub fn place(&mut self, label: &str, pos: Pos) -> Result<()> {
        self.require_editable("place")?;
        let slot = self.slot_of(label)?;
        self.scene.set(slot, pos);
        Ok(())
    }

    pub fn link(&mut self, leader: &str, follower: &str, delay_steps: usize) -> Result<bool> {
        self.require_editable("link")?;
        let (leader, follower) = (self.slot_of(leader)?, self.slot_of(follower)?);
        Ok(self.links.link(leader, follower, delay_steps))
    }

    pub fn unlink_follower(&mut self, follower: &str) -> Result<usize> {
        self.require_editable("unlink")?;
        let slot = self.slot_of(follower)?;
        Ok(self.links.unlink_follower(slot))
    }

    pub fn unlink_leader(&mut self, leader: &str) -> Result<usize> {
        self.require_editable("unlink")?;
        let slot = self.slot_of(leader)?;
        Ok(self.links.unlink_leader(slot))
    }

    // ========================================
    // Recording
    // ========================================

    /// Idle -> Recording with the current scene as step 0.
    pub fn start_recording(&mut self) -> Result<()> {
        if !matches!(self.state, State::Idle) {
            return Err(self.illegal("start_recording"));
        }
        let recorder =
            DeltaRecorder::start(self.roster.clone(), self.scene.clone(), &self.config.recording)
                .map_err(contract_violation)?;
        self.state = State::Recording(recorder);
        Ok(())
    }

    /// Idle -> Recording with an explicit baseline covering the roster exactly.
    pub fn start_recording_with<L, I>(&mut self, initial: I) -> Result<()>
    where
        L: AsRef<str>,
        I: IntoIterator<Item = (L, Pos)>,
    {
        if !matches!(self.state, State::Idle) {
            return Err(self.illegal("start_recording"));
        }
        let baseline = Snapshot::from_labeled(&self.roster, initial).map_err(contract_violation)?;
        self.scene = baseline;
        self.start_recording()
    }

    /// Commit the scene as the next step.
    pub fn commit_step(&mut self) -> Result<CommitOutcome> {
        let mode = self.mode();
        let State::Recording(recorder) = &mut self.state else {
            return Err(illegal("commit_step", mode));
        };
        let outcome = recorder.commit_step(&self.scene, &self.links)?;
        // scene follows the recorded state (follow-link moves, dropped jitter)
        self.scene = Snapshot::clone(&outcome.snapshot);
        Ok(outcome)
    }

    /// Apply label-keyed positions to the scene, then commit.
    ///
    /// Labels left out keep their scene position.
    pub fn commit_step_with<L, I>(&mut self, current: I) -> Result<CommitOutcome>
    where
        L: AsRef<str>,
        I: IntoIterator<Item = (L, Pos)>,
    {
        if !matches!(self.state, State::Recording(_)) {
            return Err(self.illegal("commit_step"));
        }
        let mut scene = self.scene.clone();
        for (label, pos) in current {
            let slot = self.slot_of(label.as_ref())?;
            scene.set(slot, pos);
        }
        self.scene = scene;
        self.commit_step()
    }

    /// Recording -> Playback with the cursor at step 0.
    pub fn finish_recording(&mut self) -> Result<()> {
        if !matches!(self.state, State::Recording(_)) {
            return Err(self.illegal("finish_recording"));
        }
        if let State::Recording(recorder) = std::mem::replace(&mut self.state, State::Idle) {
            let recon = recorder.into_reconstructor();
            let cursor = PlaybackCursor::new(recon.last_step(), self.config.playback);
            tracing::info!(steps = recon.timeline().step_count(), "recording finished");
            self.state = State::Playback { recon, cursor };
        }
        Ok(())
    }

    /// Cancel affordance while recording.
    ///
    /// Commits are atomic, so nothing committed is lost. With only the
    /// baseline recorded the session returns to Idle and drops it.
    pub fn abort(&mut self) -> Result<Mode> {
        let State::Recording(recorder) = &self.state else {
            return Err(self.illegal("abort"));
        };
        if recorder.last_step() == 0 {
            tracing::info!("recording aborted before the first step");
            self.state = State::Idle;
        }
        Ok(self.mode())
    }

    // ========================================
    // Playback
    // ========================================

    fn playback(
        &mut self,
        operation: &'static str,
    ) -> Result<(&mut SnapshotReconstructor, &mut PlaybackCursor)> {
        let mode = self.mode();
        match &mut self.state {
            State::Playback { recon, cursor } => Ok((recon, cursor)),
            _ => Err(illegal(operation, mode)),
        }
    }

    /// Move the cursor (clamped to `[0, N]`) and return the positions there.
    pub fn scrub(&mut self, t: f64) -> Result<Snapshot> {
        let (recon, cursor) = self.playback("scrub")?;
        let t = cursor.seek(t);
        positions_at(recon, t)
    }

    /// Advance a playing cursor by one frame and return the positions there.
    pub fn advance(&mut self, delta_seconds: f64) -> Result<Snapshot> {
        let (recon, cursor) = self.playback("advance")?;
        let t = cursor.advance(delta_seconds);
        positions_at(recon, t)
    }

    pub fn play(&mut self) -> Result<()> {
        self.playback("play")?.1.play();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.playback("pause")?.1.pause();
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.playback("stop")?.1.stop();
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<f64> {
        Ok(self.playback("set_speed")?.1.set_speed(speed))
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) -> Result<()> {
        self.playback("set_loop_mode")?.1.set_loop_mode(mode);
        Ok(())
    }

    // ========================================
    // Queries
    // ========================================

    /// Positions at continuous time `t` (Playback). No clamping.
    pub fn query_snapshot_at(&mut self, t: f64) -> Result<Snapshot> {
        let (recon, _) = self.playback("query_snapshot_at")?;
        positions_at(recon, t)
    }

    /// Last committed state while editing; the bare scene before recording.
    ///
    /// Uncommitted drags are not included; the caller overlays them.
    pub fn query_current_editable(&mut self) -> Result<Snapshot> {
        let mode = self.mode();
        match &mut self.state {
            State::Idle => Ok(self.scene.clone()),
            State::Recording(rec) => {
                let last = rec.last_step();
                let committed = rec.reconstructor().build(last)?;
                Ok(Snapshot::clone(&committed))
            }
            State::Playback { .. } => Err(illegal("query_current_editable", mode)),
        }
    }

    /// Full snapshot at an integer step (Recording / Playback).
    pub fn snapshot_at_step(&mut self, step: usize) -> Result<Arc<Snapshot>> {
        let mode = self.mode();
        match &mut self.state {
            State::Recording(rec) => rec.reconstructor().build(step),
            State::Playback { recon, .. } => recon.build(step),
            State::Idle => Err(illegal("snapshot_at_step", mode)),
        }
    }

    // ========================================
    // Session resets and loads
    // ========================================

    /// Playback -> Idle, keeping the positions shown at the cursor.
    pub fn new_recording(&mut self) -> Result<()> {
        let (recon, cursor) = self.playback("new_recording")?;
        let t = cursor.position();
        let shown = positions_at(recon, t)?;
        self.scene = shown;
        self.links.clear();
        self.state = State::Idle;
        tracing::info!("recording cleared");
        Ok(())
    }

    /// Replace the roster and scene for editing (any mode but Recording).
    pub fn load_formation(&mut self, formation: Formation) -> Result<()> {
        if matches!(self.state, State::Recording(_)) {
            return Err(self.illegal("load_formation"));
        }
        tracing::info!(entities = formation.roster.len(), "formation loaded");
        self.roster = formation.roster;
        self.scene = formation.positions;
        self.links.clear();
        self.state = State::Idle;
        Ok(())
    }

    /// Enter Playback on an imported timeline (any mode but Recording).
    pub fn load_strategy(&mut self, timeline: Timeline) -> Result<()> {
        if matches!(self.state, State::Recording(_)) {
            return Err(self.illegal("load_strategy"));
        }
        tracing::info!(steps = timeline.step_count(), "strategy loaded");
        self.roster = timeline.roster().clone();
        self.scene = timeline.baseline().clone();
        self.links.clear();
        let recon = SnapshotReconstructor::new(timeline);
        let cursor = PlaybackCursor::new(recon.last_step(), self.config.playback);
        self.state = State::Playback { recon, cursor };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Entity, Team};

    fn two_player() -> Session {
        let formation = Formation::new(vec![
            (Entity::player("A", Team::Blue), Pos::new(0.0, 0.0)),
            (Entity::player("B", Team::Red), Pos::new(10.0, 10.0)),
        ]);
        Session::new(formation, EngineConfig::default())
    }

    fn is_illegal(err: &CoreError, op: &str, mode: Mode) -> bool {
        matches!(err, CoreError::IllegalStateTransition { operation, state }
            if *operation == op && *state == mode)
    }

    #[cfg(not(feature = "strict_contracts"))]
    #[test]
    fn test_end_to_end_two_players() {
        let mut session = two_player();
        session
            .start_recording_with([("A", Pos::new(0.0, 0.0)), ("B", Pos::new(10.0, 10.0))])
            .unwrap();
        assert_eq!(session.mode(), Mode::Recording);

        let outcome = session
            .commit_step_with([("A", Pos::new(1.0, 1.0)), ("B", Pos::new(10.0, 10.0))])
            .unwrap();
        assert_eq!(outcome.step, 1);
        assert_eq!(outcome.delta.entries(), &[(0, Pos::new(1.0, 1.0))]);

        let step1 = session.snapshot_at_step(1).unwrap();
        assert_eq!(step1.positions(), &[Pos::new(1.0, 1.0), Pos::new(10.0, 10.0)]);

        session.finish_recording().unwrap();
        assert_eq!(session.mode(), Mode::Playback);
        assert_eq!(session.cursor().map(PlaybackCursor::position), Some(0.0));

        let half = session.query_snapshot_at(0.5).unwrap();
        assert_eq!(half.positions(), &[Pos::new(0.5, 0.5), Pos::new(10.0, 10.0)]);
    }

    #[cfg(not(feature = "strict_contracts"))]
    #[test]
    fn test_commit_rejected_outside_recording() {
        let mut session = two_player();
        let err = session.commit_step().unwrap_err();
        assert!(is_illegal(&err, "commit_step", Mode::Idle));

        session.start_recording().unwrap();
        session.finish_recording().unwrap();
        let err = session.commit_step().unwrap_err();
        assert!(is_illegal(&err, "commit_step", Mode::Playback));
        assert_eq!(err.to_string(), "Illegal operation 'commit_step' while Playback");
    }

    #[cfg(not(feature = "strict_contracts"))]
    #[test]
    fn test_drag_rejected_in_playback() {
        let mut session = two_player();
        session.start_recording().unwrap();
        session.finish_recording().unwrap();
        let err = session.drag_label("A", 5.0, 5.0).unwrap_err();
        assert!(is_illegal(&err, "drag_entity", Mode::Playback));
        assert_eq!(session.scene().get(0), Some(Pos::new(0.0, 0.0)));
    }

    #[cfg(not(feature = "strict_contracts"))]
    #[test]
    fn test_scrub_rejected_while_editing() {
        let mut session = two_player();
        assert!(is_illegal(&session.scrub(0.0).unwrap_err(), "scrub", Mode::Idle));
        session.start_recording().unwrap();
        assert!(is_illegal(&session.scrub(0.0).unwrap_err(), "scrub", Mode::Recording));
        assert!(is_illegal(
            &session.start_recording().unwrap_err(),
            "start_recording",
            Mode::Recording
        ));
    }

    #[cfg(not(feature = "strict_contracts"))]
    #[test]
    fn test_start_recording_with_mismatched_labels() {
        let mut session = two_player();
        let err = session
            .start_recording_with([("A", Pos::new(0.0, 0.0)), ("Z", Pos::new(1.0, 1.0))])
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidBaseline { missing: vec!["B".into()], extra: vec!["Z".into()] }
        );
        assert_eq!(session.mode(), Mode::Idle);
    }

    #[cfg(feature = "strict_contracts")]
    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_strict_contracts_panic_on_illegal_commit() {
        let mut session = two_player();
        let _ = session.commit_step();
    }

    #[test]
    fn test_drag_snaps_then_clamps() {
        let mut session = two_player();
        let placed = session.drag_label("A", 3.1, -2.0).unwrap();
        assert_eq!(placed, Pos::new(3.0, 0.0));
        assert_eq!(session.scene().get(0), Some(placed));

        let err = session.drag_label("Q", 1.0, 1.0).unwrap_err();
        assert_eq!(err, CoreError::UnknownLabel { label: "Q".into() });
    }

    #[test]
    fn test_scene_tracks_committed_state() {
        let mut session = two_player();
        session.start_recording().unwrap();
        session.place("A", Pos::new(4.0, 4.0 + 1e-9)).unwrap();
        let outcome = session.commit_step().unwrap();
        assert_eq!(outcome.delta.len(), 1);
        assert_eq!(session.scene(), &*outcome.snapshot);

        // jitter below epsilon is dropped, so the next commit is empty
        session.place("A", Pos::new(4.0, 4.0 + 2e-9)).unwrap();
        let outcome = session.commit_step().unwrap();
        assert!(outcome.delta.is_empty());
        assert_eq!(session.status().steps, 3);
    }

    #[test]
    fn test_query_current_editable() {
        let mut session = two_player();
        assert_eq!(session.query_current_editable().unwrap(), *session.scene());

        session.start_recording().unwrap();
        session.drag_label("B", 20.0, 20.0).unwrap();
        // uncommitted drags are not part of the committed state
        let committed = session.query_current_editable().unwrap();
        assert_eq!(committed.get(1), Some(Pos::new(10.0, 10.0)));

        session.commit_step().unwrap();
        let committed = session.query_current_editable().unwrap();
        assert_eq!(committed.get(1), Some(Pos::new(20.0, 20.0)));
    }

    #[test]
    fn test_abort_with_baseline_only_returns_to_idle() {
        let mut session = two_player();
        session.start_recording().unwrap();
        assert_eq!(session.abort().unwrap(), Mode::Idle);
        assert!(session.timeline().is_none());
    }

    #[test]
    fn test_abort_after_commits_keeps_recording() {
        let mut session = two_player();
        session.start_recording().unwrap();
        session.drag_label("A", 5.0, 5.0).unwrap();
        session.commit_step().unwrap();
        assert_eq!(session.abort().unwrap(), Mode::Recording);
        assert_eq!(session.timeline().map(Timeline::last_step), Some(1));
    }

    #[test]
    fn test_follow_link_moves_follower_on_commit() {
        let mut session = two_player();
        assert!(session.link("A", "B", 0).unwrap());
        session.start_recording().unwrap();
        session.drag_label("A", 2.0, 3.0).unwrap();
        let outcome = session.commit_step().unwrap();
        assert_eq!(outcome.followers_moved, vec![1]);
        assert_eq!(session.scene().get(1), Some(Pos::new(2.0, 3.0)));
    }

    #[test]
    fn test_playback_transport() {
        let mut session = two_player();
        session.start_recording().unwrap();
        session.drag_label("A", 4.0, 0.0).unwrap();
        session.commit_step().unwrap();
        session.drag_label("A", 8.0, 0.0).unwrap();
        session.commit_step().unwrap();
        session.finish_recording().unwrap();

        // scrubbing past the end clamps to the last step
        let shown = session.scrub(9.0).unwrap();
        assert_eq!(shown.get(0), Some(Pos::new(8.0, 0.0)));
        assert_eq!(session.status().cursor, Some(2.0));

        session.stop().unwrap();
        session.play().unwrap();
        let shown = session.advance(0.5).unwrap();
        assert_eq!(shown.get(0), Some(Pos::new(2.0, 0.0)));

        session.set_loop_mode(LoopMode::Full).unwrap();
        assert_eq!(session.set_speed(100.0).unwrap(), EngineConfig::default().playback.max_speed);

        assert!(matches!(
            session.query_snapshot_at(2.5),
            Err(CoreError::StepOutOfRange { max: 2, .. })
        ));
    }

    #[test]
    fn test_new_recording_keeps_shown_positions() {
        let mut session = two_player();
        session.link("A", "B", 1).unwrap();
        session.start_recording().unwrap();
        session.drag_label("A", 6.0, 0.0).unwrap();
        session.commit_step().unwrap();
        session.finish_recording().unwrap();
        session.scrub(0.5).unwrap();

        session.new_recording().unwrap();
        assert_eq!(session.mode(), Mode::Idle);
        assert_eq!(session.scene().get(0), Some(Pos::new(3.0, 0.0)));
        assert!(session.links().is_empty());
        assert_eq!(session.status().steps, 0);
    }

    #[test]
    fn test_load_strategy_enters_playback() {
        let mut session = Session::default();
        let mut other = two_player();
        other.start_recording().unwrap();
        other.drag_label("B", 12.0, 12.0).unwrap();
        other.commit_step().unwrap();
        let timeline = other.timeline().cloned().unwrap();

        session.load_strategy(timeline).unwrap();
        assert_eq!(session.mode(), Mode::Playback);
        assert_eq!(session.roster().len(), 2);
        assert_eq!(session.cursor().map(PlaybackCursor::max), Some(1.0));
    }

    #[cfg(not(feature = "strict_contracts"))]
    #[test]
    fn test_loads_rejected_while_recording() {
        let mut session = two_player();
        session.start_recording().unwrap();
        let err = session.load_formation(Formation::default()).unwrap_err();
        assert!(is_illegal(&err, "load_formation", Mode::Recording));
        assert_eq!(session.roster().len(), 2);
    }

    #[test]
    fn test_status_line() {
        let mut session = Session::default();
        assert_eq!(session.status().to_string(), "Mode: Idle  •  Steps: 0");
        session.start_recording().unwrap();
        session.finish_recording().unwrap();
        assert_eq!(session.status().to_string(), "Mode: Playback  •  Steps: 1  •  Step: 0");
    }
}
