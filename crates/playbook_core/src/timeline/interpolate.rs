//! Continuous-time playback
//!
//! `positions_at(t)` blends the two integer steps around `t`. The cursor is
//! advanced by the caller's frame tick; nothing here owns a timer.

use super::SnapshotReconstructor;
use crate::config::PlaybackConfig;
use crate::error::{CoreError, Result};
use crate::snapshot::Snapshot;

/// Positions at continuous time `t`, `0 <= t <= N`.
///
/// Integer `t` returns the reconstructed step unchanged.
pub fn positions_at(recon: &mut SnapshotReconstructor, t: f64) -> Result<Snapshot> {
    let max = recon.last_step();
    if !t.is_finite() || t < 0.0 || t > max as f64 {
        return Err(CoreError::StepOutOfRange { requested: t, max });
    }
    let lo = t.floor() as usize;
    let hi = (lo + 1).min(max);
    let frac = t - lo as f64;

    let lo_snap = recon.build(lo)?;
    if hi == lo || frac == 0.0 {
        return Ok(Snapshot::clone(&lo_snap));
    }
    let hi_snap = recon.build(hi)?;
    Ok(lo_snap.interpolate(&hi_snap, frac))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop at the last step
    #[default]
    None,
    /// Wrap back to step 0
    Full,
}

/// Playback position and transport state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackCursor {
    position: f64,
    max: f64,
    playing: bool,
    speed: f64,
    loop_mode: LoopMode,
    cfg: PlaybackConfig,
}

impl PlaybackCursor {
    pub fn new(last_step: usize, cfg: PlaybackConfig) -> Self {
        let cfg = cfg.sanitized();
        Self {
            position: 0.0,
            max: last_step as f64,
            playing: false,
            speed: 1.0_f64.clamp(cfg.min_speed, cfg.max_speed),
            loop_mode: LoopMode::None,
            cfg,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Move to `t`, clamped to `[0, N]`. Non-finite input goes to 0.
    pub fn seek(&mut self, t: f64) -> f64 {
        self.position = if t.is_finite() { t.clamp(0.0, self.max) } else { 0.0 };
        self.position
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Pause and rewind to step 0.
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    /// Clamped to the configured bounds. A non-finite request is ignored.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        if speed.is_finite() {
            self.speed = speed.clamp(self.cfg.min_speed, self.cfg.max_speed);
        }
        self.speed
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    /// Advance by one frame of `delta_seconds`; returns the new position.
    pub fn advance(&mut self, delta_seconds: f64) -> f64 {
        if !self.playing || !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return self.position;
        }
        let next = self.position + delta_seconds * self.cfg.steps_per_second * self.speed;
        if next < self.max {
            self.position = next;
            return self.position;
        }
        match self.loop_mode {
            LoopMode::None => {
                self.position = self.max;
                self.playing = false;
            }
            LoopMode::Full => {
                self.position = if self.max > 0.0 { next.rem_euclid(self.max) } else { 0.0 };
            }
        }
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Pos;
    use crate::roster::{Entity, Roster, Team};
    use crate::timeline::{Delta, Timeline};
    use proptest::prelude::*;

    fn recon(deltas: Vec<Delta>) -> SnapshotReconstructor {
        let roster = Roster::new(vec![Entity::player("A", Team::Blue), Entity::player("B", Team::Red)]);
        let baseline = Snapshot::new(vec![Pos::new(0.0, 0.0), Pos::new(10.0, 10.0)]);
        SnapshotReconstructor::new(Timeline::from_parts(roster, baseline, deltas).unwrap())
    }

    #[test]
    fn test_midpoint() {
        let mut r = recon(vec![Delta::new(vec![(0, Pos::new(1.0, 1.0))])]);
        let mid = positions_at(&mut r, 0.5).unwrap();
        assert_eq!(mid.positions(), &[Pos::new(0.5, 0.5), Pos::new(10.0, 10.0)]);
    }

    #[test]
    fn test_last_step_and_single_step_timeline() {
        let mut r = recon(vec![Delta::new(vec![(1, Pos::new(7.0, 3.0))])]);
        assert_eq!(positions_at(&mut r, 1.0).unwrap(), *r.build(1).unwrap());

        let mut only_baseline = recon(vec![]);
        assert_eq!(positions_at(&mut only_baseline, 0.0).unwrap().get(1), Some(Pos::new(10.0, 10.0)));
        assert!(positions_at(&mut only_baseline, 0.1).is_err());
    }

    #[test]
    fn test_out_of_range_time() {
        let mut r = recon(vec![Delta::default()]);
        assert_eq!(
            positions_at(&mut r, -0.01).unwrap_err(),
            CoreError::StepOutOfRange { requested: -0.01, max: 1 }
        );
        assert!(positions_at(&mut r, 1.5).is_err());
        assert!(positions_at(&mut r, f64::NAN).is_err());
    }

    #[test]
    fn test_cursor_stops_at_end() {
        let mut c = PlaybackCursor::new(3, PlaybackConfig::default());
        assert_eq!(c.advance(1.0), 0.0);
        c.play();
        assert_eq!(c.advance(1.0), 1.0);
        c.set_speed(2.0);
        assert_eq!(c.advance(0.5), 2.0);
        assert_eq!(c.advance(5.0), 3.0);
        assert!(!c.is_playing());
    }

    #[test]
    fn test_cursor_loops() {
        let mut c = PlaybackCursor::new(4, PlaybackConfig::default());
        c.set_loop_mode(LoopMode::Full);
        c.seek(3.5);
        c.play();
        assert_eq!(c.advance(1.0), 0.5);
        assert!(c.is_playing());
    }

    #[test]
    fn test_cursor_clamps() {
        let mut c = PlaybackCursor::new(2, PlaybackConfig::default());
        assert_eq!(c.seek(9.0), 2.0);
        assert_eq!(c.seek(-1.0), 0.0);
        assert_eq!(c.set_speed(100.0), 4.0);
        assert_eq!(c.set_speed(0.0), 0.25);
        c.seek(1.5);
        c.stop();
        assert_eq!(c.position(), 0.0);
    }

    #[test]
    fn test_cursor_ignores_non_finite_speed() {
        let mut c = PlaybackCursor::new(2, PlaybackConfig::default());
        c.set_speed(2.0);
        assert_eq!(c.set_speed(f64::NAN), 2.0);
        assert_eq!(c.set_speed(f64::INFINITY), 2.0);
    }

    #[test]
    fn test_cursor_survives_inverted_speed_bounds() {
        let cfg = PlaybackConfig { min_speed: 5.0, ..PlaybackConfig::default() };
        let mut c = PlaybackCursor::new(3, cfg);
        assert_eq!(c.speed(), 4.0);
        assert_eq!(c.set_speed(1.0), 4.0);
        assert_eq!(c.set_speed(9.0), 5.0);

        let nan_bound = PlaybackConfig { max_speed: f64::NAN, ..PlaybackConfig::default() };
        let mut c = PlaybackCursor::new(3, nan_bound);
        assert_eq!(c.set_speed(10.0), 4.0);
    }

    fn delta_strategy() -> impl Strategy<Value = Delta> {
        prop::collection::vec((0usize..2, 0.0f64..=100.0, 0.0f64..=37.0), 0..3)
            .prop_map(|entries| Delta::new(entries.into_iter().map(|(s, x, y)| (s, Pos::new(x, y)))))
    }

    proptest! {
        #[test]
        fn prop_integer_times_are_exact(deltas in prop::collection::vec(delta_strategy(), 0..8)) {
            let mut r = recon(deltas);
            for k in 0..=r.last_step() {
                let at = positions_at(&mut r, k as f64).unwrap();
                prop_assert_eq!(&at, &*r.build(k).unwrap());
            }
        }

        #[test]
        fn prop_blend_is_linear(
            deltas in prop::collection::vec(delta_strategy(), 1..8),
            pick in 0usize..8,
            frac in 0.001f64..0.999,
        ) {
            let mut r = recon(deltas);
            let k = pick % r.last_step();
            let at = positions_at(&mut r, k as f64 + frac).unwrap();
            let lo = r.build(k).unwrap();
            let hi = r.build(k + 1).unwrap();
            for slot in 0..2 {
                let (a, b, p) = (lo.get(slot).unwrap(), hi.get(slot).unwrap(), at.get(slot).unwrap());
                prop_assert!((p.x - (a.x + frac * (b.x - a.x))).abs() < 1e-9);
                prop_assert!((p.y - (a.y + frac * (b.y - a.y))).abs() < 1e-9);
                // stays between the endpoints
                prop_assert!(p.x >= a.x.min(b.x) - 1e-9 && p.x <= a.x.max(b.x) + 1e-9);
            }
        }
    }
}
