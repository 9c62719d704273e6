//! Field geometry and coordinate handling
//!
//! All engine positions are in field units:
//! - x: 0 = left end line, 100 = right end line (LENGTH direction)
//! - y: 0 = top sideline, 37 = bottom sideline (WIDTH direction)

pub mod landmarks;
pub mod snap;
pub mod transform;

pub use landmarks::{landmark_at, Landmark};
pub use snap::{snap, snap_pos, snap_with};
pub use transform::{CoordinateTransform, SCALE_EPSILON};

use serde::{Deserialize, Serialize};

/// Field length (x-axis)
pub const FIELD_LEN: f64 = 100.0;
/// Field width (y-axis)
pub const FIELD_WID: f64 = 37.0;
/// End zone depth at each end
pub const ENDZONE: f64 = 18.0;
/// Brick mark distance in front of each goal line
pub const BRICK_OFFSET: f64 = 18.0;

pub const GOAL_LINE_LEFT: f64 = ENDZONE;
pub const GOAL_LINE_RIGHT: f64 = FIELD_LEN - ENDZONE;
pub const BRICK_LEFT: f64 = GOAL_LINE_LEFT + BRICK_OFFSET;
pub const BRICK_RIGHT: f64 = GOAL_LINE_RIGHT - BRICK_OFFSET;
pub const CENTER_Y: f64 = FIELD_WID / 2.0;

/// Position in field units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pos {
    pub x: f64,
    pub y: f64,
}

impl Pos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn center() -> Self {
        Self::new(FIELD_LEN / 2.0, CENTER_Y)
    }

    /// Clamp into `[0, FIELD_LEN] × [0, FIELD_WID]`
    pub fn clamped(self) -> Self {
        Self::new(self.x.clamp(0.0, FIELD_LEN), self.y.clamp(0.0, FIELD_WID))
    }

    pub fn is_on_field(&self) -> bool {
        (0.0..=FIELD_LEN).contains(&self.x) && (0.0..=FIELD_WID).contains(&self.y)
    }

    pub fn distance_to(&self, other: &Pos) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// True when both axes are within `epsilon` of `other`.
    pub fn approx_eq(&self, other: &Pos, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }

    /// Linear blend, `frac` = 0 returns `self` bit-for-bit.
    pub fn lerp(&self, to: &Pos, frac: f64) -> Pos {
        Pos::new(self.x + frac * (to.x - self.x), self.y + frac * (to.y - self.y))
    }
}

impl From<(f64, f64)> for Pos {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Pos, a: Pos, b: Pos) -> f64 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let len2 = vx * vx + vy * vy;
    if len2 == 0.0 {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * vx + (p.y - a.y) * vy) / len2).clamp(0.0, 1.0);
    p.distance_to(&Pos::new(a.x + t * vx, a.y + t * vy))
}
