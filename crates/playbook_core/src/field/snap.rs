//! Magnetic grid alignment for dragged coordinates.
//!
//! Three tiers per axis, measured from the nearest grid line:
//! - within `hard`: lock onto the line
//! - within `soft`: remove `pull` of the offset
//! - beyond: leave untouched

use super::Pos;
use crate::config::SnapConfig;

/// Snap one coordinate with the default 0.5-unit grid.
pub fn snap(value: f64) -> f64 {
    snap_with(value, &SnapConfig::default())
}

/// Snap one coordinate with explicit settings.
///
/// Halfway values round to the even grid index, so 0.25 goes to 0.0.
pub fn snap_with(value: f64, cfg: &SnapConfig) -> f64 {
    if cfg.grid <= 0.0 {
        return value;
    }
    let g = (value / cfg.grid).round_ties_even() * cfg.grid;
    let d = value - g;
    if d.abs() <= cfg.hard {
        g
    } else if d.abs() <= cfg.soft {
        value - cfg.pull * d
    } else {
        value
    }
}

/// Snap both axes independently.
pub fn snap_pos(pos: Pos, cfg: &SnapConfig) -> Pos {
    Pos::new(snap_with(pos.x, cfg), snap_with(pos.y, cfg))
}
