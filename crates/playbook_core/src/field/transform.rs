//! Field units <-> display pixels
//!
//! Pure scale + offset pair. Only the UI layer uses it; the engine itself
//! works entirely in field units.

use super::{Pos, FIELD_LEN, FIELD_WID};
use crate::config::DisplayConfig;

/// Scale changes smaller than this are ignored by [`CoordinateTransform::rebuild`],
/// so pixel caches keyed on the scale are not thrown away for rounding noise.
pub const SCALE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTransform {
    scale: f64,
    layout: DisplayConfig,
}

impl CoordinateTransform {
    pub fn new(width: f64, height: f64, layout: DisplayConfig) -> Self {
        Self { scale: Self::compute_scale(width, height, &layout), layout }
    }

    /// Largest scale that fits the field plus margins and both bottom bars.
    pub fn compute_scale(width: f64, height: f64, layout: &DisplayConfig) -> f64 {
        let by_width = (width - 2.0 * layout.margin_left) / FIELD_LEN;
        let by_height = (height
            - 2.0 * layout.margin_top
            - layout.ui_bar_height
            - layout.record_bar_height
            + layout.height_slack)
            / FIELD_WID;
        by_width.min(by_height)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Recompute the scale for a new surface size.
    ///
    /// Returns `true` only when the scale actually moved by more than
    /// [`SCALE_EPSILON`]; callers use it to decide whether to redraw caches.
    pub fn rebuild(&mut self, width: f64, height: f64) -> bool {
        let scale = Self::compute_scale(width, height, &self.layout);
        if (scale - self.scale).abs() <= SCALE_EPSILON {
            return false;
        }
        tracing::debug!(old = self.scale, new = scale, "display scale rebuilt");
        self.scale = scale;
        true
    }

    /// Field position to pixel, rounded to the nearest pixel.
    pub fn to_display(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (self.layout.margin_left + (x * self.scale).round()) as i32,
            (self.layout.margin_top + (y * self.scale).round()) as i32,
        )
    }

    /// Pixel to field position. Not clamped.
    pub fn to_field(&self, px: f64, py: f64) -> Pos {
        Pos::new((px - self.layout.margin_left) / self.scale, (py - self.layout.margin_top) / self.scale)
    }
}
