//! # Engine Configuration
//!
//! Every tuning constant of the editor lives here so a UI can ship presets
//! (or load a JSON file) without touching the engine.
//!
//! ```rust
//! use playbook_core::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! let free_drag = EngineConfig::free_drag();
//! assert!(free_drag.snap.hard < config.snap.hard);
//! ```

use serde::{Deserialize, Serialize};

/// Top-level settings, grouped by the component that consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub recording: RecordingConfig,
    pub display: DisplayConfig,
    pub playback: PlaybackConfig,
}

impl EngineConfig {
    /// Drag without any magnetic alignment.
    pub fn free_drag() -> Self {
        Self { snap: SnapConfig::disabled(), ..Self::default() }
    }

    /// Parse a (possibly partial) JSON settings document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Magnetic grid alignment (field units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Grid spacing (default: 0.5)
    pub grid: f64,
    /// Offsets up to this distance lock onto the grid line (default: 0.2)
    pub hard: f64,
    /// Offsets up to this distance are pulled toward the grid (default: 0.6)
    pub soft: f64,
    /// Fraction of the offset removed inside the soft band (default: 0.6)
    pub pull: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self { grid: 0.5, hard: 0.2, soft: 0.6, pull: 0.6 }
    }
}

impl SnapConfig {
    pub fn disabled() -> Self {
        Self { grid: 0.5, hard: 0.0, soft: 0.0, pull: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Smallest per-axis movement that counts as a change (default: 1e-6)
    pub change_epsilon: f64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self { change_epsilon: crate::timeline::CHANGE_EPSILON }
    }
}

/// Screen layout around the field, in display pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub margin_left: f64,
    pub margin_top: f64,
    /// Toolbar below the field
    pub ui_bar_height: f64,
    /// Recording/transport bar below the toolbar
    pub record_bar_height: f64,
    /// Extra height the recording bar may overlap
    pub height_slack: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            margin_left: 60.0,
            margin_top: 40.0,
            ui_bar_height: 56.0,
            record_bar_height: 72.0,
            height_slack: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Cursor advance per second at 1x speed (default: 1.0)
    pub steps_per_second: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { steps_per_second: 1.0, min_speed: 0.25, max_speed: 4.0 }
    }
}

impl PlaybackConfig {
    /// Usable copy of a possibly hand-edited section.
    ///
    /// Non-finite or non-positive values fall back to their defaults and
    /// swapped speed bounds are put back in order.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        let min = positive(self.min_speed, defaults.min_speed);
        let max = positive(self.max_speed, defaults.max_speed);
        Self {
            steps_per_second: positive(self.steps_per_second, defaults.steps_per_second),
            min_speed: min.min(max),
            max_speed: min.max(max),
        }
    }
}
