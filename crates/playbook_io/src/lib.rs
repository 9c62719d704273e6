//! Play file library
//!
//! Formation / strategy CSV files, engine settings files and default file
//! names. The engine crate stays free of file access; everything that
//! touches the filesystem lives here.

pub mod tables;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::Path;

use playbook_core::{EngineConfig, ImportReport, SnapshotReconstructor, Timeline};

pub use tables::{
    load_formation, load_strategy, read_formation, read_strategy, save_formation, save_strategy,
    write_formation, write_strategy,
};

/// Which table a file holds; picks the default name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Formation,
    Strategy,
}

impl FileKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            FileKind::Formation => "ultimate",
            FileKind::Strategy => "strategy",
        }
    }
}

/// `ultimate_20240501_123005.csv` style name for `at`.
pub fn default_file_name<Tz>(kind: FileKind, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}_{}.csv", kind.prefix(), at.format("%Y%m%d_%H%M%S"))
}

/// Append `.csv` unless the name already ends with it (any case).
pub fn ensure_csv_ext(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".csv") {
        name.to_string()
    } else {
        format!("{}.csv", name)
    }
}

/// Load engine settings from a JSON file. Missing keys keep their defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    EngineConfig::from_json(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Overview of an imported strategy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategySummary {
    /// Steps including the baseline
    pub steps: usize,
    pub entities: usize,
    /// Entities stored per step; index 0 is the baseline
    pub moves_per_step: Vec<usize>,
    /// Steps that store no movement
    pub idle_steps: usize,
    pub imported_rows: usize,
    pub skipped_rows: usize,
    pub clamped_rows: usize,
    pub duplicate_rows: usize,
}

impl StrategySummary {
    pub fn new(timeline: &Timeline, report: &ImportReport) -> Self {
        let moves_per_step: Vec<usize> = (0..=timeline.last_step())
            .map(|step| match timeline.delta(step) {
                Some(delta) => delta.len(),
                None => timeline.roster().len(),
            })
            .collect();
        let idle_steps = moves_per_step.iter().skip(1).filter(|&&n| n == 0).count();
        Self {
            steps: timeline.step_count(),
            entities: timeline.roster().len(),
            moves_per_step,
            idle_steps,
            imported_rows: report.imported,
            skipped_rows: report.skipped.len(),
            clamped_rows: report.clamped,
            duplicate_rows: report.duplicates,
        }
    }
}

/// Check that every stored move is an actual move: the sparse form of a
/// well-formed file. Returns `(step, label)` for each redundant entry.
pub fn redundant_moves(timeline: &Timeline, epsilon: f64) -> Result<Vec<(usize, String)>> {
    let mut recon = SnapshotReconstructor::new(timeline.clone());
    let mut found = Vec::new();
    for step in 1..=timeline.last_step() {
        let Some(delta) = timeline.delta(step) else { continue };
        let before = recon.build(step - 1)?;
        for &(slot, pos) in delta.entries() {
            let unchanged = before.get(slot).is_some_and(|prev| prev.approx_eq(&pos, epsilon));
            if unchanged {
                let label = timeline.roster().label(slot).unwrap_or_default().to_string();
                found.push((step, label));
            }
        }
    }
    Ok(found)
}
