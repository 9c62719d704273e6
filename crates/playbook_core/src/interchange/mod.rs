//! Row-level import/export for the two persisted table formats
//!
//! The engine never touches files. The IO crate streams CSV records into the
//! string-typed records below and hands them here; everything that can go
//! wrong with a single row is reported per row instead of failing the load.
//!
//! Line numbers in reports count the header as line 1.

mod formation;
mod strategy;

pub use formation::{formation_from_rows, formation_to_rows, FormationRecord};
pub use strategy::{timeline_from_rows, timeline_to_rows, StrategyRecord};

use std::fmt;

use crate::field::Pos;

pub const FORMATION_HEADERS: [&str; 5] = ["entity", "label", "team", "x_m", "y_m"];
pub const STRATEGY_HEADERS: [&str; 5] = ["step", "entity", "label", "x_m", "y_m"];

/// Decimal places written for formation coordinates
pub const FORMATION_DECIMALS: usize = 3;
/// Decimal places written for strategy coordinates
pub const STRATEGY_DECIMALS: usize = 6;

/// Highest step index accepted on import; rows beyond it are `BadStep`.
pub const MAX_IMPORT_STEP: usize = 10_000;

/// Why a row was left out of an import
#[derive(Debug, Clone, PartialEq)]
pub enum RowIssue {
    BadStep(String),
    BadCoordinate { column: &'static str, value: String },
    UnknownEntity(String),
    UnknownTeam(String),
    MissingLabel,
    /// Label not present in the step-0 roster
    UnknownLabel(String),
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RowIssue::BadStep(v) => write!(f, "invalid step '{}'", v),
            RowIssue::BadCoordinate { column, value } => {
                write!(f, "invalid {} value '{}'", column, value)
            }
            RowIssue::UnknownEntity(v) => write!(f, "unknown entity '{}'", v),
            RowIssue::UnknownTeam(v) => write!(f, "unknown team '{}'", v),
            RowIssue::MissingLabel => f.write_str("missing label"),
            RowIssue::UnknownLabel(v) => write!(f, "Unknown label: {}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: usize,
    pub issue: RowIssue,
}

/// Partial-success summary of one import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Rows accepted (including clamped ones)
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
    /// Accepted rows whose coordinates were pulled onto the field
    pub clamped: usize,
    /// Accepted rows that repeated an entity already seen in the same step
    pub duplicates: usize,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.clamped == 0 && self.duplicates == 0
    }

    fn skip(&mut self, line: usize, issue: RowIssue) {
        tracing::warn!(line, %issue, "import row skipped");
        self.skipped.push(SkippedRow { line, issue });
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Imported {} rows", self.imported)?;
        if !self.skipped.is_empty() {
            write!(f, ", skipped {}", self.skipped.len())?;
        }
        if self.clamped > 0 {
            write!(f, ", clamped {}", self.clamped)?;
        }
        if self.duplicates > 0 {
            write!(f, ", {} duplicates", self.duplicates)?;
        }
        Ok(())
    }
}

/// 0-based record index -> file line
fn line_of(index: usize) -> usize {
    index + 2
}

/// `player` / `disc`, case-insensitive. The team is resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Player,
    Disc,
}

fn parse_category(raw: &str) -> Result<Category, RowIssue> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "player" => Ok(Category::Player),
        "disc" => Ok(Category::Disc),
        _ => Err(RowIssue::UnknownEntity(raw.trim().to_string())),
    }
}

fn parse_coordinate(column: &'static str, raw: &str) -> Result<f64, RowIssue> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowIssue::BadCoordinate { column, value: raw.trim().to_string() }),
    }
}

/// Parse both coordinates and clamp onto the field. The flag reports a clamp.
fn parse_position(x: &str, y: &str) -> Result<(Pos, bool), RowIssue> {
    let raw = Pos::new(parse_coordinate("x_m", x)?, parse_coordinate("y_m", y)?);
    let pos = raw.clamped();
    Ok((pos, pos != raw))
}

fn format_coordinate(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}
