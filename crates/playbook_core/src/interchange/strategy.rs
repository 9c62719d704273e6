//! `step,entity,label,x_m,y_m`: one sparse timeline
//!
//! Step 0 lists every entity and defines the roster. Later steps list only
//! the entities that moved. Rows are trusted to be sparse already; no diff
//! is recomputed, but every later label must exist in the step-0 roster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    format_coordinate, line_of, parse_category, parse_position, Category, ImportReport, RowIssue,
    MAX_IMPORT_STEP, STRATEGY_DECIMALS,
};
use crate::error::{CoreError, Result};
use crate::field::Pos;
use crate::roster::{Entity, EntityKind, Roster, Team, DISC_LABEL};
use crate::snapshot::Snapshot;
use crate::timeline::{Delta, Timeline};

/// One strategy-CSV record, as read or written
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrategyRecord {
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub x_m: String,
    #[serde(default)]
    pub y_m: String,
}

struct ParsedRow {
    line: usize,
    category: Category,
    label: String,
    pos: Pos,
    clamped: bool,
}

fn parse_record(
    line: usize,
    record: &StrategyRecord,
) -> std::result::Result<(usize, ParsedRow), RowIssue> {
    let step = record
        .step
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&step| step <= MAX_IMPORT_STEP)
        .ok_or_else(|| RowIssue::BadStep(record.step.trim().to_string()))?;
    let category = parse_category(&record.entity)?;
    let label = match record.label.trim() {
        "" if category == Category::Disc => DISC_LABEL.to_string(),
        "" => return Err(RowIssue::MissingLabel),
        label => label.to_string(),
    };
    let (pos, clamped) = parse_position(&record.x_m, &record.y_m)?;
    Ok((step, ParsedRow { line, category, label, pos, clamped }))
}

/// Team of an imported player: the hint roster's if it knows the label,
/// else the label prefix, else Blue.
fn resolve_kind(category: Category, label: &str, hint: Option<&Roster>) -> EntityKind {
    if category == Category::Disc {
        return EntityKind::Disc;
    }
    let hinted = hint
        .and_then(|roster| roster.slot(label).and_then(|slot| roster.entity(slot)))
        .map(|entity| entity.kind)
        .filter(|kind| !kind.is_disc());
    hinted.unwrap_or_else(|| EntityKind::Player(Team::from_label(label).unwrap_or(Team::Blue)))
}

/// Rebuild a timeline from sparse rows.
///
/// Steps with no rows become empty deltas. A repeated entity within one step
/// keeps its last row. Fails with `InvalidBaseline` when no valid step-0 row
/// exists; every other problem skips the row and is reported.
pub fn timeline_from_rows<I>(records: I, hint: Option<&Roster>) -> Result<(Timeline, ImportReport)>
where
    I: IntoIterator<Item = StrategyRecord>,
{
    let mut report = ImportReport::default();
    let mut by_step: BTreeMap<usize, Vec<ParsedRow>> = BTreeMap::new();

    for (index, record) in records.into_iter().enumerate() {
        match parse_record(line_of(index), &record) {
            Ok((step, row)) => by_step.entry(step).or_default().push(row),
            Err(issue) => report.skip(line_of(index), issue),
        }
    }

    let Some(baseline_rows) = by_step.remove(&0) else {
        return Err(CoreError::InvalidBaseline {
            missing: vec!["step 0".to_string()],
            extra: Vec::new(),
        });
    };

    // step 0: roster in first-seen order, last position wins
    let mut entities: Vec<Entity> = Vec::new();
    let mut positions: Vec<Pos> = Vec::new();
    for row in baseline_rows {
        report.imported += 1;
        report.clamped += usize::from(row.clamped);
        match entities.iter().position(|e| e.label == row.label) {
            Some(slot) => {
                report.duplicates += 1;
                positions[slot] = row.pos;
            }
            None => {
                let kind = resolve_kind(row.category, &row.label, hint);
                entities.push(Entity { label: row.label, kind });
                positions.push(row.pos);
            }
        }
    }
    let roster = Roster::new(entities);
    let baseline = Snapshot::new(positions);

    let last_step = by_step.keys().next_back().copied().unwrap_or(0);
    let mut deltas = Vec::with_capacity(last_step);
    for step in 1..=last_step {
        let mut entries: Vec<(usize, Pos)> = Vec::new();
        for row in by_step.remove(&step).unwrap_or_default() {
            let Some(slot) = roster.slot(&row.label) else {
                report.skip(row.line, RowIssue::UnknownLabel(row.label));
                continue;
            };
            if entries.iter().any(|(s, _)| *s == slot) {
                report.duplicates += 1;
            }
            report.imported += 1;
            report.clamped += usize::from(row.clamped);
            entries.push((slot, row.pos));
        }
        deltas.push(Delta::new(entries));
    }

    let timeline = Timeline::from_parts(roster, baseline, deltas)?;
    tracing::info!(
        steps = timeline.step_count(),
        entities = timeline.roster().len(),
        report = %report,
        "strategy imported"
    );
    Ok((timeline, report))
}

/// Sparse records: every entity at step 0, then each step's delta in slot order.
pub fn timeline_to_rows(timeline: &Timeline) -> Vec<StrategyRecord> {
    let roster = timeline.roster();
    let record = |step: usize, slot: usize, pos: Pos| {
        let entity = roster.entity(slot);
        StrategyRecord {
            step: step.to_string(),
            entity: entity.map_or("player", |e| e.kind.category()).to_string(),
            label: entity.map(|e| e.label.clone()).unwrap_or_default(),
            x_m: format_coordinate(pos.x, STRATEGY_DECIMALS),
            y_m: format_coordinate(pos.y, STRATEGY_DECIMALS),
        }
    };

    let mut rows: Vec<StrategyRecord> =
        timeline.baseline().iter().map(|(slot, pos)| record(0, slot, pos)).collect();
    for step in 1..=timeline.last_step() {
        if let Some(delta) = timeline.delta(step) {
            rows.extend(delta.entries().iter().map(|&(slot, pos)| record(step, slot, pos)));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::SnapshotReconstructor;

    fn record(step: &str, entity: &str, label: &str, x: &str, y: &str) -> StrategyRecord {
        StrategyRecord {
            step: step.into(),
            entity: entity.into(),
            label: label.into(),
            x_m: x.into(),
            y_m: y.into(),
        }
    }

    fn sample_rows() -> Vec<StrategyRecord> {
        vec![
            record("0", "player", "B1", "10.000000", "5.000000"),
            record("0", "player", "R1", "20.000000", "5.000000"),
            record("0", "disc", "DISC", "50.000000", "18.500000"),
            record("1", "player", "B1", "12.000000", "6.000000"),
            record("3", "disc", "DISC", "40.000000", "18.500000"),
        ]
    }

    #[test]
    fn test_import_rebuilds_sparse_timeline() {
        let (timeline, report) = timeline_from_rows(sample_rows(), None).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.imported, 5);

        assert_eq!(timeline.last_step(), 3);
        assert_eq!(timeline.roster().labels().collect::<Vec<_>>(), vec!["B1", "R1", "DISC"]);
        assert_eq!(
            timeline.roster().entity(1).map(|e| e.kind),
            Some(EntityKind::Player(Team::Red))
        );
        assert_eq!(timeline.delta(1).map(Delta::len), Some(1));
        assert_eq!(timeline.delta(2).map(Delta::is_empty), Some(true));

        let mut recon = SnapshotReconstructor::new(timeline);
        let step3 = recon.build(3).unwrap();
        assert_eq!(step3.get(0), Some(Pos::new(12.0, 6.0)));
        assert_eq!(step3.get(2), Some(Pos::new(40.0, 18.5)));
    }

    #[test]
    fn test_unknown_label_after_baseline_is_reported() {
        let mut rows = sample_rows();
        rows.push(record("2", "player", "B9", "1", "1"));
        let (timeline, report) = timeline_from_rows(rows, None).unwrap();

        assert_eq!(report.imported, 5);
        assert_eq!(
            report.skipped,
            vec![crate::interchange::SkippedRow { line: 7, issue: RowIssue::UnknownLabel("B9".into()) }]
        );
        assert_eq!(timeline.delta(2).map(Delta::is_empty), Some(true));
    }

    #[test]
    fn test_bad_rows_are_skipped_not_fatal() {
        let mut rows = sample_rows();
        rows.push(record("x", "player", "B1", "1", "1"));
        rows.push(record("-1", "player", "B1", "1", "1"));
        rows.push(record("2", "player", "R1", "inf", "1"));
        rows.push(record("2", "player", "R1", "130", "1"));
        rows.push(record("2", "player", "R1", "30", "2"));
        let (timeline, report) = timeline_from_rows(rows, None).unwrap();

        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.skipped[0].issue, RowIssue::BadStep("x".into()));
        assert_eq!(report.clamped, 1);
        assert_eq!(report.duplicates, 1);
        // last row for R1 in step 2 wins
        assert_eq!(
            timeline.delta(2).map(|d| d.entries().to_vec()),
            Some(vec![(1, Pos::new(30.0, 2.0))])
        );
    }

    #[test]
    fn test_oversized_step_is_skipped() {
        let mut rows = sample_rows();
        rows.push(record("18446744073709551615", "player", "B1", "2", "2"));
        rows.push(record("4000000000", "player", "B1", "2", "2"));
        rows.push(record(&(MAX_IMPORT_STEP + 1).to_string(), "player", "B1", "2", "2"));
        let (timeline, report) = timeline_from_rows(rows, None).unwrap();

        assert_eq!(timeline.last_step(), 3);
        assert_eq!(report.imported, 5);
        let issues: Vec<&RowIssue> = report.skipped.iter().map(|s| &s.issue).collect();
        assert_eq!(
            issues,
            vec![
                &RowIssue::BadStep("18446744073709551615".into()),
                &RowIssue::BadStep("4000000000".into()),
                &RowIssue::BadStep("10001".into()),
            ]
        );
    }

    #[test]
    fn test_step_at_import_limit_is_kept() {
        let rows = vec![
            record("0", "player", "B1", "1", "1"),
            record(&MAX_IMPORT_STEP.to_string(), "player", "B1", "2", "2"),
        ];
        let (timeline, report) = timeline_from_rows(rows, None).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(timeline.last_step(), MAX_IMPORT_STEP);
    }

    #[test]
    fn test_missing_baseline_fails() {
        let rows = vec![record("1", "player", "B1", "1", "1")];
        let err = timeline_from_rows(rows, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBaseline { .. }));
    }

    #[test]
    fn test_hint_roster_supplies_teams() {
        let hint = Roster::new(vec![Entity::player("Zed", Team::Red)]);
        let rows = vec![
            record("0", "player", "Zed", "1", "1"),
            record("0", "player", "Amy", "2", "2"),
        ];
        let (timeline, _) = timeline_from_rows(rows, Some(&hint)).unwrap();
        let kinds: Vec<EntityKind> = timeline.roster().entities().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntityKind::Player(Team::Red), EntityKind::Player(Team::Blue)]);
    }

    #[test]
    fn test_export_then_import_preserves_steps() {
        let (timeline, _) = timeline_from_rows(sample_rows(), None).unwrap();
        let rows = timeline_to_rows(&timeline);
        assert_eq!(rows, sample_rows());

        let (again, report) = timeline_from_rows(rows, None).unwrap();
        assert!(report.is_clean());
        assert_eq!(again, timeline);
    }
}
