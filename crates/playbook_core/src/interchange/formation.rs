//! `entity,label,team,x_m,y_m`: one formation

use serde::{Deserialize, Serialize};

use super::{
    format_coordinate, line_of, parse_category, parse_position, Category, ImportReport, RowIssue,
    FORMATION_DECIMALS,
};
use crate::field::Pos;
use crate::roster::{Entity, EntityKind, Team, DISC_LABEL};
use crate::snapshot::Formation;

/// One position-CSV record, as read or written
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormationRecord {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub x_m: String,
    #[serde(default)]
    pub y_m: String,
}

fn parse_record(record: &FormationRecord) -> Result<(Entity, Pos, bool), RowIssue> {
    let kind = match parse_category(&record.entity)? {
        Category::Player => {
            let team: Team = record
                .team
                .parse()
                .map_err(|_| RowIssue::UnknownTeam(record.team.trim().to_string()))?;
            EntityKind::Player(team)
        }
        Category::Disc => EntityKind::Disc,
    };
    let label = match record.label.trim() {
        "" if kind.is_disc() => DISC_LABEL.to_string(),
        "" => return Err(RowIssue::MissingLabel),
        label => label.to_string(),
    };
    let (pos, clamped) = parse_position(&record.x_m, &record.y_m)?;
    Ok((Entity { label, kind }, pos, clamped))
}

/// Build a formation from whatever valid rows are present.
///
/// A repeated label keeps its first row. No disc is added when the file
/// has none.
pub fn formation_from_rows<I>(records: I) -> (Formation, ImportReport)
where
    I: IntoIterator<Item = FormationRecord>,
{
    let mut report = ImportReport::default();
    let mut entries: Vec<(Entity, Pos)> = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        match parse_record(&record) {
            Ok((entity, pos, clamped)) => {
                if entries.iter().any(|(e, _)| e.label == entity.label) {
                    report.duplicates += 1;
                }
                report.imported += 1;
                report.clamped += usize::from(clamped);
                entries.push((entity, pos));
            }
            Err(issue) => report.skip(line_of(index), issue),
        }
    }

    let formation = Formation::new(entries);
    tracing::info!(entities = formation.roster.len(), report = %report, "formation imported");
    (formation, report)
}

/// Records in roster order, coordinates at three decimals.
pub fn formation_to_rows(formation: &Formation) -> Vec<FormationRecord> {
    formation
        .entries()
        .map(|(entity, pos)| FormationRecord {
            entity: entity.kind.category().to_string(),
            label: entity.label.clone(),
            team: entity.kind.team_column().to_string(),
            x_m: format_coordinate(pos.x, FORMATION_DECIMALS),
            y_m: format_coordinate(pos.y, FORMATION_DECIMALS),
        })
        .collect()
}
