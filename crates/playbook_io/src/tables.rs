//! Formation and strategy CSV files
//!
//! Reading is lenient: a record the CSV layer cannot decode still takes its
//! line, as an empty record that the core reports as skipped. Only I/O
//! failures abort a load.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use playbook_core::interchange::{FORMATION_HEADERS, STRATEGY_HEADERS};
use playbook_core::{
    formation_from_rows, formation_to_rows, timeline_from_rows, timeline_to_rows, Formation,
    FormationRecord, ImportReport, Roster, StrategyRecord, Timeline,
};

fn read_records<T, R>(reader: R) -> Result<Vec<T>>
where
    T: DeserializeOwned + Default,
    R: io::Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize::<T>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(err) if err.is_io_error() => {
                return Err(err).context("Failed to read CSV record");
            }
            Err(err) => {
                tracing::warn!(line = index + 2, error = %err, "undecodable CSV record");
                records.push(T::default());
            }
        }
    }
    Ok(records)
}

fn write_records<T, W>(writer: W, headers: &[&str], records: &[T]) -> Result<()>
where
    T: Serialize,
    W: io::Write,
{
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(headers).context("Failed to write CSV header")?;
    for record in records {
        wtr.serialize(record).context("Failed to write CSV record")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ========================================
// Formation (entity,label,team,x_m,y_m)
// ========================================

pub fn read_formation<R: io::Read>(reader: R) -> Result<(Formation, ImportReport)> {
    let records: Vec<FormationRecord> = read_records(reader)?;
    Ok(formation_from_rows(records))
}

pub fn write_formation<W: io::Write>(writer: W, formation: &Formation) -> Result<()> {
    write_records(writer, &FORMATION_HEADERS, &formation_to_rows(formation))
}

pub fn load_formation(path: &Path) -> Result<(Formation, ImportReport)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open formation file: {}", path.display()))?;
    read_formation(BufReader::new(file))
        .with_context(|| format!("Failed to import formation: {}", path.display()))
}

pub fn save_formation(path: &Path, formation: &Formation) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create formation file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_formation(&mut out, formation)?;
    out.flush()?;
    tracing::info!(path = %path.display(), entities = formation.roster.len(), "formation exported");
    Ok(())
}

// ========================================
// Strategy (step,entity,label,x_m,y_m)
// ========================================

/// `hint` supplies player teams for labels it knows.
pub fn read_strategy<R: io::Read>(
    reader: R,
    hint: Option<&Roster>,
) -> Result<(Timeline, ImportReport)> {
    let records: Vec<StrategyRecord> = read_records(reader)?;
    Ok(timeline_from_rows(records, hint)?)
}

pub fn write_strategy<W: io::Write>(writer: W, timeline: &Timeline) -> Result<()> {
    write_records(writer, &STRATEGY_HEADERS, &timeline_to_rows(timeline))
}

pub fn load_strategy(path: &Path, hint: Option<&Roster>) -> Result<(Timeline, ImportReport)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open strategy file: {}", path.display()))?;
    read_strategy(BufReader::new(file), hint)
        .with_context(|| format!("Failed to import strategy: {}", path.display()))
}

pub fn save_strategy(path: &Path, timeline: &Timeline) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create strategy file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_strategy(&mut out, timeline)?;
    out.flush()?;
    tracing::info!(path = %path.display(), steps = timeline.step_count(), "strategy exported");
    Ok(())
}
