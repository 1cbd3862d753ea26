//! Flat timestamped exports.
//!
//! A flat export is one headed table of picks with no metadata lines and no
//! player table. The draft time comes from the first fifteen characters of
//! the file name (`YYYYMMDD_HHMMSS`). Column names are matched after trimming,
//! lowercasing and replacing spaces with underscores; the website labels the
//! species column `Player`, which is read as `pokemon`.

use super::coerce::{int_cell, text_cell};
use super::reader::{read_rows, CsvRows};
use super::{FormatError, IngestError, IngestOutcome, StructureError};
use crate::db::{Database, DraftRecord, FormatVersion, PickRow};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::info;

pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const FILE_TIMESTAMP_LEN: usize = 15;

/// Parse the `YYYYMMDD_HHMMSS` prefix of a flat export's file name
pub fn timestamp_from_file_name(name: &str) -> Result<NaiveDateTime, FormatError> {
    name.get(..FILE_TIMESTAMP_LEN)
        .and_then(|prefix| NaiveDateTime::parse_from_str(prefix, FILE_TIMESTAMP_FORMAT).ok())
        .ok_or_else(|| FormatError::MissingFileTimestamp(name.to_string()))
}

/// Canonical name of a header cell
fn normalize_column(cell: &str) -> String {
    let name = cell.trim().to_lowercase().replace(' ', "_");
    if name == "player" {
        "pokemon".to_string()
    } else {
        name
    }
}

/// Positions of the columns a flat pick row is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FlatColumns {
    order: Option<usize>,
    pokemon: usize,
    drafted_by: usize,
    cost: usize,
}

impl FlatColumns {
    fn locate(header: &[String]) -> Result<Self, StructureError> {
        let names: Vec<String> = header.iter().map(|c| normalize_column(c)).collect();
        let find = |wanted: &str| names.iter().position(|n| n == wanted);

        let (pokemon, drafted_by, cost) = (find("pokemon"), find("drafted_by"), find("cost"));
        let missing: Vec<&'static str> = [("pokemon", pokemon), ("drafted_by", drafted_by), ("cost", cost)]
            .into_iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name)
            .collect();

        match (pokemon, drafted_by, cost) {
            (Some(pokemon), Some(drafted_by), Some(cost)) => Ok(FlatColumns {
                order: find("order").or_else(|| find("draft_order")),
                pokemon,
                drafted_by,
                cost,
            }),
            _ => Err(StructureError::MissingFlatColumns(missing)),
        }
    }
}

/// Coerce every row below the header; rows with a blank species are dropped
pub fn coerce_flat_picks(rows: &CsvRows) -> Result<Vec<PickRow>, IngestError> {
    let Some(header) = rows.cells.first() else {
        return Err(StructureError::MissingFlatColumns(vec!["pokemon", "drafted_by", "cost"]).into());
    };
    let columns = FlatColumns::locate(header)?;

    let mut picks = Vec::new();
    for (index, row) in rows.cells.iter().enumerate().skip(1) {
        let pokemon = text_cell(row, columns.pokemon);
        if pokemon.is_empty() {
            continue;
        }
        let line = rows.line(index);
        let draft_order = match columns.order {
            Some(col) => Some(int_cell(row, col, line, "Order")?),
            None => None,
        };
        picks.push(PickRow {
            draft_order,
            pokemon,
            drafted_by: text_cell(row, columns.drafted_by),
            cost: int_cell(row, columns.cost, line, "Cost")?,
        });
    }
    Ok(picks)
}

/// Ingest one flat export file
pub fn ingest_flat_file(db: &Database, path: &Path) -> Result<IngestOutcome, IngestError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let rows = read_rows(path)?;
    ingest_flat_rows(db, &rows, &name)
}

/// Ingest an already-decoded flat export named `file_name`.
///
/// Flat exports have no draft id, so a file name already stored as a flat
/// event is skipped instead.
pub fn ingest_flat_rows(db: &Database, rows: &CsvRows, file_name: &str) -> Result<IngestOutcome, IngestError> {
    let date_time = timestamp_from_file_name(file_name)?;
    let picks = coerce_flat_picks(rows)?;

    if db.source_file_exists(file_name, FormatVersion::Flat)? {
        info!("Skipping already ingested flat export {}", file_name);
        return Ok(IngestOutcome::SkippedSeenFile { source_file: file_name.to_string() });
    }

    let record = DraftRecord {
        external_draft_id: None,
        patch: None,
        date_time,
        total_pokemon_sold: i32::try_from(picks.len()).unwrap_or(i32::MAX),
        format_version: FormatVersion::Flat,
        source_file: Some(file_name.to_string()),
        players: Vec::new(),
        picks,
    };
    let event_id = db.insert_draft(&record)?;
    info!("Inserted flat export {} as event {}", file_name, event_id);

    Ok(IngestOutcome::Inserted {
        event_id,
        external_id: None,
        players: 0,
        picks: record.picks.len(),
    })
}
