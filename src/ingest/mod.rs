//! CSV ingestion pipeline
//!
//! One export file flows through:
//!
//! ```text
//! read_rows ─► classify ─► extract_header ─► denylist / duplicate guard
//!                                                     │
//!                    insert_draft (one transaction) ◄─┴─ coerce player & pick rows
//! ```
//!
//! Flat exports skip the header and player stages, see [`flat`].
//!
//! Every per-file problem surfaces as an [`IngestError`]; only
//! [`IngestError::Db`] is fatal for a batch (see [`batch`]).

pub mod batch;
pub mod classify;
pub mod coerce;
pub mod flat;
pub mod header;
pub mod reader;

use crate::config::IngestConfig;
use crate::db::{Database, DbError, DraftRecord};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use batch::{
    ingest_dir, ingest_dir_as, ingest_dir_with, list_csv_files, BatchReport, ExportKind, FileOutcome, FileReport,
};
pub use classify::{classify, Layout};
pub use flat::{ingest_flat_file, ingest_flat_rows, timestamp_from_file_name};
pub use header::{extract_header, parse_date_time, DraftHeader, HeaderField};
pub use reader::{parse_rows, read_rows, CsvRows};

/// A header line was missing, malformed or carried an unknown date format
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unrecognized date/time {0:?}")]
    UnrecognizedDateTime(String),
    #[error("'Total Pokemon Sold' is not an integer: {0:?}")]
    InvalidTotalSold(String),
    #[error("missing header field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("file name {0:?} does not start with a YYYYMMDD_HHMMSS timestamp")]
    MissingFileTimestamp(String),
}

/// A table marker row could not be found
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("no 'Player, Starting Money, Remaining Money' header row")]
    MissingPlayerHeader,
    #[error("no 'Order, Pokemon, Drafted By, Cost' or 'Pokemon, Drafted By, Cost' header row")]
    MissingPickHeader,
    #[error("pick table header (record {pick}) appears before the player table header (record {player})")]
    PickHeaderBeforePlayers { player: usize, pick: usize },
    #[error("flat export header lacks column(s): {}", .0.join(", "))]
    MissingFlatColumns(Vec<&'static str>),
}

/// Errors that can occur while ingesting a single file
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("structure error: {0}")]
    Structure(#[from] StructureError),

    /// `line` is the 1-based file line of the row
    #[error("coercion error: line {line}, column '{column}': expected an integer, found {value:?}")]
    Coercion {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Db(#[from] DbError),
}

impl IngestError {
    /// Store failures stop the whole batch; everything else is per-file
    pub fn is_fatal(&self) -> bool {
        matches!(self, IngestError::Db(_))
    }
}

/// What happened to a file that did not fail
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Inserted {
        event_id: i32,
        external_id: Option<String>,
        players: usize,
        picks: usize,
    },
    SkippedDuplicate {
        external_id: String,
    },
    SkippedDenylisted {
        external_id: String,
    },
    /// A flat export whose file name is already in the store
    SkippedSeenFile {
        source_file: String,
    },
}

impl std::fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestOutcome::Inserted { event_id, external_id, players, picks } => {
                write!(f, "inserted draft")?;
                if let Some(id) = external_id {
                    write!(f, " {}", id)?;
                }
                write!(f, " as event {} ({} players, {} picks)", event_id, players, picks)
            }
            IngestOutcome::SkippedDuplicate { external_id } => {
                write!(f, "skipped (duplicate): draft {} already ingested", external_id)
            }
            IngestOutcome::SkippedDenylisted { external_id } => {
                write!(f, "skipped (denylisted): draft {}", external_id)
            }
            IngestOutcome::SkippedSeenFile { source_file } => {
                write!(f, "skipped (duplicate): file {} already ingested", source_file)
            }
        }
    }
}

/// Ingest one CSV export file
pub fn ingest_file(db: &Database, path: &Path, config: &IngestConfig) -> Result<IngestOutcome, IngestError> {
    let rows = read_rows(path)?;
    let source = path.file_name().map(|n| n.to_string_lossy().to_string());
    ingest_rows(db, &rows, source.as_deref(), config)
}

/// Ingest an already-decoded file.
///
/// Denylist and duplicate checks run only once the header has been fully
/// extracted, so a file with a broken header is reported as a format error
/// even when its id is known.
pub fn ingest_rows(
    db: &Database,
    rows: &CsvRows,
    source_file: Option<&str>,
    config: &IngestConfig,
) -> Result<IngestOutcome, IngestError> {
    let layout = classify(&rows.cells)?;
    let header = extract_header(&rows.cells[layout.metadata()], layout.format, &config.date_formats)?;

    if let Some(external_id) = header.external_id.as_deref() {
        if config.is_denied(external_id) {
            info!("Skipping denylisted draft {}", external_id);
            return Ok(IngestOutcome::SkippedDenylisted { external_id: external_id.to_string() });
        }
        if db.draft_exists(external_id)? {
            info!("Skipping already ingested draft {}", external_id);
            return Ok(IngestOutcome::SkippedDuplicate { external_id: external_id.to_string() });
        }
    }

    let players = coerce::coerce_players(rows, layout.players())?;
    let picks = coerce::coerce_picks(rows, layout.picks(), layout.format)?;

    let record = DraftRecord {
        external_draft_id: header.external_id,
        patch: header.patch,
        date_time: header.date_time,
        total_pokemon_sold: header.total_sold,
        format_version: layout.format,
        source_file: source_file.map(str::to_string),
        players,
        picks,
    };
    let event_id = db.insert_draft(&record)?;
    info!(
        "Inserted draft {} as event {}",
        record.external_draft_id.as_deref().unwrap_or("<legacy>"),
        event_id
    );

    Ok(IngestOutcome::Inserted {
        event_id,
        external_id: record.external_draft_id,
        players: record.players.len(),
        picks: record.picks.len(),
    })
}
