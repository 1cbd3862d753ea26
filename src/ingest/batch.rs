//! Directory batch runner.
//!
//! Files are processed one at a time in file-name order. Per-file failures
//! are recorded and the batch moves on; a store failure ends the run.

use super::{ingest_file, ingest_flat_file, IngestError, IngestOutcome};
use crate::config::IngestConfig;
use crate::db::Database;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Which layout the files of a batch are read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    /// Draft-tool exports with header lines and player/pick tables
    #[default]
    Draft,
    /// Single-table exports dated by a `YYYYMMDD_HHMMSS` file name prefix
    Flat,
}

/// Result of one file in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Ingested(IngestOutcome),
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Every file of a batch, in processing order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn inserted(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Ingested(IngestOutcome::Inserted { .. })))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                FileOutcome::Ingested(
                    IngestOutcome::SkippedDuplicate { .. }
                        | IngestOutcome::SkippedDenylisted { .. }
                        | IngestOutcome::SkippedSeenFile { .. }
                )
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    /// 0 when every file was inserted or skipped, 1 when any failed
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 {
            1
        } else {
            0
        }
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// List `*.csv` files (case-insensitive) directly inside `dir`, sorted by name
pub fn list_csv_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Ingest every CSV file in `dir`
pub fn ingest_dir(db: &Database, dir: &Path, config: &IngestConfig) -> Result<BatchReport, IngestError> {
    ingest_dir_with(db, dir, config, |_| {})
}

/// Like [`ingest_dir`], calling `on_file` as soon as each file is done
pub fn ingest_dir_with<F>(
    db: &Database,
    dir: &Path,
    config: &IngestConfig,
    on_file: F,
) -> Result<BatchReport, IngestError>
where
    F: FnMut(&FileReport),
{
    ingest_dir_as(db, dir, ExportKind::Draft, config, on_file)
}

/// Ingest every CSV file in `dir` as exports of `kind`
pub fn ingest_dir_as<F>(
    db: &Database,
    dir: &Path,
    kind: ExportKind,
    config: &IngestConfig,
    mut on_file: F,
) -> Result<BatchReport, IngestError>
where
    F: FnMut(&FileReport),
{
    let files = list_csv_files(dir)?;
    debug!("Found {} CSV file(s) in {}", files.len(), dir.display());

    let mut report = BatchReport::default();
    for path in files {
        let result = match kind {
            ExportKind::Draft => ingest_file(db, &path, config),
            ExportKind::Flat => ingest_flat_file(db, &path),
        };
        let outcome = match result {
            Ok(outcome) => FileOutcome::Ingested(outcome),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                FileOutcome::Failed { reason: e.to_string() }
            }
        };
        let file = FileReport { path, outcome };
        on_file(&file);
        report.files.push(file);
    }
    Ok(report)
}
