//! Decode an export file into raw rows.
//!
//! Exports mix several tables of different widths in one file, so the reader
//! is headerless and flexible; zone detection happens in [`super::classify`].
//! Blank lines produce no record, so each row keeps the file line it came from.

use super::IngestError;
use csv::{Position, ReaderBuilder, Terminator};
use std::path::Path;

const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

/// Decoded records of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRows {
    pub cells: Vec<Vec<String>>,
    /// 1-based file line each record starts on, parallel to `cells`
    pub lines: Vec<u64>,
}

impl CsvRows {
    /// File line of the record at `index`
    pub fn line(&self, index: usize) -> u64 {
        self.lines.get(index).copied().unwrap_or(index as u64 + 1)
    }
}

/// Rows built in memory are numbered as if no line was blank
impl From<Vec<Vec<String>>> for CsvRows {
    fn from(cells: Vec<Vec<String>>) -> Self {
        let lines = (1..=cells.len() as u64).collect();
        CsvRows { cells, lines }
    }
}

/// Line of the first record byte at or after `pos`.
///
/// A record's position is taken before the empty lines ahead of it are
/// skipped, so those line breaks are counted here.
fn record_line(content: &[u8], pos: &Position) -> u64 {
    let start = usize::try_from(pos.byte()).unwrap_or(usize::MAX);
    let skipped = content
        .get(start..)
        .unwrap_or_default()
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .filter(|b| **b == b'\n')
        .count();
    pos.line() + skipped as u64
}

/// Read every record of a CSV file as a vector of cells
pub fn read_rows(path: &Path) -> Result<CsvRows, IngestError> {
    let content = std::fs::read(path)?;
    parse_rows(&content)
}

/// Parse CSV bytes into rows, stripping a leading UTF-8 BOM
pub fn parse_rows(content: &[u8]) -> Result<CsvRows, IngestError> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_reader(content);

    let mut rows = CsvRows::default();
    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .map_or(rows.cells.len() as u64 + 1, |pos| record_line(content, pos));
        rows.lines.push(line);
        rows.cells.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ragged_rows() {
        let rows = parse_rows(b"Date: 12/31/2025,6:02:28 PM\nDraft ID: 42\na,b,c,d\n").unwrap().cells;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Date: 12/31/2025", "6:02:28 PM"]);
        assert_eq!(rows[1], vec!["Draft ID: 42"]);
        assert_eq!(rows[2].len(), 4);
    }

    #[test]
    fn test_strips_bom_and_handles_crlf() {
        let rows = parse_rows(b"\xEF\xBB\xBFPlayer,Starting Money,Remaining Money\r\nAsh,1000,10\r\n").unwrap();
        assert_eq!(rows.cells[0][0], "Player");
        assert_eq!(rows.cells[1], vec!["Ash", "1000", "10"]);
        assert_eq!(rows.lines, vec![1, 2]);
    }

    #[test]
    fn test_blank_lines_keep_file_line_numbers() {
        let rows = parse_rows(b"Date: x\n\nPlayer,Starting Money\r\n\r\n\nAsh,1000\n").unwrap();
        assert_eq!(rows.cells.len(), 3);
        assert_eq!(rows.lines, vec![1, 3, 6]);
        assert_eq!(rows.line(2), 6);
        assert_eq!(rows.line(7), 8);
    }

    #[test]
    fn test_in_memory_rows_are_numbered_sequentially() {
        let rows = CsvRows::from(vec![vec!["a".to_string()], vec![], vec!["b".to_string()]]);
        assert_eq!(rows.lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_quoted_cells_keep_commas() {
        let rows = parse_rows(b"\"Mr. Mime, Jr.\",Ash,30\n").unwrap();
        assert_eq!(rows.cells[0], vec!["Mr. Mime, Jr.", "Ash", "30"]);
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        assert!(matches!(parse_rows(b"Ash,\xFF\xFE,1\n"), Err(IngestError::Csv(_))));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_rows(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
