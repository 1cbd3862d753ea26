//! Turn player and pick rows into typed records.
//!
//! Rows whose first cell is blank are padding and are dropped. Any other row
//! must carry integer money/order/cost cells or the whole file is rejected.
//! Errors name the file line of the offending row.

use super::reader::CsvRows;
use super::IngestError;
use crate::db::{FormatVersion, PickRow, PlayerRow};
use std::ops::Range;

fn is_blank(row: &[String]) -> bool {
    row.first().map_or(true, |cell| cell.trim().is_empty())
}

pub(super) fn text_cell(row: &[String], index: usize) -> String {
    row.get(index).map(|c| c.trim().to_string()).unwrap_or_default()
}

pub(super) fn int_cell(row: &[String], index: usize, line: u64, column: &'static str) -> Result<i32, IngestError> {
    let raw = row.get(index).map(|c| c.trim()).unwrap_or("");
    raw.parse::<i32>().map_err(|_| IngestError::Coercion {
        line,
        column,
        value: raw.to_string(),
    })
}

/// Coerce the player zone of a file
pub fn coerce_players(rows: &CsvRows, zone: Range<usize>) -> Result<Vec<PlayerRow>, IngestError> {
    let start = zone.start;
    let mut players = Vec::new();
    for (offset, row) in rows.cells[zone].iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let line = rows.line(start + offset);
        players.push(PlayerRow {
            player_name: text_cell(row, 0),
            starting_money: int_cell(row, 1, line, "Starting Money")?,
            remaining_money: int_cell(row, 2, line, "Remaining Money")?,
        });
    }
    Ok(players)
}

/// Coerce the pick zone of a file; legacy exports have no order column.
///
/// Flat exports are keyed by column name in [`super::flat`] and only fall
/// back to the legacy positions here.
pub fn coerce_picks(
    rows: &CsvRows,
    zone: Range<usize>,
    format: FormatVersion,
) -> Result<Vec<PickRow>, IngestError> {
    let start = zone.start;
    let mut picks = Vec::new();
    for (offset, row) in rows.cells[zone].iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let line = rows.line(start + offset);
        let pick = match format {
            FormatVersion::V2 => PickRow {
                draft_order: Some(int_cell(row, 0, line, "Order")?),
                pokemon: text_cell(row, 1),
                drafted_by: text_cell(row, 2),
                cost: int_cell(row, 3, line, "Cost")?,
            },
            FormatVersion::Legacy | FormatVersion::Flat => PickRow {
                draft_order: None,
                pokemon: text_cell(row, 0),
                drafted_by: text_cell(row, 1),
                cost: int_cell(row, 2, line, "Cost")?,
            },
        };
        picks.push(pick);
    }
    Ok(picks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn table(rows: Vec<Vec<String>>) -> CsvRows {
        CsvRows::from(rows)
    }

    #[test]
    fn test_players_skip_blank_leading_cell() {
        let rows = table(vec![
            row(&["Ash", "1000", " 150 "]),
            row(&["", "1", "2"]),
            row(&[]),
            row(&["Misty", "1000", "420"]),
        ]);
        let players = coerce_players(&rows, 0..rows.cells.len()).unwrap();
        assert_eq!(
            players,
            vec![
                PlayerRow { player_name: "Ash".into(), starting_money: 1000, remaining_money: 150 },
                PlayerRow { player_name: "Misty".into(), starting_money: 1000, remaining_money: 420 },
            ]
        );
    }

    #[test]
    fn test_money_must_be_integer() {
        let rows = table(vec![row(&["header"]), row(&["Ash", "1,000", "0"])]);
        let err = coerce_players(&rows, 1..2).unwrap_err();
        match err {
            IngestError::Coercion { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "Starting Money");
                assert_eq!(value, "1,000");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_cell_is_a_coercion_error() {
        let rows = table(vec![row(&["Ash", "1000"])]);
        assert!(matches!(
            coerce_players(&rows, 0..1),
            Err(IngestError::Coercion { column: "Remaining Money", .. })
        ));
    }

    #[test]
    fn test_v2_picks() {
        let rows = table(vec![row(&["1", "Garchomp", "Ash", "500"]), row(&["2", " Mr. Mime ", "Misty", "15"])]);
        let picks = coerce_picks(&rows, 0..2, FormatVersion::V2).unwrap();
        assert_eq!(picks[0].draft_order, Some(1));
        assert_eq!(picks[1].pokemon, "Mr. Mime");
        assert_eq!(picks[1].cost, 15);
    }

    #[test]
    fn test_v2_order_must_be_integer() {
        let rows = table(vec![row(&["first", "Garchomp", "Ash", "500"])]);
        assert!(matches!(
            coerce_picks(&rows, 0..1, FormatVersion::V2),
            Err(IngestError::Coercion { column: "Order", .. })
        ));
    }

    #[test]
    fn test_legacy_picks_have_no_order() {
        let rows = table(vec![row(&["Snorlax", "Red", "700"]), row(&["", "", ""]), row(&["Gengar", "Blue", "500"])]);
        let picks = coerce_picks(&rows, 0..3, FormatVersion::Legacy).unwrap();
        assert_eq!(picks.len(), 2);
        assert!(picks.iter().all(|p| p.draft_order.is_none()));
        assert_eq!(picks[1].drafted_by, "Blue");
    }

    #[test]
    fn test_error_reports_file_line_not_row_index() {
        let rows = CsvRows {
            cells: vec![row(&["Order", "Pokemon", "Drafted By", "Cost"]), row(&["1", "Garchomp", "Ash", "5OO"])],
            lines: vec![11, 14],
        };
        match coerce_picks(&rows, 1..2, FormatVersion::V2).unwrap_err() {
            IngestError::Coercion { line, column, .. } => {
                assert_eq!(line, 14);
                assert_eq!(column, "Cost");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
