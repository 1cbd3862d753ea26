//! Locate the metadata, player and pick zones of an export.

use super::StructureError;
use crate::db::FormatVersion;
use std::ops::Range;

pub const PLAYER_HEADER: [&str; 3] = ["Player", "Starting Money", "Remaining Money"];
pub const PICK_HEADER_V2: [&str; 4] = ["Order", "Pokemon", "Drafted By", "Cost"];
pub const PICK_HEADER_LEGACY: [&str; 3] = ["Pokemon", "Drafted By", "Cost"];

/// Zone boundaries of one file, as row indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub format: FormatVersion,
    /// Index of the `Player, Starting Money, Remaining Money` row
    pub player_header: usize,
    /// Index of the pick table header row
    pub pick_header: usize,
    pub row_count: usize,
}

impl Layout {
    /// Rows above the player table
    pub fn metadata(&self) -> Range<usize> {
        0..self.player_header
    }

    /// Player rows, up to and including the row just above the pick header
    pub fn players(&self) -> Range<usize> {
        self.player_header + 1..self.pick_header
    }

    /// Pick rows through end of file
    pub fn picks(&self) -> Range<usize> {
        self.pick_header + 1..self.row_count
    }
}

/// Whether the leading cells of `row` equal `marker`, ignoring padding
fn starts_with(row: &[String], marker: &[&str]) -> bool {
    row.len() >= marker.len() && row.iter().zip(marker).all(|(cell, m)| cell.trim() == *m)
}

fn pick_format(row: &[String]) -> Option<FormatVersion> {
    if starts_with(row, &PICK_HEADER_V2) {
        Some(FormatVersion::V2)
    } else if starts_with(row, &PICK_HEADER_LEGACY) {
        Some(FormatVersion::Legacy)
    } else {
        None
    }
}

/// Find the player and pick tables.
///
/// The first matching marker of each kind wins. The export format follows
/// from which pick header is present.
pub fn classify(rows: &[Vec<String>]) -> Result<Layout, StructureError> {
    let player_header = rows.iter().position(|row| starts_with(row, &PLAYER_HEADER));
    let pick = rows
        .iter()
        .enumerate()
        .find_map(|(i, row)| pick_format(row).map(|format| (i, format)));

    let player_header = player_header.ok_or(StructureError::MissingPlayerHeader)?;
    let (pick_header, format) = pick.ok_or(StructureError::MissingPickHeader)?;

    if pick_header < player_header {
        return Err(StructureError::PickHeaderBeforePlayers {
            player: player_header + 1,
            pick: pick_header + 1,
        });
    }

    Ok(Layout {
        format,
        player_header,
        pick_header,
        row_count: rows.len(),
    })
}
