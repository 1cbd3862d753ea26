//! Header metadata extraction.
//!
//! Metadata lines are free text of the form `<Label>: <value>` in the first
//! cell of a row. Each row is matched against [`HeaderField::ALL`] in order;
//! the first recognized prefix decides which parser handles the value.

use super::FormatError;
use crate::db::FormatVersion;
use chrono::NaiveDateTime;

/// A recognized metadata line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    DraftId,
    Patch,
    Date,
    TotalSold,
}

impl HeaderField {
    pub const ALL: [HeaderField; 4] = [
        HeaderField::DraftId,
        HeaderField::Patch,
        HeaderField::Date,
        HeaderField::TotalSold,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            HeaderField::DraftId => "Draft ID:",
            HeaderField::Patch => "Patch:",
            HeaderField::Date => "Date:",
            HeaderField::TotalSold => "Total Pokemon Sold:",
        }
    }

    /// Name used in error messages
    pub fn label(self) -> &'static str {
        self.prefix().trim_end_matches(':')
    }

    /// Fields a file of the given format must carry
    pub fn required(format: FormatVersion) -> &'static [HeaderField] {
        match format {
            FormatVersion::V2 => &Self::ALL,
            FormatVersion::Legacy => &[HeaderField::Date, HeaderField::TotalSold],
            // dated by file name, no header lines
            FormatVersion::Flat => &[],
        }
    }

    /// Match a cell against the grammar, returning the field and its trimmed value
    pub fn match_line(cell: &str) -> Option<(HeaderField, &str)> {
        let cell = cell.trim_start();
        Self::ALL
            .iter()
            .find_map(|field| cell.strip_prefix(field.prefix()).map(|rest| (*field, rest.trim())))
    }
}

/// Validated header of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftHeader {
    pub external_id: Option<String>,
    pub patch: Option<String>,
    pub date_time: NaiveDateTime,
    pub total_sold: i32,
}

#[derive(Debug, Default)]
struct PartialHeader {
    external_id: Option<String>,
    patch: Option<String>,
    date_time: Option<NaiveDateTime>,
    total_sold: Option<i32>,
}

impl PartialHeader {
    fn has(&self, field: HeaderField) -> bool {
        match field {
            HeaderField::DraftId => self.external_id.is_some(),
            HeaderField::Patch => self.patch.is_some(),
            HeaderField::Date => self.date_time.is_some(),
            HeaderField::TotalSold => self.total_sold.is_some(),
        }
    }

    /// Parse one matched line into its field. A later line for the same
    /// field overrides an earlier one.
    fn apply(&mut self, field: HeaderField, value: &str, row: &[String], date_formats: &[String]) -> Result<(), FormatError> {
        match field {
            HeaderField::DraftId => self.external_id = non_empty(value),
            HeaderField::Patch => self.patch = non_empty(value),
            HeaderField::Date => {
                let time = row.get(1).map(|t| t.trim()).unwrap_or("");
                let raw = format!("{} {}", value, time);
                let raw = raw.trim();
                if !raw.is_empty() {
                    self.date_time = Some(parse_date_time(raw, date_formats)?);
                }
            }
            HeaderField::TotalSold => {
                if !value.is_empty() {
                    let total = value
                        .parse::<i32>()
                        .map_err(|_| FormatError::InvalidTotalSold(value.to_string()))?;
                    self.total_sold = Some(total);
                }
            }
        }
        Ok(())
    }

    fn finish(self, format: FormatVersion) -> Result<DraftHeader, FormatError> {
        let missing: Vec<&'static str> = HeaderField::required(format)
            .iter()
            .filter(|field| !self.has(**field))
            .map(|field| field.label())
            .collect();

        match (self.date_time, self.total_sold) {
            (Some(date_time), Some(total_sold)) if missing.is_empty() => Ok(DraftHeader {
                external_id: self.external_id,
                patch: self.patch,
                date_time,
                total_sold,
            }),
            _ => Err(FormatError::MissingFields(missing)),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Extract the header from metadata rows.
///
/// Rows whose first cell matches no prefix are ignored.
pub fn extract_header(
    rows: &[Vec<String>],
    format: FormatVersion,
    date_formats: &[String],
) -> Result<DraftHeader, FormatError> {
    let mut header = PartialHeader::default();
    for row in rows {
        let Some(first) = row.first() else { continue };
        if let Some((field, value)) = HeaderField::match_line(first) {
            header.apply(field, value, row, date_formats)?;
        }
    }
    header.finish(format)
}

/// Parse `raw` with the first format in `formats` that accepts it
pub fn parse_date_time(raw: &str, formats: &[String]) -> Result<NaiveDateTime, FormatError> {
    let raw = raw.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| FormatError::UnrecognizedDateTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use chrono::{NaiveDate, Timelike};
    use proptest::prelude::*;

    fn formats() -> Vec<String> {
        IngestConfig::default().date_formats
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn v2_rows() -> Vec<Vec<String>> {
        vec![
            row(&["Date: 12/31/2025", "6:02:28 PM"]),
            row(&["Draft ID: 123456789012"]),
            row(&["Patch:  1.4 "]),
            row(&["Total Pokemon Sold: 40"]),
            row(&["Some unrelated note"]),
        ]
    }

    #[test]
    fn test_match_line() {
        assert_eq!(HeaderField::match_line("Draft ID: 42"), Some((HeaderField::DraftId, "42")));
        assert_eq!(HeaderField::match_line("  Patch:1.2"), Some((HeaderField::Patch, "1.2")));
        assert_eq!(HeaderField::match_line("Total Pokemon Sold: 7 "), Some((HeaderField::TotalSold, "7")));
        assert_eq!(HeaderField::match_line("Drafted By"), None);
        assert_eq!(HeaderField::TotalSold.label(), "Total Pokemon Sold");
    }

    #[test]
    fn test_extract_v2_header() {
        let header = extract_header(&v2_rows(), FormatVersion::V2, &formats()).unwrap();
        assert_eq!(header.external_id.as_deref(), Some("123456789012"));
        assert_eq!(header.patch.as_deref(), Some("1.4"));
        assert_eq!(header.total_sold, 40);
        assert_eq!(
            header.date_time,
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap().and_hms_opt(18, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_v2_requires_every_field() {
        let mut rows = v2_rows();
        rows.remove(2);
        rows.remove(1);
        let err = extract_header(&rows, FormatVersion::V2, &formats()).unwrap_err();
        assert_eq!(err, FormatError::MissingFields(vec!["Draft ID", "Patch"]));
        assert_eq!(err.to_string(), "missing header field(s): Draft ID, Patch");
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut rows = v2_rows();
        rows[2] = row(&["Patch:   "]);
        let err = extract_header(&rows, FormatVersion::V2, &formats()).unwrap_err();
        assert_eq!(err, FormatError::MissingFields(vec!["Patch"]));
    }

    #[test]
    fn test_legacy_needs_only_date_and_total() {
        let rows = vec![row(&["Date: 03/04/2024", "9:15:00 AM"]), row(&["Total Pokemon Sold: 2"])];
        let header = extract_header(&rows, FormatVersion::Legacy, &formats()).unwrap();
        assert_eq!(header.external_id, None);
        assert_eq!(header.patch, None);
        assert_eq!(header.date_time.hour(), 9);

        let err = extract_header(&rows[1..], FormatVersion::Legacy, &formats()).unwrap_err();
        assert_eq!(err, FormatError::MissingFields(vec!["Date"]));
    }

    #[test]
    fn test_invalid_total_sold() {
        let mut rows = v2_rows();
        rows[3] = row(&["Total Pokemon Sold: forty"]);
        let err = extract_header(&rows, FormatVersion::V2, &formats()).unwrap_err();
        assert_eq!(err, FormatError::InvalidTotalSold("forty".to_string()));
    }

    #[test]
    fn test_date_formats_agree() {
        let us = parse_date_time("12/31/2025 6:02:28 PM", &formats()).unwrap();
        let eu = parse_date_time("31/12/2025 18:02:28", &formats()).unwrap();
        assert_eq!(us, eu);

        let legacy = parse_date_time("12/31/2025, 6:02:28 PM", &formats()).unwrap();
        assert_eq!(legacy, us);
    }

    #[test]
    fn test_unparseable_date() {
        let err = parse_date_time("13/40/2025 99:99:99", &formats()).unwrap_err();
        assert_eq!(err, FormatError::UnrecognizedDateTime("13/40/2025 99:99:99".to_string()));

        let mut rows = v2_rows();
        rows[0] = row(&["Date: 13/40/2025", "99:99:99"]);
        assert!(matches!(
            extract_header(&rows, FormatVersion::V2, &formats()),
            Err(FormatError::UnrecognizedDateTime(_))
        ));
    }

    #[test]
    fn test_format_order_prefers_day_first() {
        // both readings are valid; the first configured format wins
        let dt = parse_date_time("01/02/2025 10:00:00", &formats()).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }

    proptest! {
        #[test]
        fn prop_us_and_day_first_layouts_match(
            y in 2000i32..2100, m in 1u32..=12, d in 1u32..=28,
            h in 0u32..24, min in 0u32..60, s in 0u32..60,
        ) {
            let expected = NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap();
            let day_first = format!("{:02}/{:02}/{} {:02}:{:02}:{:02}", d, m, y, h, min, s);
            let (h12, ampm) = match h { 0 => (12, "AM"), 1..=11 => (h, "AM"), 12 => (12, "PM"), _ => (h - 12, "PM") };
            let us = format!("{}/{}/{} {}:{:02}:{:02} {}", m, d, y, h12, min, s, ampm);

            prop_assert_eq!(parse_date_time(&day_first, &formats()).unwrap(), expected);
            prop_assert_eq!(parse_date_time(&us, &formats()).unwrap(), expected);
        }
    }
}
