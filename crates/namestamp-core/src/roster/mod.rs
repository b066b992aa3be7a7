pub mod normalize;
pub mod xlsx;

use log::debug;

use crate::error::StampError;
use crate::model::{IdentifierMapping, RosterSummary};
use normalize::split_names;

/// One roster row, both cells already converted to text by the reader.
/// `None` means the cell was empty.
#[derive(Debug, Clone, Default)]
pub struct RosterRow {
    pub identifier: Option<String>,
    pub names: Option<String>,
}

/// Try to read a piece of text as an identifier.
///
/// Spreadsheets and PDF spans both render identifiers inconsistently
/// ("12", "12.0"), so the cell is parsed as a float and truncated
/// toward zero. Returns `None` for blank or non-numeric text; callers
/// skip rather than fail.
pub fn parse_identifier(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Build the identifier mapping from ordered roster rows.
///
/// Rows with a blank or non-numeric identifier cell, or whose name cell
/// yields no names, are skipped silently and only counted. Rows
/// repeating an identifier append their names to the existing list.
pub fn build_mapping(
    rows: impl IntoIterator<Item = RosterRow>,
) -> (IdentifierMapping, RosterSummary) {
    let mut mapping = IdentifierMapping::new();
    let mut summary = RosterSummary::default();

    for row in rows {
        summary.rows_read += 1;

        let id = match row.identifier.as_deref().and_then(parse_identifier) {
            Some(id) => id,
            None => {
                summary.rows_skipped += 1;
                continue;
            }
        };

        let names = row
            .names
            .as_deref()
            .map(split_names)
            .unwrap_or_default();
        if names.is_empty() {
            summary.rows_skipped += 1;
            continue;
        }

        mapping.append(id, names);
    }

    if summary.rows_skipped > 0 {
        debug!(
            "skipped {} of {} roster rows",
            summary.rows_skipped, summary.rows_read
        );
    }

    (mapping, summary)
}

/// Load a roster spreadsheet into an identifier mapping.
pub fn load(bytes: &[u8]) -> Result<(IdentifierMapping, RosterSummary), StampError> {
    let rows = xlsx::read_rows(bytes)?;
    Ok(build_mapping(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(identifier: &str, names: &str) -> RosterRow {
        RosterRow {
            identifier: (!identifier.is_empty()).then(|| identifier.to_string()),
            names: (!names.is_empty()).then(|| names.to_string()),
        }
    }

    #[test]
    fn parse_identifier_integer_and_float_forms() {
        assert_eq!(parse_identifier("12"), Some(12));
        assert_eq!(parse_identifier("12.0"), Some(12));
        assert_eq!(parse_identifier(" 42 "), Some(42));
        assert_eq!(parse_identifier("3.7"), Some(3));
    }

    #[test]
    fn parse_identifier_rejects_non_numbers() {
        assert_eq!(parse_identifier(""), None);
        assert_eq!(parse_identifier("Smith"), None);
        assert_eq!(parse_identifier("12a"), None);
        assert_eq!(parse_identifier("NaN"), None);
        assert_eq!(parse_identifier("inf"), None);
    }

    #[test]
    fn float_truncation_unifies_repeated_identifiers() {
        let (mapping, summary) =
            build_mapping(vec![row("12", "Alice"), row("12.0", "Bob")]);
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping.names(12),
            Some(&["Alice".into(), "Bob".into()][..])
        );
        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.rows_skipped, 0);
    }

    #[test]
    fn blank_identifier_and_blank_names_both_skip() {
        let (mapping, summary) = build_mapping(vec![row("", "Alice"), row("7", "")]);
        assert!(mapping.is_empty());
        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.rows_skipped, 2);
    }

    #[test]
    fn name_cell_splits_into_list() {
        let (mapping, _) = build_mapping(vec![row("1", "Smith, John")]);
        assert_eq!(
            mapping.names(1),
            Some(&["Smith".into(), "John".into()][..])
        );
    }

    #[test]
    fn whitespace_only_names_skip_row() {
        let (mapping, summary) = build_mapping(vec![row("5", " , ; ")]);
        assert!(mapping.is_empty());
        assert_eq!(summary.rows_skipped, 1);
    }
}
