use std::io::Cursor;

use calamine::Reader;

use super::RosterRow;
use crate::error::StampError;

/// Required header names, matched case-insensitively against row 1 of
/// the first worksheet.
pub const ID_COLUMN: &str = "ID";
pub const NAME_COLUMN: &str = "Name";

/// Read a roster spreadsheet (xlsx or legacy xls) into ordered rows.
///
/// The schema is validated once here: row 1 must contain an `ID` column
/// and a `Name` column, anything else is a hard format error. Cell
/// contents are converted to text so the mapping builder only ever sees
/// strings.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<RosterRow>, StampError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| StampError::RosterFormat(format!("failed to open spreadsheet: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| StampError::RosterFormat("workbook has no worksheets".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| {
            StampError::RosterFormat(format!("failed to read sheet '{sheet_name}': {e}"))
        })?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| {
        StampError::RosterFormat(format!(
            "sheet '{sheet_name}' is empty (expected a header row with '{ID_COLUMN}' and '{NAME_COLUMN}' columns)"
        ))
    })?;

    let id_col = find_column(header, ID_COLUMN)?;
    let name_col = find_column(header, NAME_COLUMN)?;

    Ok(rows
        .map(|row| RosterRow {
            identifier: row.get(id_col).and_then(cell_as_string),
            names: row.get(name_col).and_then(cell_as_string),
        })
        .collect())
}

fn find_column(header: &[calamine::Data], wanted: &str) -> Result<usize, StampError> {
    header
        .iter()
        .position(|cell| {
            cell_as_string(cell).is_some_and(|s| s.eq_ignore_ascii_case(wanted))
        })
        .ok_or_else(|| {
            StampError::RosterFormat(format!(
                "required column '{wanted}' not found in header row"
            ))
        })
}

fn cell_as_string(cell: &calamine::Data) -> Option<String> {
    match cell {
        calamine::Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        calamine::Data::Float(f) => Some(f.to_string()),
        calamine::Data::Int(i) => Some(i.to_string()),
        calamine::Data::DateTime(dt) => Some(dt.to_string()),
        calamine::Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_as_string_trims_and_blanks() {
        assert_eq!(
            cell_as_string(&calamine::Data::String("  Lee ".into())),
            Some("Lee".into())
        );
        assert_eq!(cell_as_string(&calamine::Data::String("   ".into())), None);
        assert_eq!(cell_as_string(&calamine::Data::Empty), None);
    }

    #[test]
    fn numeric_cells_render_as_text() {
        // Integral floats must not carry a trailing ".0", or the
        // identifier parser would still accept them but stats output
        // would look odd. Rust's f64 Display already drops it.
        assert_eq!(
            cell_as_string(&calamine::Data::Float(12.0)),
            Some("12".into())
        );
        assert_eq!(
            cell_as_string(&calamine::Data::Float(12.5)),
            Some("12.5".into())
        );
        assert_eq!(cell_as_string(&calamine::Data::Int(7)), Some("7".into()));
    }
}
