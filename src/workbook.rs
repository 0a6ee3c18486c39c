//! Spreadsheet import through calamine.
//!
//! Only the first worksheet is read. calamine trims leading blank rows and
//! columns from a range, so the grid is re-anchored at A1 here; header
//! positions in [`crate::grid`] are absolute sheet rows.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use log::{debug, info};

use crate::data::{Value, excel_serial_to_datetime};
use crate::error::RemapError;
use crate::grid::{MAX_COLUMNS, RawGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xlsx,
    Xls,
}

impl SourceFormat {
    /// Recognises the container kind by file extension.
    pub fn from_path(path: &Path) -> Result<Self, RemapError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Ok(SourceFormat::Xlsx),
            Some(ext) if ext.eq_ignore_ascii_case("xls") => Ok(SourceFormat::Xls),
            _ => Err(RemapError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Boolean(*b),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Value::DateTime)
            .unwrap_or(Value::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(format!("#ERROR: {e:?}")),
    }
}

/// Reads the first worksheet of an `.xlsx` or `.xls` file into a raw grid.
pub fn read_grid(path: &Path) -> Result<RawGrid, RemapError> {
    let format = SourceFormat::from_path(path)?;
    debug!("Opening {path:?} as {format:?}");
    let workbook_error = |message: String| RemapError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        info!("Workbook {path:?} has no worksheets");
        return Ok(RawGrid::default());
    };
    let range = range.map_err(|e| workbook_error(e.to_string()))?;

    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    let mut rows = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![Value::Empty; start_col.min(MAX_COLUMNS)];
        cells.extend(
            row.iter()
                .take(MAX_COLUMNS.saturating_sub(start_col))
                .map(cell_to_value),
        );
        rows.push(cells);
    }
    info!("Read {} sheet row(s) from {:?}", rows.len(), path);
    Ok(RawGrid::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn recognises_both_spreadsheet_extensions() {
        assert_eq!(
            SourceFormat::from_path(&PathBuf::from("a.XLSX")).unwrap(),
            SourceFormat::Xlsx
        );
        assert_eq!(
            SourceFormat::from_path(&PathBuf::from("b.xls")).unwrap(),
            SourceFormat::Xls
        );
    }

    #[test]
    fn rejects_other_extensions() {
        for name in ["data.csv", "book.xlsm", "noext"] {
            let err = SourceFormat::from_path(&PathBuf::from(name)).unwrap_err();
            assert!(matches!(err, RemapError::UnsupportedFormat { .. }));
        }
    }

    #[test]
    fn unsupported_extension_fails_before_opening() {
        let err = read_grid(Path::new("/nonexistent/file.ods")).unwrap_err();
        assert!(matches!(err, RemapError::UnsupportedFormat { .. }));
    }

    #[test]
    fn cell_conversion_keeps_kinds() {
        assert_eq!(cell_to_value(&Data::Int(7)), Value::Number(7.0));
        assert_eq!(cell_to_value(&Data::Empty), Value::Empty);
        assert_eq!(
            cell_to_value(&Data::String("abc".into())),
            Value::Text("abc".into())
        );
    }
}
