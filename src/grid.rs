//! Header synthesis for the accounting export layout.
//!
//! The exports carry a title block above a two-row header at sheet rows 7
//! and 8, with data starting at row 9. [`build_table`] turns the raw cell grid
//! into a [`Table`] with one synthesized label per retained column.

use log::debug;

use crate::data::Value;
use crate::table::Table;

/// 1-based sheet row holding the primary header labels.
pub const HEADER_ROW_TOP: usize = 7;
/// 1-based sheet row holding the secondary header labels.
pub const HEADER_ROW_BOTTOM: usize = 8;
/// 1-based sheet row of the first data record.
pub const DATA_START_ROW: usize = 9;
/// Columns beyond A..Z are ignored.
pub const MAX_COLUMNS: usize = 26;

/// 1-based columns whose label combines their own row-8 value with the
/// row-7 value of column 2 (B, C and D in the export layout).
const MERGED_LABEL_COLUMNS: [usize; 3] = [2, 3, 4];

/// Untyped cells exactly as read from the first worksheet, anchored at A1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Value>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        RawGrid { rows }
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row; sparse grids may have ragged rows.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn label_at(&self, row: usize, column: usize) -> String {
        self.rows
            .get(row - 1)
            .and_then(|cells| cells.get(column))
            .map(|cell| cell.as_display().trim().to_string())
            .unwrap_or_default()
    }
}

/// Derives one label per retained column from header rows 7 and 8.
pub fn synthesize_headers(grid: &RawGrid) -> Vec<String> {
    let column_count = grid.width().min(MAX_COLUMNS);
    let anchor = grid.label_at(HEADER_ROW_TOP, 1);
    (0..column_count)
        .map(|idx| {
            let label = if MERGED_LABEL_COLUMNS.contains(&(idx + 1)) {
                let bottom = grid.label_at(HEADER_ROW_BOTTOM, idx);
                format!("{bottom} {anchor}").trim().to_string()
            } else {
                grid.label_at(HEADER_ROW_TOP, idx)
            };
            if label.is_empty() {
                format!("Column_{}", idx + 1)
            } else {
                label
            }
        })
        .collect()
}

/// Builds the typed table: synthesized headers over rows 9.. of the grid.
pub fn build_table(grid: &RawGrid) -> Table {
    let headers = synthesize_headers(grid);
    let width = headers.len();
    let rows = grid
        .rows()
        .iter()
        .skip(DATA_START_ROW - 1)
        .map(|row| row.iter().take(width).cloned().collect())
        .collect::<Vec<Vec<Value>>>();
    debug!(
        "Synthesized {} header(s) over {} data row(s)",
        headers.len(),
        rows.len()
    );
    Table::new(headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<Value> {
        cells.iter().map(|c| Value::from(*c)).collect()
    }

    #[test]
    fn merged_columns_use_column_b_anchor() {
        let mut rows = vec![Vec::new(); 6];
        rows.push(text_row(&["A7", "B7", "C7", "D7", "E7", "F7"]));
        rows.push(text_row(&["A8", "B8", "C8", "D8", "E8", "F8"]));
        let headers = synthesize_headers(&RawGrid::new(rows));
        assert_eq!(headers, vec!["A7", "B8 B7", "C8 B7", "D8 B7", "E7", "F7"]);
    }

    #[test]
    fn short_grids_are_padded_before_lookup() {
        let grid = RawGrid::new(vec![text_row(&["title", "", ""])]);
        let table = build_table(&grid);
        assert_eq!(table.headers(), ["Column_1", "Column_2", "Column_3"]);
        assert!(table.is_empty());
    }

    #[test]
    fn width_is_capped_at_column_z() {
        let wide: Vec<&str> = vec!["h"; 30];
        let mut rows = vec![Vec::new(); 6];
        rows.push(text_row(&wide));
        rows.push(text_row(&wide));
        rows.push(text_row(&wide));
        let table = build_table(&RawGrid::new(rows));
        assert_eq!(table.headers().len(), MAX_COLUMNS);
        assert_eq!(table.rows()[0].len(), MAX_COLUMNS);
    }

    #[test]
    fn merged_label_trims_when_parts_missing() {
        let mut rows = vec![Vec::new(); 6];
        rows.push(text_row(&["", "Số", ""]));
        rows.push(text_row(&["", "", "Ngày"]));
        let headers = synthesize_headers(&RawGrid::new(rows));
        assert_eq!(headers, vec!["Column_1", "Số", "Ngày Số"]);
    }
}
