use std::borrow::Cow;

use itertools::Itertools;

use crate::{data::Value, mapping::is_accounting_column};

/// Ordered rows under a fixed header. Every row carries exactly one cell per
/// header entry; filtering and projection build new tables instead of
/// mutating this one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table, padding short rows with empty cells and truncating
    /// long ones to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Empty);
                row
            })
            .collect();
        Table { headers, rows }
    }

    pub fn empty(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    /// Assembles a table from equally long columns.
    pub fn from_columns(headers: Vec<String>, columns: Vec<Vec<Value>>, row_count: usize) -> Self {
        let mut rows = vec![Vec::with_capacity(headers.len()); row_count];
        for column in columns {
            for (row, cell) in rows.iter_mut().zip(column) {
                row.push(cell);
            }
        }
        Table::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First header position with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn column_at(&self, index: usize) -> Vec<&Value> {
        self.rows.iter().map(|row| &row[index]).collect()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        self.column_index(name).map(|idx| self.column_at(idx))
    }

    /// Keeps the rows whose mask entry is `true`, preserving order.
    pub fn select_rows(&self, mask: &[bool]) -> Table {
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Table {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Display strings for the first `limit` rows (all rows when `None`).
    pub fn display_rows(&self, limit: Option<usize>) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| row.iter().map(Value::as_display).collect())
            .collect()
    }
}

/// Aligned plain-text rendering for the terminal.
///
/// Accounting output columns show grouped two-decimal amounts; every other
/// cell shows its display string. Columns are at least three characters wide.
impl Table {
    /// Preview strings for the first `limit` rows (all rows when `None`).
    pub fn preview_rows(&self, limit: Option<usize>) -> Vec<Vec<String>> {
        let accounting = self
            .headers
            .iter()
            .map(|h| is_accounting_column(h))
            .collect::<Vec<_>>();
        self.rows
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| {
                row.iter()
                    .zip(&accounting)
                    .map(|(cell, is_accounting)| match cell {
                        Value::Number(n) if *is_accounting => format_accounting(*n),
                        _ => cell.as_display(),
                    })
                    .collect()
            })
            .collect()
    }

    pub fn render(&self, limit: Option<usize>) -> String {
        let rows = self.preview_rows(limit);
        let widths = (0..self.headers.len())
            .map(|idx| {
                rows.iter()
                    .filter_map(|row| row.get(idx))
                    .chain(std::iter::once(&self.headers[idx]))
                    .map(|cell| display_width(&sanitize_cell(cell)))
                    .max()
                    .unwrap_or_default()
                    .max(MIN_COLUMN_WIDTH)
            })
            .collect::<Vec<_>>();
        let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();

        std::iter::once(self.headers.as_slice())
            .chain(std::iter::once(rule.as_slice()))
            .chain(rows.iter().map(Vec::as_slice))
            .map(|cells| aligned_line(cells, &widths) + "\n")
            .collect()
    }

    pub fn print(&self, limit: Option<usize>) {
        print!("{}", self.render(limit));
    }
}

const MIN_COLUMN_WIDTH: usize = 3;

/// Two decimals with comma thousands separators, e.g. `1,234,567.50`.
pub fn format_accounting(value: f64) -> String {
    let rendered = format!("{:.2}", value.abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && rendered.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

fn aligned_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = sanitize_cell(cell);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .join("  ")
        .trim_end()
        .to_string()
}

// Counts characters, skipping combining marks so Vietnamese diacritics
// typed in decomposed form do not widen the column.
fn display_width(value: &str) -> usize {
    value
        .chars()
        .filter(|ch| !('\u{0300}'..='\u{036f}').contains(ch))
        .count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["A".into(), "B".into()],
            vec![
                vec![Value::from("x"), Value::Number(1.0)],
                vec![Value::from("y")],
                vec![Value::from("z"), Value::Number(3.0), Value::from("extra")],
            ],
        )
    }

    #[test]
    fn rows_are_normalized_to_header_width() {
        let table = sample();
        assert!(table.rows().iter().all(|row| row.len() == 2));
        assert_eq!(table.rows()[1][1], Value::Empty);
    }

    #[test]
    fn select_rows_preserves_order() {
        let table = sample();
        let picked = table.select_rows(&[true, false, true]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.rows()[1][0], Value::from("z"));
        assert_eq!(picked.headers(), table.headers());
    }

    #[test]
    fn from_columns_transposes() {
        let table = Table::from_columns(
            vec!["A".into(), "B".into()],
            vec![
                vec![Value::Number(1.0), Value::Number(2.0)],
                vec![Value::from("a"), Value::from("b")],
            ],
            2,
        );
        assert_eq!(table.rows()[1], vec![Value::Number(2.0), Value::from("b")]);
    }

    #[test]
    fn render_pads_columns_and_trims_trailing_space() {
        let table = Table::new(
            vec!["Name".into(), "Qty".into()],
            vec![vec![Value::from("Tiền thuế"), Value::Number(1.0)]],
        );
        let rendered = table.render(None);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Name       Qty");
        assert_eq!(lines[1], "---------  ---");
        assert_eq!(lines[2], "Tiền thuế  1");
    }

    #[test]
    fn render_formats_accounting_columns_only() {
        let table = Table::new(
            vec!["SOHD".into(), "TONGTIEN".into(), "SL".into()],
            vec![
                vec![Value::from("HD001"), Value::Number(1234.5), Value::Number(1234.5)],
                vec![Value::from("HD002"), Value::Empty, Value::from("x\ty")],
            ],
        );
        let rendered = table.render(Some(1));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "SOHD   TONGTIEN  SL");
        assert_eq!(lines[2], "HD001  1,234.50  1234.5");

        let all = table.preview_rows(None);
        assert_eq!(all[1], vec!["HD002", "", "x\ty"]);
        assert!(table.render(None).lines().last().unwrap().ends_with("x y"));
    }

    #[test]
    fn accounting_format_groups_thousands() {
        assert_eq!(format_accounting(1234567.5), "1,234,567.50");
        assert_eq!(format_accounting(0.0), "0.00");
        assert_eq!(format_accounting(999.999), "1,000.00");
        assert_eq!(format_accounting(-1500.0), "-1,500.00");
        assert_eq!(format_accounting(-0.001), "0.00");
    }
}
