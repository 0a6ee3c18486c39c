//! Writing the projected output table to disk.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::{
    data::Value, error::RemapError, io_utils, mapping::is_accounting_column, table::Table,
};

pub const SHEET_NAME: &str = "DATA";
pub const ACCOUNTING_NUMBER_FORMAT: &str = "#,##0.00";
pub const DATE_NUMBER_FORMAT: &str = "yyyy-mm-dd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Xlsx,
    Csv,
}

impl OutputKind {
    /// `.csv` files and `-` (stdout) are CSV; everything else is a workbook.
    pub fn from_path(path: &Path) -> Self {
        if io_utils::is_dash(path) {
            return OutputKind::Csv;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputKind::Csv,
            _ => OutputKind::Xlsx,
        }
    }
}

/// Saves `output` as a single-sheet workbook named `DATA`.
pub fn write_xlsx(output: &Table, path: &Path) -> Result<(), RemapError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    write_to_worksheet(output, worksheet)?;
    workbook.save(path)?;
    info!(
        "Wrote {} row(s) across {} column(s) to {:?}",
        output.len(),
        output.headers().len(),
        path
    );
    Ok(())
}

fn write_to_worksheet(output: &Table, worksheet: &mut Worksheet) -> Result<(), RemapError> {
    let accounting_format = Format::new().set_num_format(ACCOUNTING_NUMBER_FORMAT);
    let date_format = Format::new().set_num_format(DATE_NUMBER_FORMAT);
    let accounting = output
        .headers()
        .iter()
        .map(|h| is_accounting_column(h))
        .collect::<Vec<_>>();

    for (col, header) in output.headers().iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }

    for (row_idx, row) in output.rows().iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col as u16;
            match cell {
                Value::Empty => {}
                Value::Number(n) if accounting[col] => {
                    worksheet.write_number_with_format(row_num, col_num, *n, &accounting_format)?;
                }
                Value::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                Value::Boolean(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                Value::DateTime(dt) => {
                    worksheet.write_datetime_with_format(row_num, col_num, dt, &date_format)?;
                }
                Value::Text(text) => {
                    worksheet.write_string(row_num, col_num, text)?;
                }
            }
        }
    }
    Ok(())
}

/// Writes the header and display strings as CSV in the requested encoding.
pub fn write_csv(output: &Table, path: &Path, encoding: &'static Encoding) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path), encoding)?;
    writer
        .write_record(output.headers())
        .context("Writing CSV header")?;
    for (idx, row) in output.display_rows(None).iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Writing output row {}", idx + 1))?;
    }
    writer.flush().context("Flushing CSV output")?;
    info!(
        "Wrote {} row(s) as CSV ({}) to {:?}",
        output.len(),
        encoding.name(),
        path
    );
    Ok(())
}
