#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Row 7 of the sample accounting export. Column B anchors the merged
/// labels of columns B to D.
pub const SAMPLE_HEADER_TOP: [&str; 11] = [
    "Ký hiệu",
    "Chứng từ",
    "",
    "",
    "Mẫu số",
    "Diễn giải",
    "Đối tượng",
    "Doanh thu",
    "Tiền thuế",
    "ExchangeRate",
    "TaxCode",
];

pub const SAMPLE_HEADER_BOTTOM: [&str; 11] = ["", "Số", "Ngày", "Loại", "", "", "", "", "", "", ""];

pub const SAMPLE_ROWS: [[&str; 11]; 3] = [
    [
        "AA/24E",
        "HD001",
        "05/01/2024",
        "Bán",
        "01GTKT",
        "Bán hàng tháng 1",
        "KH01",
        "1000000",
        "100000",
        "1",
        "R10",
    ],
    [
        "AA/24E",
        "HD002",
        "06/01/2024",
        "Bán",
        "01GTKT",
        "TAA điều chỉnh",
        "KH02",
        "500",
        "50",
        "1",
        "R10",
    ],
    [
        "AB/24E",
        "HD003",
        "07/01/2024",
        "Bán",
        "01GTKT",
        "Export",
        "KH03",
        "200",
        "0",
        "24000",
        "R00",
    ],
];

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a workbook laid out like the accounting export: a title in A1,
    /// header rows at 7 and 8, data from row 9. Cells that parse as numbers
    /// are stored as numbers.
    pub fn write_workbook<R: AsRef<[&'static str]>>(
        &self,
        name: &str,
        header_top: &[&str],
        header_bottom: &[&str],
        rows: &[R],
    ) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet
            .write_string(0, 0, "BẢNG KÊ HÓA ĐƠN BÁN RA")
            .expect("write title");
        write_row(sheet, 6, header_top);
        write_row(sheet, 7, header_bottom);
        for (idx, row) in rows.iter().enumerate() {
            write_row(sheet, 8 + idx as u32, row.as_ref());
        }
        workbook.save(&path).expect("save workbook");
        path
    }

    /// The three-row sample export used across the CLI tests.
    pub fn sample_export(&self) -> PathBuf {
        self.write_workbook(
            "export.xlsx",
            &SAMPLE_HEADER_TOP,
            &SAMPLE_HEADER_BOTTOM,
            &SAMPLE_ROWS,
        )
    }
}

fn write_row(sheet: &mut rust_xlsxwriter::Worksheet, row: u32, cells: &[&str]) {
    for (col, cell) in cells.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        match cell.parse::<f64>() {
            Ok(number) => sheet.write_number(row, col as u16, number),
            Err(_) => sheet.write_string(row, col as u16, *cell),
        }
        .expect("write cell");
    }
}
