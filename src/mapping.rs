//! Target schema and column mapping profiles.
//!
//! Every export has the same 23 output columns. A [`MappingProfile`] assigns
//! one [`ColumnMapping`] to each of them, in schema order.

use serde::{Deserialize, Serialize};

use crate::error::RemapError;

/// Output columns, in export order.
pub const TARGET_SCHEMA: [&str; 23] = [
    "NGAY",
    "SOHD",
    "SERI",
    "MẪU SỐ",
    "DIENGIAI",
    "BOPHAN",
    "MA NHAP XUAT",
    "TK NO",
    "MADV",
    "TK CO",
    "DVT",
    "SOLUONG",
    "DONGIA",
    "MALOAIVAT",
    "TK CO VAT",
    "MAKH",
    "THANHTIEN",
    "THUEVAT",
    "TONGTIEN",
    "LOẠI TIỀN",
    "THANHTIEN NT",
    "THUEVAT NT",
    "TỶ GIÁ",
];

/// Output columns coerced to numbers and shown as `#,##0.00`.
pub const ACCOUNTING_COLUMNS: [&str; 4] = ["THANHTIEN", "THUEVAT", "TONGTIEN", "TỶ GIÁ"];

pub fn is_accounting_column(name: &str) -> bool {
    ACCOUNTING_COLUMNS.contains(&name)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingMode {
    /// Copy an input column.
    #[default]
    #[serde(rename = "select input")]
    SelectInput,
    /// Repeat a literal (or the previous-month-end token).
    #[serde(rename = "fixed")]
    Fixed,
    /// Sum formula over columns and constants.
    #[serde(rename = "calculate")]
    Calculate,
    /// `VND` when the exchange rate is exactly 1, `USD` otherwise.
    #[serde(rename = "currency_rule")]
    CurrencyRule,
}

impl MappingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MappingMode::SelectInput => "select input",
            MappingMode::Fixed => "fixed",
            MappingMode::Calculate => "calculate",
            MappingMode::CurrencyRule => "currency_rule",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            MappingMode::SelectInput,
            MappingMode::Fixed,
            MappingMode::Calculate,
            MappingMode::CurrencyRule,
        ]
        .into_iter()
        .find(|mode| mode.as_str() == name.trim())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub out_name: String,
    pub mode: MappingMode,
    #[serde(default)]
    pub input_col: String,
    #[serde(default)]
    pub fixed_value: String,
    #[serde(default)]
    pub formula: String,
}

impl ColumnMapping {
    pub fn select_input(out_name: &str, input_col: &str) -> Self {
        ColumnMapping {
            out_name: out_name.to_string(),
            mode: MappingMode::SelectInput,
            input_col: input_col.to_string(),
            ..Default::default()
        }
    }

    pub fn fixed(out_name: &str, fixed_value: &str) -> Self {
        ColumnMapping {
            out_name: out_name.to_string(),
            mode: MappingMode::Fixed,
            fixed_value: fixed_value.to_string(),
            ..Default::default()
        }
    }

    pub fn calculate(out_name: &str, formula: &str) -> Self {
        ColumnMapping {
            out_name: out_name.to_string(),
            mode: MappingMode::Calculate,
            formula: formula.to_string(),
            ..Default::default()
        }
    }

    pub fn currency_rule(out_name: &str) -> Self {
        ColumnMapping {
            out_name: out_name.to_string(),
            mode: MappingMode::CurrencyRule,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingProfile {
    mappings: Vec<ColumnMapping>,
}

impl MappingProfile {
    pub fn new(mappings: Vec<ColumnMapping>) -> Self {
        MappingProfile { mappings }
    }

    /// The built-in wiring from the accounting export to the target schema.
    pub fn default_profile() -> Self {
        MappingProfile::new(vec![
            ColumnMapping::fixed("NGAY", "last_day_of_last_month"),
            ColumnMapping::select_input("SOHD", "Số Chứng từ"),
            ColumnMapping::select_input("SERI", "Ký hiệu"),
            ColumnMapping::select_input("MẪU SỐ", "Mẫu số"),
            ColumnMapping::select_input("DIENGIAI", "Diễn giải"),
            ColumnMapping::select_input("BOPHAN", "DeptCode"),
            ColumnMapping::select_input("MA NHAP XUAT", "TransCode"),
            ColumnMapping::fixed("TK NO", "1310"),
            ColumnMapping::select_input("MADV", "Vật tư"),
            ColumnMapping::select_input("TK CO", "CreditAccount2"),
            ColumnMapping::fixed("DVT", "-"),
            ColumnMapping::fixed("SOLUONG", "-"),
            ColumnMapping::fixed("DONGIA", "-"),
            ColumnMapping::select_input("MALOAIVAT", "TaxCode"),
            ColumnMapping::select_input("TK CO VAT", "CreditAccount3"),
            ColumnMapping::select_input("MAKH", "Đối tượng"),
            ColumnMapping::select_input("THANHTIEN", "Doanh thu"),
            ColumnMapping::select_input("THUEVAT", "Tiền thuế"),
            ColumnMapping::calculate("TONGTIEN", "Doanh thu + Tiền thuế"),
            ColumnMapping::currency_rule("LOẠI TIỀN"),
            ColumnMapping::select_input("THANHTIEN NT", "Doanh thu NT"),
            ColumnMapping::select_input("THUEVAT NT", "Tiền thuế NT"),
            ColumnMapping::select_input("TỶ GIÁ", "ExchangeRate"),
        ])
    }

    /// Every target column in `select input` mode with nothing selected.
    pub fn blank() -> Self {
        MappingProfile::new(
            TARGET_SCHEMA
                .iter()
                .map(|name| ColumnMapping::select_input(name, ""))
                .collect(),
        )
    }

    /// The default profile with input columns absent from `headers` cleared,
    /// ready for manual editing against the imported file.
    pub fn hydrated(headers: &[String]) -> Self {
        let mut profile = MappingProfile::default_profile();
        for mapping in &mut profile.mappings {
            if !headers.iter().any(|h| *h == mapping.input_col) {
                mapping.input_col.clear();
            }
        }
        profile
    }

    pub fn mappings(&self) -> &[ColumnMapping] {
        &self.mappings
    }

    pub fn get_mut(&mut self, out_name: &str) -> Option<&mut ColumnMapping> {
        self.mappings.iter_mut().find(|m| m.out_name == out_name)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Checks one mapping per target column, in schema order.
    pub fn validate(&self) -> Result<(), RemapError> {
        for (position, expected) in TARGET_SCHEMA.iter().enumerate() {
            let found = self
                .mappings
                .get(position)
                .map(|m| m.out_name.as_str())
                .unwrap_or("<missing>");
            if found != *expected {
                return Err(RemapError::ProfileMismatch {
                    position: position + 1,
                    expected: (*expected).to_string(),
                    found: found.to_string(),
                });
            }
        }
        if let Some(extra) = self.mappings.get(TARGET_SCHEMA.len()) {
            return Err(RemapError::ProfileMismatch {
                position: TARGET_SCHEMA.len() + 1,
                expected: "<end of schema>".to_string(),
                found: extra.out_name.clone(),
            });
        }
        Ok(())
    }
}
