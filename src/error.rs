//! Error types shared by the import, filter, mapping and preset layers.
//!
//! Data-level oddities (unparsable literals, missing input columns, unknown
//! formula tokens) are not errors; they resolve to well-defined cell values.
//! The variants here cover configuration mistakes and I/O failures only.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemapError {
    /// The input file extension is not one of the recognised spreadsheet kinds.
    #[error("Unsupported file type for {path:?} (expected .xlsx or .xls)")]
    UnsupportedFormat { path: PathBuf },

    /// A filter references a column that is not part of the current header.
    #[error("Column '{column}' not found for filter")]
    UnknownColumn { column: String },

    #[error("Failed to read workbook {path:?}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Preset '{name}' not found")]
    UnknownPreset { name: String },

    /// A mapping profile does not line up with the target schema.
    #[error("Mapping profile entry {position} is '{found}' but the target schema expects '{expected}'")]
    ProfileMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Failed to write spreadsheet: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

/// Preset store failures. Only writes surface these; reads recover locally.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Failed to {operation} preset store {path:?}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize mapping presets")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to move {temp_path:?} into place at {target_path:?}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
