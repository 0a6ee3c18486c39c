//! Named mapping presets persisted as a single JSON document.
//!
//! # Storage format
//!
//! ```json
//! {
//!   "monthly": [
//!     {"out_name": "NGAY", "mode": "fixed", "input_col": "", "fixed_value": "last_day_of_last_month", "formula": ""},
//!     ...
//!   ]
//! }
//! ```
//!
//! Reads never fail: a missing or blank file is an empty store, and a
//! malformed one is reset to `{}`. Writes go to a sibling `.tmp` file that is
//! renamed over the store, so readers never see a half-written document.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PresetError;
use crate::mapping::{ColumnMapping, MappingMode, MappingProfile};

/// Store location relative to the working directory.
pub const DEFAULT_PRESET_FILE: &str = "mapping_presets.json";

pub type PresetMap = BTreeMap<String, MappingProfile>;

/// A mapping record as found on disk; older saves may omit any field or
/// store `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMapping {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub out_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mode: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub input_col: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fixed_value: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formula: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub type StoredPresets = BTreeMap<String, Vec<StoredMapping>>;

/// Fills absent fields so every preset has the full record shape.
///
/// Missing or unrecognised modes fall back to `select input`.
pub fn normalize(stored: StoredPresets) -> PresetMap {
    stored
        .into_iter()
        .map(|(name, records)| {
            let mappings = records
                .into_iter()
                .map(|record| {
                    let mode = MappingMode::from_name(&record.mode).unwrap_or_else(|| {
                        if !record.mode.is_empty() {
                            warn!(
                                "Preset '{name}' column '{}' has unknown mode '{}'; using 'select input'",
                                record.out_name, record.mode
                            );
                        }
                        MappingMode::SelectInput
                    });
                    ColumnMapping {
                        out_name: record.out_name,
                        mode,
                        input_col: record.input_col,
                        fixed_value: record.fixed_value,
                        formula: record.formula,
                    }
                })
                .collect();
            (name, MappingProfile::new(mappings))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
}

impl Default for PresetStore {
    fn default() -> Self {
        PresetStore::new(DEFAULT_PRESET_FILE)
    }
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PresetStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    /// Loads every preset, recovering from absent or corrupt stores.
    pub fn load(&self) -> PresetMap {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return PresetMap::new(),
            Err(err) => {
                warn!("Cannot read preset store {:?}: {err}", self.path);
                return PresetMap::new();
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return PresetMap::new();
        }
        // Invalid UTF-8 surfaces here as a JSON error and takes the reset path.
        match serde_json::from_slice::<StoredPresets>(&bytes) {
            Ok(stored) => normalize(stored),
            Err(err) => {
                warn!(
                    "Preset store {:?} is malformed ({err}); resetting it to an empty store",
                    self.path
                );
                if let Err(reset_err) = self.save(&PresetMap::new()) {
                    warn!("Failed to reset preset store: {reset_err}");
                }
                PresetMap::new()
            }
        }
    }

    /// Writes the full preset map through a temp file and an atomic rename.
    pub fn save(&self, presets: &PresetMap) -> Result<(), PresetError> {
        let json = serde_json::to_string_pretty(presets)?;
        let temp_path = self.temp_path();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PresetError::Io {
                operation: "create directory for",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut file = File::create(&temp_path).map_err(|source| PresetError::Io {
            operation: "create",
            path: temp_path.clone(),
            source,
        })?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|source| PresetError::Io {
                operation: "write",
                path: temp_path.clone(),
                source,
            })?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|source| PresetError::AtomicWriteFailed {
            temp_path: temp_path.clone(),
            target_path: self.path.clone(),
            source,
        })?;
        info!("Saved {} preset(s) to {:?}", presets.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalize_fills_missing_fields() {
        let stored: StoredPresets =
            serde_json::from_str(r#"{"A": [{"out_name": "X", "input_col": null}]}"#).unwrap();
        let presets = normalize(stored);
        let mapping = &presets["A"].mappings()[0];
        assert_eq!(mapping.out_name, "X");
        assert_eq!(mapping.mode, MappingMode::SelectInput);
        assert_eq!(mapping.input_col, "");
        assert_eq!(mapping.formula, "");
    }

    #[test]
    fn normalize_keeps_known_modes() {
        let stored: StoredPresets = serde_json::from_str(
            r#"{"test": [{"out_name": "A", "mode": "fixed", "input_col": "X", "fixed_value": "1", "formula": ""}]}"#,
        )
        .unwrap();
        let mapping = normalize(stored)["test"].mappings()[0].clone();
        assert_eq!(mapping.mode, MappingMode::Fixed);
        assert_eq!(mapping.fixed_value, "1");
        assert_eq!(mapping.input_col, "X");
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let store = PresetStore::new(dir.path().join("presets.json"));
        let mut presets = PresetMap::new();
        presets.insert("p".into(), MappingProfile::blank());
        store.save(&presets).unwrap();
        assert!(store.path().exists());
        assert!(!dir.path().join("presets.tmp").exists());
    }

    #[test]
    fn save_reports_unwritable_location() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let store = PresetStore::new(blocker.join("presets.json"));
        assert!(store.save(&PresetMap::new()).is_err());
    }
}
