//! Application state for one working session: the imported table, its
//! filters, the mapping being edited, and the preset cache.
//!
//! The pipeline modules are pure functions; `Session` is the only place that
//! remembers anything between operations, and it is owned by the caller.

use std::{fs, path::Path};

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::{
    error::RemapError,
    filter::{ComparisonOperator, DEFAULT_FILTER_ID, Filter, apply_filters},
    grid::build_table,
    mapping::MappingProfile,
    presets::{PresetMap, PresetStore},
    project::project,
    table::Table,
    workbook::read_grid,
};

/// Literal excluded by the filter created on import.
pub const DEFAULT_FILTER_LITERAL: &str = "TAA";
/// 0-based position of the column the import filter targets.
pub const DEFAULT_FILTER_COLUMN: usize = 5;

#[derive(Debug)]
pub struct Session {
    table: Option<Table>,
    source_key: Option<String>,
    filters: Vec<Filter>,
    default_profile: MappingProfile,
    manual_profile: MappingProfile,
    use_default_mapping: bool,
    manual_mapping_initialized: bool,
    store: PresetStore,
    presets: PresetMap,
    selected_preset: Option<String>,
    warnings: Vec<String>,
}

impl Session {
    /// Starts an empty session backed by `store`, loading its presets.
    pub fn new(store: PresetStore) -> Self {
        let presets = store.load();
        debug!("Loaded {} preset(s) from {:?}", presets.len(), store.path());
        Session {
            table: None,
            source_key: None,
            filters: Vec::new(),
            default_profile: MappingProfile::default_profile(),
            manual_profile: MappingProfile::blank(),
            use_default_mapping: true,
            manual_mapping_initialized: false,
            store,
            presets,
            selected_preset: None,
            warnings: Vec::new(),
        }
    }

    /// Reads `path` and imports it, keyed by path and file size.
    pub fn import_workbook(&mut self, path: &Path) -> Result<(), RemapError> {
        let grid = read_grid(path)?;
        let key = match fs::metadata(path) {
            Ok(meta) => format!("{}:{}", path.display(), meta.len()),
            Err(_) => path.display().to_string(),
        };
        self.import(&key, build_table(&grid));
        Ok(())
    }

    /// Installs a new table. When `source_key` differs from the previous
    /// import the filters reset and the manual mapping is re-seeded from the
    /// new headers; the mapping toggle and the selected preset carry over.
    pub fn import(&mut self, source_key: &str, table: Table) {
        if self.source_key.as_deref() != Some(source_key) {
            debug!("New source '{source_key}'; resetting filters and manual mapping");
            self.filters = default_filters(&table);
            self.manual_mapping_initialized = false;
            if !self.use_default_mapping {
                self.manual_profile = MappingProfile::hydrated(table.headers());
                self.manual_mapping_initialized = true;
            }
            self.source_key = Some(source_key.to_string());
        }
        info!(
            "Imported {} row(s) with {} column(s)",
            table.len(),
            table.headers().len()
        );
        self.table = Some(table);
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn headers(&self) -> &[String] {
        self.table.as_ref().map(Table::headers).unwrap_or(&[])
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Appends a blank filter on the first column and returns its id.
    pub fn add_filter(&mut self) -> Option<String> {
        let column = self.headers().first()?.clone();
        let filter = Filter::new(column);
        let id = filter.id.clone();
        self.filters.push(filter);
        Some(id)
    }

    pub fn push_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn filter_mut(&mut self, id: &str) -> Option<&mut Filter> {
        self.filters.iter_mut().find(|f| f.id == id)
    }

    pub fn remove_filter(&mut self, id: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.id != id);
        before != self.filters.len()
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn use_default_mapping(&self) -> bool {
        self.use_default_mapping
    }

    /// The first switch to manual mapping seeds it from the default profile.
    pub fn set_use_default_mapping(&mut self, use_default: bool) {
        if !use_default && !self.manual_mapping_initialized {
            self.manual_profile = MappingProfile::hydrated(self.headers());
            self.manual_mapping_initialized = true;
        }
        self.use_default_mapping = use_default;
    }

    pub fn manual_profile_mut(&mut self) -> &mut MappingProfile {
        &mut self.manual_profile
    }

    pub fn active_profile(&self) -> &MappingProfile {
        if self.use_default_mapping {
            &self.default_profile
        } else {
            &self.manual_profile
        }
    }

    pub fn presets(&self) -> &PresetMap {
        &self.presets
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    pub fn selected_preset(&self) -> Option<&str> {
        self.selected_preset.as_deref()
    }

    /// Makes the named preset the manual profile and switches to it.
    pub fn load_preset(&mut self, name: &str) -> Result<(), RemapError> {
        let profile = self
            .presets
            .get(name)
            .ok_or_else(|| RemapError::UnknownPreset {
                name: name.to_string(),
            })?;
        profile.validate()?;
        self.manual_profile = profile.clone();
        self.manual_mapping_initialized = true;
        self.use_default_mapping = false;
        self.selected_preset = Some(name.to_string());
        info!("Loaded preset '{name}'");
        Ok(())
    }

    /// Stores `profile` under `name`. The cache is updated even when writing
    /// the store fails; that failure is queued as a warning.
    pub fn save_preset(&mut self, name: &str, profile: MappingProfile) -> bool {
        self.presets.insert(name.to_string(), profile);
        self.selected_preset = Some(name.to_string());
        self.persist()
    }

    /// Saves the profile currently in effect under `name`.
    pub fn save_active_preset(&mut self, name: &str) -> bool {
        let profile = self.active_profile().clone();
        self.save_preset(name, profile)
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<bool, RemapError> {
        if self.presets.remove(name).is_none() {
            return Err(RemapError::UnknownPreset {
                name: name.to_string(),
            });
        }
        if self.selected_preset.as_deref() == Some(name) {
            self.selected_preset = None;
        }
        Ok(self.persist())
    }

    fn persist(&mut self) -> bool {
        match self.store.save(&self.presets) {
            Ok(()) => true,
            Err(err) => {
                warn!("Presets kept in memory only: {err}");
                self.warnings
                    .push(format!("Could not save presets to {:?}: {err}", self.store.path()));
                false
            }
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// The imported rows that pass every filter.
    pub fn filtered_table(&self) -> Result<Table, RemapError> {
        match &self.table {
            Some(table) => apply_filters(table, &self.filters),
            None => Ok(Table::empty(Vec::new())),
        }
    }

    /// The filtered rows projected through the active profile.
    pub fn output_table(&self, today: NaiveDate) -> Result<Table, RemapError> {
        let filtered = self.filtered_table()?;
        Ok(project(&filtered, self.active_profile(), today))
    }
}

fn default_filters(table: &Table) -> Vec<Filter> {
    match table.headers().get(DEFAULT_FILTER_COLUMN) {
        Some(column) => vec![Filter {
            id: DEFAULT_FILTER_ID.to_string(),
            column: column.clone(),
            operator: ComparisonOperator::NotContains,
            value: DEFAULT_FILTER_LITERAL.to_string(),
        }],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use tempfile::tempdir;

    fn six_column_table() -> Table {
        let headers = ["A", "B", "C", "D", "E", "Diễn giải"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row = |note: &str| {
            let mut cells = vec![Value::Empty; 5];
            cells.push(Value::from(note));
            cells
        };
        Table::new(headers, vec![row("Bán hàng"), row("TAA nội bộ"), row("taa")])
    }

    #[test]
    fn import_installs_default_filter_on_sixth_column() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.import("a.xlsx:10", six_column_table());
        assert_eq!(session.filters().len(), 1);
        assert_eq!(session.filters()[0].id, DEFAULT_FILTER_ID);
        assert_eq!(session.filters()[0].column, "Diễn giải");
        assert_eq!(session.filtered_table().unwrap().len(), 1);
    }

    #[test]
    fn narrow_tables_get_no_default_filter() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.import("k", Table::new(vec!["A".into()], vec![vec![Value::from("x")]]));
        assert!(session.filters().is_empty());
    }

    #[test]
    fn reimporting_same_source_keeps_edits() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.import("k", six_column_table());
        session.clear_filters();
        session.import("k", six_column_table());
        assert!(session.filters().is_empty());
        session.import("other", six_column_table());
        assert_eq!(session.filters().len(), 1);
    }

    #[test]
    fn filter_edits_by_id() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.import("k", six_column_table());
        let id = session.add_filter().unwrap();
        assert_eq!(session.filters()[1].column, "A");
        session.filter_mut(&id).unwrap().column = "B".into();
        assert_eq!(session.filters()[1].column, "B");
        assert!(session.remove_filter(&id));
        assert!(!session.remove_filter(&id));
    }

    #[test]
    fn add_filter_requires_a_table() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        assert!(session.add_filter().is_none());
    }

    #[test]
    fn first_manual_switch_hydrates_from_default() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.import("k", six_column_table());
        session.set_use_default_mapping(false);
        let profile = session.active_profile();
        assert_eq!(profile.mappings()[0].fixed_value, "last_day_of_last_month");
        assert_eq!(profile.mappings()[1].input_col, "");

        session.manual_profile_mut().get_mut("SOHD").unwrap().input_col = "A".into();
        session.set_use_default_mapping(true);
        session.set_use_default_mapping(false);
        assert_eq!(session.active_profile().mappings()[1].input_col, "A");
    }

    #[test]
    fn new_source_rehydrates_manual_mapping() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.import("a.xlsx:10", six_column_table());
        assert!(session.save_active_preset("monthly"));
        session.set_use_default_mapping(false);
        assert_eq!(session.active_profile().mappings()[1].input_col, "");
        session.manual_profile_mut().get_mut("SOHD").unwrap().input_col = "A".into();

        let headers = vec!["Số Chứng từ".to_string(), "Diễn giải".to_string()];
        let next = Table::new(headers, vec![vec![Value::from("HD9"), Value::from("x")]]);
        session.import("b.xlsx:20", next);
        assert!(!session.use_default_mapping());
        assert_eq!(session.selected_preset(), Some("monthly"));
        assert_eq!(
            session.active_profile().mappings()[1].input_col,
            "Số Chứng từ"
        );
        assert!(session.filters().is_empty());
    }

    #[test]
    fn new_source_in_default_mode_keeps_default_mapping() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.import("a.xlsx:10", six_column_table());
        session.set_use_default_mapping(false);
        session.manual_profile_mut().get_mut("SOHD").unwrap().input_col = "A".into();
        session.set_use_default_mapping(true);

        session.import("b.xlsx:20", six_column_table());
        assert!(session.use_default_mapping());
        session.set_use_default_mapping(false);
        assert_eq!(session.active_profile().mappings()[1].input_col, "");
    }

    #[test]
    fn presets_survive_a_new_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.json");
        let mut session = Session::new(PresetStore::new(&path));
        assert!(session.save_active_preset("monthly"));

        let mut reopened = Session::new(PresetStore::new(&path));
        reopened.load_preset("monthly").unwrap();
        assert!(!reopened.use_default_mapping());
        assert_eq!(reopened.active_profile(), &MappingProfile::default_profile());
        assert_eq!(reopened.selected_preset(), Some("monthly"));

        assert!(reopened.delete_preset("monthly").unwrap());
        assert!(reopened.delete_preset("monthly").is_err());
        assert!(Session::new(PresetStore::new(&path)).presets().is_empty());
    }

    #[test]
    fn invalid_presets_are_not_loaded() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(PresetStore::new(dir.path().join("p.json")));
        session.save_preset("short", MappingProfile::new(Vec::new()));
        assert!(matches!(
            session.load_preset("short"),
            Err(RemapError::ProfileMismatch { .. })
        ));
        assert!(session.use_default_mapping());
    }

    #[test]
    fn failed_persistence_becomes_a_warning() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let mut session = Session::new(PresetStore::new(blocker.join("p.json")));
        assert!(!session.save_active_preset("kept"));
        assert!(session.presets().contains_key("kept"));
        assert_eq!(session.take_warnings().len(), 1);
        assert!(session.warnings().is_empty());
    }
}
