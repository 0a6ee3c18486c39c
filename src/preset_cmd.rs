use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    cli::{PresetArgs, PresetCommand},
    grid,
    mapping::MappingProfile,
    presets::{PresetStore, StoredMapping, normalize},
    data::Value,
    session::Session,
    table::Table,
    workbook,
};

pub fn execute(args: &PresetArgs) -> Result<()> {
    let mut session = Session::new(PresetStore::new(&args.presets));
    match &args.action {
        PresetCommand::List => {
            if session.presets().is_empty() {
                info!("No presets saved in {:?}", args.presets);
            }
            for name in session.presets().keys() {
                println!("{name}");
            }
            Ok(())
        }
        PresetCommand::Show { name } => {
            let profile = session
                .presets()
                .get(name)
                .ok_or_else(|| anyhow!("Preset '{name}' not found in {:?}", args.presets))?;
            print_profile(profile);
            Ok(())
        }
        PresetCommand::Delete { name } => {
            let persisted = session.delete_preset(name)?;
            finish_write(&mut session, persisted)?;
            info!("Deleted preset '{name}'");
            Ok(())
        }
        PresetCommand::Init { name, input } => {
            let profile = match input {
                Some(path) => {
                    let grid = workbook::read_grid(path)
                        .with_context(|| format!("Importing workbook {path:?}"))?;
                    MappingProfile::hydrated(grid::build_table(&grid).headers())
                }
                None => MappingProfile::default_profile(),
            };
            save(&mut session, name, profile)
        }
        PresetCommand::Import { name, file } => {
            let profile = read_profile(file)?;
            save(&mut session, name, profile)
        }
    }
}

fn save(session: &mut Session, name: &str, profile: MappingProfile) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Preset name cannot be empty"));
    }
    profile
        .validate()
        .with_context(|| format!("Preset '{name}' does not match the target schema"))?;
    let persisted = session.save_preset(name, profile);
    finish_write(session, persisted)?;
    info!("Saved preset '{name}' to {:?}", session.store().path());
    Ok(())
}

fn finish_write(session: &mut Session, persisted: bool) -> Result<()> {
    if persisted {
        Ok(())
    } else {
        Err(anyhow!(session.take_warnings().join("; ")))
    }
}

/// Reads a JSON array of mapping records, filling absent fields.
fn read_profile(path: &Path) -> Result<MappingProfile> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading mapping file {path:?}"))?;
    let records: Vec<StoredMapping> = serde_json::from_str(&content)
        .with_context(|| format!("Parsing mapping records from {path:?}"))?;
    let mut normalized = normalize(BTreeMap::from([(String::new(), records)]));
    normalized
        .remove("")
        .ok_or_else(|| anyhow!("No mapping records in {path:?}"))
}

fn print_profile(profile: &MappingProfile) {
    let headers = ["Output", "Mode", "Input", "Fixed", "Formula"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = profile
        .mappings()
        .iter()
        .map(|m| {
            [
                m.out_name.as_str(),
                m.mode.as_str(),
                m.input_col.as_str(),
                m.fixed_value.as_str(),
                m.formula.as_str(),
            ]
            .into_iter()
            .map(Value::from)
            .collect()
        })
        .collect::<Vec<_>>();
    Table::new(headers, rows).print(None);
}
