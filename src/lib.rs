pub mod cli;
pub mod compare;
pub mod convert;
pub mod data;
pub mod error;
pub mod export;
pub mod expr;
pub mod filter;
pub mod grid;
pub mod io_utils;
pub mod mapping;
pub mod preset_cmd;
pub mod presets;
pub mod preview;
pub mod project;
pub mod session;
pub mod table;
pub mod workbook;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, HeadersArgs, PipelineArgs},
    data::Value,
    presets::PresetStore,
    session::Session,
    table::Table,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_remap", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Headers(args) => handle_headers(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Convert(args) => convert::execute(&args),
        Commands::Preset(args) => preset_cmd::execute(&args),
    }
}

fn handle_headers(args: &HeadersArgs) -> Result<()> {
    info!("Reading headers from '{}'", args.input.display());
    let grid = workbook::read_grid(&args.input)
        .with_context(|| format!("Importing workbook {:?}", args.input))?;
    let table = grid::build_table(&grid);
    let listing = table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            vec![
                Value::Text((idx + 1).to_string()),
                Value::from(header.as_str()),
            ]
        })
        .collect::<Vec<_>>();
    Table::new(vec!["#".into(), "Header".into()], listing).print(None);
    println!("{} data row(s).", table.len());
    Ok(())
}

/// Imports the input and applies the filter and preset options.
pub(crate) fn open_session(args: &PipelineArgs) -> Result<Session> {
    let mut session = Session::new(PresetStore::new(&args.presets));
    session
        .import_workbook(&args.input)
        .with_context(|| format!("Importing workbook {:?}", args.input))?;
    if args.no_default_filter {
        session.clear_filters();
    }
    for filter in filter::parse_filters(&args.filters)? {
        debug!("Adding filter {filter}");
        session.push_filter(filter);
    }
    if let Some(name) = &args.preset {
        session
            .load_preset(name)
            .with_context(|| format!("Loading preset '{name}' from {:?}", args.presets))?;
    }
    Ok(session)
}
