use anyhow::{Context, Result, anyhow};
use chrono::Local;
use log::info;

use crate::{
    cli::ConvertArgs,
    export::{self, OutputKind},
    io_utils, open_session,
};

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let kind = OutputKind::from_path(&args.output);
    if args.output_encoding.is_some() && kind == OutputKind::Xlsx {
        return Err(anyhow!(
            "--output-encoding only applies to CSV output (use a .csv path or '-')"
        ));
    }
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;

    let session = open_session(&args.pipeline)?;
    info!(
        "Converting '{}' -> {:?} with {} filter(s)",
        args.pipeline.input.display(),
        args.output,
        session.filters().len()
    );
    let output = session
        .output_table(Local::now().date_naive())
        .context("Building output table")?;

    match kind {
        OutputKind::Xlsx => export::write_xlsx(&output, &args.output)
            .with_context(|| format!("Writing workbook {:?}", args.output))?,
        OutputKind::Csv => export::write_csv(&output, &args.output, encoding)?,
    }
    info!("Output {} records.", output.len());
    Ok(())
}
