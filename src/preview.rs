use anyhow::{Context, Result};
use chrono::Local;
use log::info;

use crate::{cli::PreviewArgs, open_session};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let session = open_session(&args.pipeline)?;
    let output = session
        .output_table(Local::now().date_naive())
        .context("Building output table")?;
    let limit = if args.all { None } else { Some(args.rows) };

    output.print(limit);
    println!("Output {} records.", output.len());
    info!(
        "Displayed {} of {} row(s) from {:?}",
        limit.map_or(output.len(), |n| n.min(output.len())),
        output.len(),
        args.pipeline.input
    );
    Ok(())
}
