//! Batch command handler

use anyhow::{bail, Result};
use std::path::PathBuf;

use ascbids::batch::{load_info, Batch};
use ascbids::cli::{OutputArgs, ParseArgs};
use ascbids::Config;

/// Convert every file of an info table.
///
/// Exits with an error after the whole batch ran if any file failed.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    config: &Config,
    input: PathBuf,
    info_file: Option<String>,
    workers: Option<usize>,
    parse: &ParseArgs,
    output: &OutputArgs,
) -> Result<()> {
    let converter = super::converter(config, parse)?;
    let writer = super::writer(config, output);

    let info_file = info_file.or_else(|| config.batch.info_file.clone());
    let info = load_info(&input, info_file.as_deref(), Some(writer.root()))?;
    let workers = workers.unwrap_or_else(|| config.batch_workers());

    let report = Batch::new(&input, info, workers)
        .with_settings(super::settings_overrides(output)?)
        .run(&converter, &writer)?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(files) => {
                println!("{}", outcome.filename);
                for file in files {
                    println!("  {}", file);
                }
            }
            Err(e) => eprintln!("{}: {:#}", outcome.filename, e),
        }
    }
    println!("{}", report.participants);

    let failed = report.failures().count();
    if failed > 0 {
        bail!(
            "{} of {} files failed to convert",
            failed,
            report.outcomes.len()
        );
    }
    println!("Converted {} files", report.succeeded());
    Ok(())
}
