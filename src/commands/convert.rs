//! Convert command handler

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use ascbids::batch::FileJob;
use ascbids::bids::BidsEntities;
use ascbids::cli::{OutputArgs, ParseArgs};
use ascbids::Config;

/// BIDS entity labels given on the command line.
pub struct EntityArgs {
    pub participant: String,
    pub ses: Option<String>,
    pub task: Option<String>,
    pub acq: Option<String>,
    pub run: Option<String>,
}

impl EntityArgs {
    fn entities(&self) -> Result<BidsEntities> {
        Ok(BidsEntities::new(&self.participant)?
            .with_session(self.ses.as_deref())
            .with_task(self.task.as_deref())
            .with_acquisition(self.acq.as_deref())
            .with_run(self.run.as_deref()))
    }
}

/// Convert one file and list what was written.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    config: &Config,
    input: PathBuf,
    entities: EntityArgs,
    events: Option<PathBuf>,
    parse: &ParseArgs,
    output: &OutputArgs,
) -> Result<()> {
    let converter = super::converter(config, parse)?;
    let writer = super::writer(config, output);

    let mut job = FileJob::new(input, entities.entities()?);
    job.task_name = entities.task.clone();
    job.json_overrides = super::settings_overrides(output)?;
    job.events = events;

    let written = job.run(&converter, &writer)?;
    info!(source = ?job.source, "converted");
    for file in &written {
        println!("{}", file);
    }
    Ok(())
}
