//! Init command handler

use anyhow::Result;
use std::path::Path;

use ascbids::batch::write_starter_files;

/// Write a starter info table and settings template into a data directory.
#[cfg(not(tarpaulin_include))]
pub fn handle(input: &Path, force: bool) -> Result<()> {
    for path in write_starter_files(input, force)? {
        println!("Wrote {}", path.display());
    }
    println!("Fill in participant_id for every row before running batch.");
    Ok(())
}
