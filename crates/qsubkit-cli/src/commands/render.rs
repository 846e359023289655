//! Render command implementation.
//!
//! Prints the job script a manifest describes. Parallel steps still write
//! their side-scripts, since the script refers to them by path.

use std::path::Path;

use anyhow::Result;

use super::common::load_job;

/// Execute the render command.
pub fn execute(manifest: &Path) -> Result<()> {
    let job = load_job(manifest)?;
    print!("{}", job.script()?);
    Ok(())
}
