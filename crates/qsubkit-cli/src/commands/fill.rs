//! Fill command implementation.
//!
//! Fills the script template directly from `key=value` pairs, without a
//! manifest, prints it, and submits it unless this is a dry run.

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use qsubkit_sched::{Submitter, fill_template};

use super::common::{parse_fill_pairs, qsub_client};

/// Execute the fill command.
pub async fn execute(pairs: &[String], dry_run: bool, qsub: PathBuf) -> Result<()> {
    let template = parse_fill_pairs(pairs)?;
    let script = fill_template(&template)?;
    print!("{script}");

    if dry_run {
        println!("DRYRUN");
        return Ok(());
    }

    eprintln!("{} Submitting...", style("→").cyan().bold());
    let job_id = qsub_client(qsub, None).submit(&script).await?;
    println!("{job_id}");
    Ok(())
}
