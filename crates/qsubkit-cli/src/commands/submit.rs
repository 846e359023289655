//! Submit command implementation.
//!
//! Renders a manifest and pipes the script into qsub.

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;

use qsubkit_sched::SubmitOutcome;

use super::common::{load_job, qsub_client};

/// Execute the submit command.
pub async fn execute(
    manifest: &Path,
    dry_run: bool,
    qsub: PathBuf,
    timeout: Option<u64>,
    sequence_only: bool,
) -> Result<()> {
    let mut job = load_job(manifest)?;
    tracing::debug!(options = ?job.options(), "Loaded job from {}", manifest.display());

    eprintln!(
        "{} Submitting {} ({} node(s) x {} ppn, {} command(s)) via {}",
        style("→").cyan().bold(),
        style(&job.config().name).green(),
        job.config().nodes,
        job.config().ppn,
        job.commands().len(),
        style(qsub.display()).magenta()
    );

    let client = qsub_client(qsub, timeout);
    let outcome = job.submit(&client, dry_run).await?;

    match &outcome {
        SubmitOutcome::Submitted(id) if sequence_only => println!("{}", id.sequence()),
        _ => println!("{outcome}"),
    }

    if matches!(outcome, SubmitOutcome::Submitted(_)) {
        eprintln!("{} Job submitted", style("✓").green().bold());
    }
    Ok(())
}
