//! Side-script generation for fan-out of independent commands.
//!
//! A parallel batch is a plain file with one command per line, placed under
//! `<work_dir>/tmp_scripts/`. The job body then runs a distributed command
//! processor over that file, and the scheduler spreads its lines across the
//! allocated ranks. Files are never removed here.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use rand::Rng;
use tracing::debug;

use crate::error::{SchedError, SchedResult};
use crate::pbs::wrap::{LAUNCHER, time_wrap};

/// Subdirectory of the work directory that holds side-scripts.
pub const TMP_SCRIPTS_DIR: &str = "tmp_scripts";

/// Program that executes one side-script line per rank.
pub const COMMAND_PROCESSOR: &str = "parallel-command-processor";

/// Upper bound (inclusive) of the random name component.
const NAME_RANDOM_MAX: u32 = 10_000_000;

/// A side-script written to disk and the command that dispatches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelBatch {
    /// Location of the side-script.
    pub path: PathBuf,
    /// Command line to append to the job body.
    pub dispatch: String,
}

/// Writes parallel batches for one job.
#[derive(Debug, Clone)]
pub struct ParallelBatchWriter<'a> {
    work_dir: &'a Path,
    job_name: &'a str,
    auto_time: bool,
}

impl<'a> ParallelBatchWriter<'a> {
    pub fn new(work_dir: &'a Path, job_name: &'a str, auto_time: bool) -> Self {
        Self {
            work_dir,
            job_name,
            auto_time,
        }
    }

    /// Write `commands` to a fresh side-script and return its dispatch line.
    ///
    /// Line N of the file is the Nth command, time-wrapped when `auto_time`
    /// is set. The batch must contain at least one command, and every
    /// command must be a single non-blank line. Nothing touches the disk
    /// until the whole batch passes.
    pub fn write<S: AsRef<str>>(&self, commands: &[S]) -> SchedResult<ParallelBatch> {
        if commands.is_empty() {
            return Err(SchedError::config("parallel batch needs at least one command"));
        }
        if let Some(blank) = commands.iter().position(|c| c.as_ref().trim().is_empty()) {
            return Err(SchedError::config(format!(
                "parallel batch command at position {blank} is empty"
            )));
        }
        if let Some(split) = commands
            .iter()
            .position(|c| c.as_ref().contains(['\n', '\r']))
        {
            return Err(SchedError::config(format!(
                "parallel batch command at position {split} must be a single line"
            )));
        }

        let dir = ensure_tmp_dir(self.work_dir)?;
        let path = dir.join(script_name(self.job_name));

        // create_new: a name collision fails loudly instead of clobbering
        // another job's batch.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| SchedError::filesystem(&path, e))?;

        let mut contents = String::new();
        for command in commands {
            contents.push_str(&time_wrap(command.as_ref(), self.auto_time));
            contents.push('\n');
        }
        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| SchedError::filesystem(&path, e))?;

        debug!(
            "Wrote {} command(s) to parallel batch {}",
            commands.len(),
            path.display()
        );

        let dispatch = time_wrap(
            &format!("{LAUNCHER} {COMMAND_PROCESSOR} {}", path.display()),
            self.auto_time,
        );

        Ok(ParallelBatch { path, dispatch })
    }
}

/// Create `<work_dir>/tmp_scripts`, treating a concurrent creation as success.
fn ensure_tmp_dir(work_dir: &Path) -> SchedResult<PathBuf> {
    let dir = work_dir.join(TMP_SCRIPTS_DIR);
    match fs::create_dir_all(&dir) {
        Ok(()) => Ok(dir),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(dir),
        Err(e) => Err(SchedError::filesystem(&dir, e)),
    }
}

/// `tmp_parallel_script_<job>_<timestamp>_<random>.sh`
///
/// Uniqueness is probabilistic only: two writers hitting the same microsecond
/// and the same random draw would collide.
fn script_name(job_name: &str) -> String {
    let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
    let salt = rand::thread_rng().gen_range(0..=NAME_RANDOM_MAX);
    format!("tmp_parallel_script_{job_name}_{stamp}_{salt}.sh")
}
