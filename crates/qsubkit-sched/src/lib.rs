//! qsubkit PBS job builder
//!
//! This crate composes PBS batch scripts and submits them through `qsub`,
//! returning the scheduler-assigned job identifier.
//!
//! # Overview
//!
//! - [`Qsub`] accumulates option directives and command lines for one job.
//! - Commands are optionally prefixed with `time` and, for per-node dispatch,
//!   with `mpiexec -npernode <n>` (see [`pbs::wrap`]).
//! - [`Qsub::add_parallel`] writes independent commands to a side-script under
//!   `<work_dir>/tmp_scripts/` and dispatches them all through a single
//!   `mpiexec parallel-command-processor` line.
//! - [`QsubClient`] pipes the rendered script into `qsub` and parses the job
//!   ID; [`MockSubmitter`] stands in for it in tests.
//!
//! # Example
//!
//! ```ignore
//! use qsubkit_sched::{AddOptions, JobConfig, Qsub, QsubClient};
//!
//! let mut job = Qsub::new(JobConfig::new("sweep").with_nodes(2).with_ppn(8))?;
//! job.add("python prepare.py")?;
//! job.add_parallel(&["python batch.py 1", "python batch.py 2"])?;
//! job.add_with("./solver", AddOptions::new().per_node(4))?;
//!
//! let outcome = job.submit(&QsubClient::default(), false).await?;
//! println!("{outcome}");
//! ```
//!
//! The crate does no queueing or status polling; those belong to the
//! scheduler.

pub mod error;
pub mod job;
pub mod manifest;
pub mod pbs;

pub use error::{SchedError, SchedResult};
pub use job::{
    AddOptions, JobConfig, JobState, MAX_PPN_GLENN, MAX_PPN_OAKLEY, Partition, Qsub,
    SubmitOutcome, Walltime,
};
pub use manifest::{JobManifest, Step};
pub use pbs::{
    Delay, DependKind, JobId, MockSubmitter, QsubClient, QsubConfig, Relation, ScriptTemplate,
    Submitter, fill_template,
};
