//! PBS (Portable Batch System) script composition and submission.
//!
//! This module provides the pieces a [`crate::Qsub`] builder is assembled
//! from: directive renderers, command prefixing, parallel side-scripts, the
//! batch script template and the qsub adapter.

mod adapter;
pub mod directives;
mod parallel;
mod parser;
mod templates;
pub mod wrap;

pub use adapter::{MockSubmitter, QsubClient, QsubConfig, Submitter};
pub use directives::{DependKind, Delay, Relation};
pub use parallel::{COMMAND_PROCESSOR, ParallelBatch, ParallelBatchWriter, TMP_SCRIPTS_DIR};
pub use parser::{JobId, parse_qsub_output};
pub use templates::{DEFAULT_FILL_WALLTIME, DEFAULT_PROFILE, ScriptTemplate, fill_template};
