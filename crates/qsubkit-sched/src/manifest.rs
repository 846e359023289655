//! File-based job descriptions.
//!
//! A manifest pairs a [`JobConfig`] with the ordered steps that make up the
//! job body:
//!
//! ```yaml
//! job:
//!   name: sweep
//!   nodes: 2
//!   ppn: 8
//!   walltime: "4:00:00"
//! steps:
//!   - run: python prepare.py
//!   - run: ./solver
//!     per_node: 4
//!   - parallel:
//!       - python batch.py 1
//!       - python batch.py 2
//!   - echo: done
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};
use crate::job::{AddOptions, JobConfig, Qsub};

/// A single command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunStep {
    pub run: String,
    #[serde(default)]
    pub simple: bool,
    #[serde(default)]
    pub per_node: Option<u32>,
}

/// Independent commands fanned out through a side-script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelStep {
    pub parallel: Vec<String>,
}

/// A literal echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EchoStep {
    pub echo: String,
}

/// One entry of the job body, told apart by its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Run(RunStep),
    Parallel(ParallelStep),
    Echo(EchoStep),
}

/// A job configuration plus its body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobManifest {
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl JobManifest {
    pub fn from_yaml_str(source: &str) -> SchedResult<Self> {
        Ok(serde_yaml_ng::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> SchedResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load a manifest, choosing the format from the file extension
    /// (`.json` is JSON, anything else YAML).
    pub fn load(path: impl AsRef<Path>) -> SchedResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            SchedError::Manifest(format!("failed to read {}: {e}", path.display()))
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Replay the steps onto a new builder, in order.
    ///
    /// `parallel` steps write their side-scripts immediately.
    pub fn into_builder(self) -> SchedResult<Qsub> {
        let mut job = Qsub::new(self.job)?;
        for step in self.steps {
            match step {
                Step::Run(step) => {
                    let opts = AddOptions {
                        simple: step.simple,
                        per_node: step.per_node,
                    };
                    job.add_with(&step.run, opts)?;
                }
                Step::Parallel(step) => {
                    job.add_parallel(&step.parallel)?;
                }
                Step::Echo(step) => job.echo(&step.echo)?,
            }
        }
        Ok(job)
    }
}
