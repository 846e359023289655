//! qsub adapter for job submission.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{SchedError, SchedResult};
use crate::pbs::parser::{self, JobId};

/// Something that accepts a rendered script and returns a job ID.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Hand `script` to the scheduler.
    async fn submit(&self, script: &str) -> SchedResult<JobId>;
}

/// Configuration for [`QsubClient`].
#[derive(Debug, Clone)]
pub struct QsubConfig {
    /// Submission binary.
    pub program: PathBuf,

    /// Arguments passed to the binary. Empty by default, which leaves queue
    /// selection to the scheduler.
    pub args: Vec<String>,

    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for QsubConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("qsub"),
            args: Vec::new(),
            timeout: None,
        }
    }
}

/// Submits scripts by piping them into qsub.
#[derive(Debug, Clone, Default)]
pub struct QsubClient {
    config: QsubConfig,
}

impl QsubClient {
    pub fn new(config: QsubConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &QsubConfig {
        &self.config
    }

    fn command_name(&self) -> String {
        self.config.program.display().to_string()
    }

    /// Run the binary with `script` on stdin and collect both output channels.
    async fn run_qsub(&self, script: &str) -> SchedResult<std::process::Output> {
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SchedError::Command {
                command: self.command_name(),
                message: e.to_string(),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| SchedError::Command {
            command: self.command_name(),
            message: "stdin was not captured".to_string(),
        })?;

        // Feed stdin while draining stdout/stderr so neither side blocks.
        let feed = async move {
            let written = stdin.write_all(script.as_bytes()).await;
            drop(stdin);
            match written {
                // The binary may exit without reading; its stderr decides.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|e| SchedError::Command {
            command: self.command_name(),
            message: e.to_string(),
        })?;
        fed.map_err(|e| SchedError::Command {
            command: self.command_name(),
            message: format!("failed to write script to stdin: {e}"),
        })?;

        Ok(output)
    }
}

#[async_trait]
impl Submitter for QsubClient {
    async fn submit(&self, script: &str) -> SchedResult<JobId> {
        debug!(
            "Submitting {} byte script via {}",
            script.len(),
            self.command_name()
        );

        let output = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_qsub(script))
                .await
                .map_err(|_| {
                    SchedError::Timeout(format!(
                        "{} timed out after {}s",
                        self.command_name(),
                        limit.as_secs_f64()
                    ))
                })??,
            None => self.run_qsub(script).await?,
        };

        if !output.status.success() {
            debug!("{} exited with {}", self.command_name(), output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let job_id = parser::parse_qsub_output(&stdout, &stderr)?;

        info!("Submitted job {}", job_id);
        Ok(job_id)
    }
}

/// In-memory submitter that hands out sequential IDs.
///
/// Every script it receives is kept for inspection.
#[derive(Debug)]
pub struct MockSubmitter {
    server: String,
    counter: AtomicU64,
    scripts: Mutex<Vec<String>>,
}

impl MockSubmitter {
    pub fn new() -> Self {
        Self::with_server("pbs-server")
    }

    /// IDs take the form `<n>.<server>`.
    pub fn with_server(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            counter: AtomicU64::new(1000),
            scripts: Mutex::new(Vec::new()),
        }
    }

    /// Scripts submitted so far, oldest first.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Submitter for MockSubmitter {
    async fn submit(&self, script: &str) -> SchedResult<JobId> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(script.to_string());
        Ok(JobId::new(format!("{n}.{}", self.server)))
    }
}
