//! Job configuration and the script builder.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SchedError, SchedResult};
use crate::pbs::directives::{self, DependKind, Delay, Relation};
use crate::pbs::wrap::{self, time_wrap};
use crate::pbs::{DEFAULT_PROFILE, JobId, ParallelBatchWriter, ScriptTemplate, Submitter};

/// Maximum processors per node on Oakley nodes.
pub const MAX_PPN_OAKLEY: u32 = 12;

/// Maximum processors per node on Glenn nodes.
pub const MAX_PPN_GLENN: u32 = 8;

/// Wall-clock limit, rendered as `H:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Walltime {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Walltime {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Whole hours.
    pub fn hours(hours: u32) -> Self {
        Self::new(hours, 0, 0)
    }
}

impl Default for Walltime {
    fn default() -> Self {
        Self::hours(1)
    }
}

impl fmt::Display for Walltime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl FromStr for Walltime {
    type Err = SchedError;

    /// Accepts `H:MM:SS`, `H:MM` or `H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let field = |value: &str, name: &str| -> SchedResult<u32> {
            let value = value.trim();
            if value.starts_with('-') {
                return Err(SchedError::config(format!(
                    "walltime {name} must not be negative: '{s}'"
                )));
            }
            value.parse().map_err(|_| {
                SchedError::config(format!(
                    "invalid walltime '{s}': expected H:MM:SS, H:MM or H"
                ))
            })
        };

        match parts.as_slice() {
            [h, m, sec] => Ok(Self::new(
                field(h, "hours")?,
                field(m, "minutes")?,
                field(sec, "seconds")?,
            )),
            [h, m] => Ok(Self::new(field(h, "hours")?, field(m, "minutes")?, 0)),
            [h] => Ok(Self::hours(field(h, "hours")?)),
            _ => Err(SchedError::config(format!(
                "invalid walltime '{s}': expected H:MM:SS, H:MM or H"
            ))),
        }
    }
}

impl TryFrom<String> for Walltime {
    type Error = SchedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Walltime> for String {
    fn from(value: Walltime) -> Self {
        value.to_string()
    }
}

/// Target node partition, bounding processors per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Oakley,
    Glenn,
    Custom { max_ppn: u32 },
}

impl Partition {
    pub fn max_ppn(&self) -> u32 {
        match self {
            Partition::Oakley => MAX_PPN_OAKLEY,
            Partition::Glenn => MAX_PPN_GLENN,
            Partition::Custom { max_ppn } => *max_ppn,
        }
    }
}

/// Job-level settings for a [`Qsub`] builder.
///
/// Every recognized setting is a field; unknown keys in a serialized
/// configuration are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Job name (`-N`).
    pub name: String,

    /// Number of nodes.
    pub nodes: u32,

    /// Processes per node.
    pub ppn: u32,

    /// Wall-clock limit.
    pub walltime: Walltime,

    /// Directory the job `cd`s into; side-scripts go under it too.
    ///
    /// Must be absolute: the script runs on a compute node whose starting
    /// directory is unrelated to the submitting shell.
    pub work_dir: PathBuf,

    /// Prefix commands with `time`.
    pub auto_time: bool,

    /// Partition whose ppn maximum applies.
    pub partition: Option<Partition>,

    /// Mail on end and abort.
    pub email: bool,

    pub stdout_path: Option<PathBuf>,
    pub stderr_path: Option<PathBuf>,

    /// Jobs that must terminate before this one starts. Entries may be
    /// colon-joined lists.
    pub after_jobids: Vec<String>,

    /// Exported as `OMP_NUM_THREADS`.
    pub threads: Option<u32>,

    /// Deferred start.
    pub delay: Option<Delay>,

    /// Raw directive lines, placed before the generated ones.
    pub options: Vec<String>,

    /// Shell profile sourced before the body.
    pub profile: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            nodes: 1,
            ppn: 1,
            walltime: Walltime::default(),
            work_dir: dirs::home_dir().unwrap_or_default(),
            auto_time: true,
            partition: None,
            email: false,
            stdout_path: None,
            stderr_path: None,
            after_jobids: Vec::new(),
            threads: None,
            delay: None,
            options: Vec::new(),
            profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl JobConfig {
    /// Default configuration with the given job name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_nodes(mut self, nodes: u32) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_ppn(mut self, ppn: u32) -> Self {
        self.ppn = ppn;
        self
    }

    pub fn with_walltime(mut self, walltime: Walltime) -> Self {
        self.walltime = walltime;
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_auto_time(mut self, auto_time: bool) -> Self {
        self.auto_time = auto_time;
        self
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_email(mut self, email: bool) -> Self {
        self.email = email;
        self
    }

    pub fn with_stdout(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }

    pub fn with_stderr(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr_path = Some(path.into());
        self
    }

    /// Depend on the given jobs terminating (in any state).
    pub fn after<I, S>(mut self, jobids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after_jobids.extend(jobids.into_iter().map(Into::into));
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_option(mut self, line: impl Into<String>) -> Self {
        self.options.push(line.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Check the configuration without building anything.
    pub fn validate(&self) -> SchedResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchedError::config("job name must not be empty"));
        }
        if self.name.contains('\n') {
            return Err(SchedError::config("job name must be a single line"));
        }
        if self.nodes == 0 {
            return Err(SchedError::config("node count must be at least 1"));
        }
        if self.ppn == 0 {
            return Err(SchedError::config("ppn must be at least 1"));
        }
        if self.work_dir.as_os_str().is_empty() {
            return Err(SchedError::config("working directory must not be empty"));
        }
        if !self.work_dir.is_absolute() {
            return Err(SchedError::config(format!(
                "working directory must be an absolute path: {}",
                self.work_dir.display()
            )));
        }
        if let Some(partition) = self.partition {
            if self.ppn > partition.max_ppn() {
                return Err(SchedError::config(format!(
                    "ppn {} exceeds the partition maximum of {}",
                    self.ppn,
                    partition.max_ppn()
                )));
            }
        }
        Ok(())
    }

    /// Directive lines implied by this configuration, in script order.
    fn option_lines(&self) -> SchedResult<Vec<String>> {
        let mut lines = Vec::new();
        for line in &self.options {
            lines.push(check_option_line(line)?);
        }

        if self.email {
            lines.push(directives::mail_option(false, true, true));
        }
        if let Some(path) = &self.stdout_path {
            lines.push(directives::stdout_option(path));
        }
        if let Some(path) = &self.stderr_path {
            lines.push(directives::stderr_option(path));
        }
        let jobids: Vec<String> = self
            .after_jobids
            .iter()
            .flat_map(|ids| directives::split_jobids(ids))
            .collect();
        if !jobids.is_empty() {
            lines.push(directives::dependency_option(
                &jobids,
                Relation::After,
                DependKind::Any,
            )?);
        }
        if let Some(threads) = self.threads {
            lines.push(directives::env_threads_option(threads)?);
        }
        if let Some(delay) = &self.delay {
            lines.push(directives::delay_option(delay)?);
        }
        Ok(lines)
    }
}

fn check_option_line(line: &str) -> SchedResult<String> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SchedError::config("option line must not be empty"));
    }
    if line.contains('\n') {
        return Err(SchedError::config("option line must be a single line"));
    }
    Ok(line.to_string())
}

/// Builder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Options and commands may be appended.
    Building,
    /// The script has been handed to the scheduler.
    Submitted,
}

/// Per-command settings for [`Qsub::add_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Skip the timing prefix.
    pub simple: bool,
    /// Launch this many ranks on each node.
    pub per_node: Option<u32>,
}

impl AddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simple(mut self) -> Self {
        self.simple = true;
        self
    }

    pub fn per_node(mut self, ranks: u32) -> Self {
        self.per_node = Some(ranks);
        self
    }
}

/// What [`Qsub::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The scheduler accepted the job.
    Submitted(JobId),
    /// Dry run; nothing was sent.
    DryRun,
}

impl SubmitOutcome {
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            SubmitOutcome::Submitted(id) => Some(id),
            SubmitOutcome::DryRun => None,
        }
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Submitted(id) => write!(f, "{id}"),
            SubmitOutcome::DryRun => f.write_str("DRYRUN"),
        }
    }
}

/// Accumulates directives and commands into one PBS job script.
///
/// Commands run in the order they were added. Once the job has been
/// submitted, further mutation is allowed but logged.
#[derive(Debug, Clone)]
pub struct Qsub {
    config: JobConfig,
    options: Vec<String>,
    commands: Vec<String>,
    state: JobState,
}

impl Qsub {
    /// Validate `config` and build the initial option block from it.
    pub fn new(config: JobConfig) -> SchedResult<Self> {
        config.validate()?;
        let options = config.option_lines()?;

        debug!(
            "New job '{}' ({} node(s) x {} ppn, walltime {})",
            config.name, config.nodes, config.ppn, config.walltime
        );

        Ok(Self {
            config,
            options,
            commands: Vec::new(),
            state: JobState::Building,
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Option block lines, in order.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Command lines, in execution order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn work_dir(&self) -> &Path {
        &self.config.work_dir
    }

    fn note_mutation(&self) {
        if self.state == JobState::Submitted {
            warn!("Job '{}' modified after submission", self.config.name);
        }
    }

    /// Append a raw directive line.
    pub fn add_option(&mut self, line: impl AsRef<str>) -> SchedResult<()> {
        let line = check_option_line(line.as_ref())?;
        self.note_mutation();
        debug!("Option: {}", line);
        self.options.push(line);
        Ok(())
    }

    /// Append a command, time-wrapped when `auto_time` is set.
    pub fn add(&mut self, command: impl AsRef<str>) -> SchedResult<()> {
        self.add_with(command, AddOptions::default())
    }

    /// Append a command with explicit wrapping settings.
    ///
    /// With `per_node`, the (possibly timed) command is launched through
    /// `mpiexec -npernode <n>`; `n` must lie in `1..=ppn`.
    pub fn add_with(&mut self, command: impl AsRef<str>, opts: AddOptions) -> SchedResult<()> {
        let command = command.as_ref();
        if command.trim().is_empty() {
            return Err(SchedError::config("command must not be empty"));
        }
        if command.contains('\n') {
            return Err(SchedError::config(
                "command must be a single line; add each line separately",
            ));
        }
        if let Some(per_node) = opts.per_node {
            if per_node < 1 || per_node > self.config.ppn {
                return Err(SchedError::config(format!(
                    "per-node rank count {per_node} outside 1..={}",
                    self.config.ppn
                )));
            }
        }

        let mut line = if opts.simple {
            command.to_string()
        } else {
            time_wrap(command, self.config.auto_time)
        };
        if let Some(per_node) = opts.per_node {
            line = wrap::wrap(&wrap::per_node_prefix(per_node), &line, true);
        }

        self.note_mutation();
        debug!("Command: {}", line);
        self.commands.push(line);
        Ok(())
    }

    /// Fan `commands` out across the allocation through a side-script.
    ///
    /// Returns the side-script path. The file is left on disk.
    pub fn add_parallel<S: AsRef<str>>(&mut self, commands: &[S]) -> SchedResult<PathBuf> {
        let batch = ParallelBatchWriter::new(
            &self.config.work_dir,
            &self.config.name,
            self.config.auto_time,
        )
        .write(commands)?;

        self.note_mutation();
        debug!("Command: {}", batch.dispatch);
        self.commands.push(batch.dispatch);
        Ok(batch.path)
    }

    /// Append `echo <message>`, never wrapped.
    pub fn echo(&mut self, message: impl AsRef<str>) -> SchedResult<()> {
        let message = message.as_ref();
        if message.contains('\n') {
            return Err(SchedError::config("echo message must be a single line"));
        }
        self.note_mutation();
        let line = format!("echo {message}").trim_end().to_string();
        self.commands.push(line);
        Ok(())
    }

    /// Template fields for the current state of the builder.
    pub fn template(&self) -> ScriptTemplate {
        ScriptTemplate {
            job_name: self.config.name.clone(),
            nodes: self.config.nodes,
            ppn: self.config.ppn,
            walltime: self.config.walltime.to_string(),
            options: self.options.join("\n"),
            work_dir: self.config.work_dir.clone(),
            profile: self.config.profile.clone(),
            body: self.commands.join("\n"),
        }
    }

    /// The script that [`Qsub::submit`] would send.
    pub fn script(&self) -> SchedResult<String> {
        self.template().render()
    }

    /// Render and submit. With `dry`, nothing is rendered or sent.
    pub async fn submit<S>(&mut self, submitter: &S, dry: bool) -> SchedResult<SubmitOutcome>
    where
        S: Submitter + ?Sized,
    {
        if dry {
            debug!("Dry run for job '{}'", self.config.name);
            return Ok(SubmitOutcome::DryRun);
        }

        let script = self.script()?;
        let job_id = submitter.submit(&script).await?;
        self.state = JobState::Submitted;
        Ok(SubmitOutcome::Submitted(job_id))
    }
}
