//! Renderers for individual `#PBS` directive lines.
//!
//! Every function here is pure: it formats a directive from typed input and
//! touches no shared state. The exact prefix and flag letters are what the
//! scheduler parses, so the output is kept byte-for-byte stable.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};

/// Prefix shared by every directive line.
pub const DIRECTIVE_PREFIX: &str = "#PBS";

/// Environment variable exported by [`env_threads_option`].
pub const THREADS_ENV_VAR: &str = "OMP_NUM_THREADS";

/// Mail notification directive (`-m`).
///
/// Event letters are emitted in the fixed order begin, end, abort. Returns an
/// empty string when no event is requested.
pub fn mail_option(begin: bool, end: bool, abort: bool) -> String {
    if !(begin || end || abort) {
        return String::new();
    }

    let mut events = String::with_capacity(3);
    if begin {
        events.push('b');
    }
    if end {
        events.push('e');
    }
    if abort {
        events.push('a');
    }
    format!("{DIRECTIVE_PREFIX} -m {events}")
}

/// Standard output redirection directive (`-o`). The path is not validated.
pub fn stdout_option(path: impl AsRef<Path>) -> String {
    format!("{DIRECTIVE_PREFIX} -o {}", path.as_ref().display())
}

/// Standard error redirection directive (`-e`). The path is not validated.
pub fn stderr_option(path: impl AsRef<Path>) -> String {
    format!("{DIRECTIVE_PREFIX} -e {}", path.as_ref().display())
}

/// Direction of an inter-job dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Run after the listed jobs.
    #[default]
    After,
    /// Run before the listed jobs.
    Before,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::After => f.write_str("after"),
            Relation::Before => f.write_str("before"),
        }
    }
}

/// Which outcome of the related jobs releases the dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependKind {
    /// Any termination.
    #[default]
    Any,
    /// Successful termination only.
    Ok,
    /// Failed termination only.
    NotOk,
}

impl fmt::Display for DependKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependKind::Any => f.write_str("any"),
            DependKind::Ok => f.write_str("ok"),
            DependKind::NotOk => f.write_str("notok"),
        }
    }
}

/// Dependency directive (`-W depend=`).
///
/// Joins all job IDs with `:` after the relation/kind prefix, e.g.
/// `#PBS -W depend=afterany:123:456`. The ID list must not be empty.
pub fn dependency_option<S: AsRef<str>>(
    jobids: &[S],
    relation: Relation,
    kind: DependKind,
) -> SchedResult<String> {
    if jobids.is_empty() {
        return Err(SchedError::config(
            "dependency directive requires at least one job ID",
        ));
    }
    if let Some(blank) = jobids.iter().position(|id| id.as_ref().trim().is_empty()) {
        return Err(SchedError::config(format!(
            "dependency job ID at position {blank} is empty"
        )));
    }

    let ids: Vec<&str> = jobids.iter().map(|id| id.as_ref().trim()).collect();
    Ok(format!(
        "{DIRECTIVE_PREFIX} -W depend={relation}{kind}:{}",
        ids.join(":")
    ))
}

/// Split a colon-delimited job ID list (`"123:456"`) into its parts.
///
/// Empty segments are dropped.
pub fn split_jobids(jobids: &str) -> Vec<String> {
    jobids
        .split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Thread-count export directive (`-v OMP_NUM_THREADS=<n>`).
pub fn env_threads_option(n: u32) -> SchedResult<String> {
    if n == 0 {
        return Err(SchedError::config("thread count must be at least 1"));
    }
    Ok(format!("{DIRECTIVE_PREFIX} -v {THREADS_ENV_VAR}={n}"))
}

/// Deferred start time for the `-a` directive.
///
/// Mirrors the PBS `[[[[CC]YY]MM]DD]hhmm[.SS]` form: a year needs a month and
/// a month needs a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Delay {
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub second: Option<u32>,
}

impl Delay {
    /// Start at the given time of day.
    pub fn at(hour: u32, minute: u32) -> Self {
        Self {
            hour,
            minute,
            ..Self::default()
        }
    }

    /// Start on the given calendar date.
    pub fn on(mut self, year: u32, month: u32, day: u32) -> Self {
        self.year = Some(year);
        self.month = Some(month);
        self.day = Some(day);
        self
    }

    /// Set the seconds component.
    pub fn with_second(mut self, second: u32) -> Self {
        self.second = Some(second);
        self
    }
}

/// Deferred execution directive (`-a`).
pub fn delay_option(delay: &Delay) -> SchedResult<String> {
    if delay.year.is_some() && delay.month.is_none() {
        return Err(SchedError::config("delay with a year also needs a month"));
    }
    if delay.month.is_some() && delay.day.is_none() {
        return Err(SchedError::config("delay with a month also needs a day"));
    }
    if delay.hour > 23 || delay.minute > 59 || delay.second.is_some_and(|s| s > 59) {
        return Err(SchedError::config(format!(
            "delay time {}:{}:{} is out of range",
            delay.hour,
            delay.minute,
            delay.second.unwrap_or(0)
        )));
    }

    let mut stamp = String::new();
    if let Some(year) = delay.year {
        stamp.push_str(&year.to_string());
    }
    for part in [delay.month, delay.day, Some(delay.hour), Some(delay.minute)]
        .into_iter()
        .flatten()
    {
        stamp.push_str(&format!("{part:02}"));
    }
    if let Some(second) = delay.second {
        stamp.push_str(&format!(".{second:02}"));
    }

    Ok(format!("{DIRECTIVE_PREFIX} -a {stamp}"))
}
