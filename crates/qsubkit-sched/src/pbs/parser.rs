//! Parsing of qsub output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};

/// Job identifier assigned by the scheduler.
///
/// Holds the trimmed qsub output verbatim. Format varies by implementation:
/// - PBS Pro: "12345.pbs-server"
/// - Torque: "12345.server.domain.com"
/// - OpenPBS: "12345.hostname"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier exactly as the scheduler printed it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading segment before the first `.`, e.g. `12345` for
    /// `12345.pbs-server`.
    pub fn sequence(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Interpret the output channels of a finished qsub run.
///
/// Any non-blank diagnostic output is a failure, whatever the exit status:
/// some qsub builds report errors on stderr and still exit zero. That text
/// is returned verbatim as [`SchedError::Submission`]. A run that prints
/// nothing at all is a [`SchedError::Command`] failure instead, since the
/// scheduler gave no diagnostic to pass on.
pub fn parse_qsub_output(stdout: &str, stderr: &str) -> SchedResult<JobId> {
    if !stderr.trim().is_empty() {
        return Err(SchedError::Submission(stderr.to_string()));
    }

    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(SchedError::Command {
            command: "qsub".to_string(),
            message: "no job identifier on stdout".to_string(),
        });
    }

    Ok(JobId::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qsub_output_pbs_pro() {
        let id = parse_qsub_output("12345.pbs-server\n", "").unwrap();
        assert_eq!(id.as_str(), "12345.pbs-server");
        assert_eq!(id.sequence(), "12345");
    }

    #[test]
    fn test_parse_qsub_output_torque() {
        let id = parse_qsub_output("  67890.server.domain.com  \n", "").unwrap();
        assert_eq!(id.as_str(), "67890.server.domain.com");
        assert_eq!(id.sequence(), "67890");
    }

    #[test]
    fn test_parse_qsub_output_numeric_only() {
        let id = parse_qsub_output("12345", "").unwrap();
        assert_eq!(id.sequence(), "12345");
        assert_eq!(id.to_string(), "12345");
    }

    #[test]
    fn test_parse_qsub_output_stderr_wins() {
        let err = parse_qsub_output("12345.server\n", "qsub: invalid option").unwrap_err();
        match err {
            SchedError::Submission(msg) => assert_eq!(msg, "qsub: invalid option"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_qsub_output_whitespace_stderr_ignored() {
        assert!(parse_qsub_output("1.a\n", "\n  ").is_ok());
    }

    #[test]
    fn test_parse_qsub_output_empty() {
        match parse_qsub_output("\n", "").unwrap_err() {
            SchedError::Command { command, message } => {
                assert_eq!(command, "qsub");
                assert!(message.contains("no job identifier"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            parse_qsub_output("", " \n"),
            Err(SchedError::Command { .. })
        ));
    }
}
