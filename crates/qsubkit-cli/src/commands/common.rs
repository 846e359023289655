//! Shared helpers for CLI commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use qsubkit_sched::{JobManifest, Qsub, QsubClient, QsubConfig, ScriptTemplate};

/// Load a manifest and replay it onto a job builder.
pub fn load_job(path: &Path) -> Result<Qsub> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let manifest = JobManifest::load(path)
        .with_context(|| format!("Failed to load manifest: {}", path.display()))?;
    let job = manifest
        .into_builder()
        .with_context(|| format!("Invalid job in {}", path.display()))?;
    Ok(job)
}

/// qsub client for the given binary and optional timeout in seconds.
pub fn qsub_client(program: PathBuf, timeout: Option<u64>) -> QsubClient {
    QsubClient::new(QsubConfig {
        program,
        timeout: timeout.map(Duration::from_secs),
        ..QsubConfig::default()
    })
}

/// Build template fields from `key=value` pairs.
///
/// Recognized keys: `jobname`, `n_nodes`, `n_ppn`, `walltime`, `options`,
/// `script`, `work_dir`, `profile`. Anything else is an error.
pub fn parse_fill_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<ScriptTemplate> {
    let mut template = ScriptTemplate::default();

    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{pair}'"))?;

        match key {
            "jobname" => template.job_name = value.to_string(),
            "n_nodes" => {
                template.nodes = value
                    .parse()
                    .with_context(|| format!("Invalid n_nodes '{value}'"))?;
            }
            "n_ppn" => {
                template.ppn = value
                    .parse()
                    .with_context(|| format!("Invalid n_ppn '{value}'"))?;
            }
            "walltime" => template.walltime = value.to_string(),
            "options" => template.options = value.to_string(),
            "script" => template.body = value.to_string(),
            "work_dir" => template.work_dir = PathBuf::from(value),
            "profile" => template.profile = value.to_string(),
            other => anyhow::bail!(
                "Unknown field '{other}'. Available: jobname, n_nodes, n_ppn, walltime, options, script, work_dir, profile"
            ),
        }
    }

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fill_pairs() {
        let template = parse_fill_pairs(&[
            "jobname=hellworld",
            "n_nodes=2",
            "n_ppn=8",
            "script=echo 'a=b'",
            "work_dir=/scratch",
        ])
        .unwrap();
        assert_eq!(template.job_name, "hellworld");
        assert_eq!(template.nodes, 2);
        assert_eq!(template.ppn, 8);
        assert_eq!(template.body, "echo 'a=b'");
        assert_eq!(template.work_dir, PathBuf::from("/scratch"));
        assert_eq!(template.walltime, "0:40:00");
    }

    #[test]
    fn test_parse_fill_pairs_rejects_unknown_key() {
        let err = parse_fill_pairs(&["jobnam=x"]).unwrap_err();
        assert!(err.to_string().contains("Unknown field 'jobnam'"));
    }

    #[test]
    fn test_parse_fill_pairs_rejects_bad_numbers() {
        assert!(parse_fill_pairs(&["n_nodes=-1"]).is_err());
        assert!(parse_fill_pairs(&["n_ppn=many"]).is_err());
        assert!(parse_fill_pairs(&["script"]).is_err());
    }

    #[test]
    fn test_load_job() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.yaml");
        std::fs::write(
            &path,
            format!(
                "job:\n  name: j\n  work_dir: {}\nsteps:\n  - run: ls\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let job = load_job(&path).unwrap();
        assert_eq!(job.commands(), &["time ls"]);
        assert!(load_job(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_qsub_client() {
        let client = qsub_client(PathBuf::from("/opt/pbs/bin/qsub"), Some(5));
        assert_eq!(client.config().program, PathBuf::from("/opt/pbs/bin/qsub"));
        assert_eq!(client.config().timeout, Some(Duration::from_secs(5)));
        assert!(client.config().args.is_empty());
    }
}
