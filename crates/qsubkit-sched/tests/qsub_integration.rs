//! End-to-end job building and submission tests.
//!
//! Submission runs through the real process path against a stand-in qsub:
//! a small shell script executed by `sh`, so no scheduler is required.

use std::fs;
use std::path::{Path, PathBuf};

use qsubkit_sched::pbs::wrap::{TIME_PREFIX, wrap};
use qsubkit_sched::{
    AddOptions, JobConfig, JobManifest, JobState, MockSubmitter, Qsub, QsubClient, QsubConfig,
    SchedError, SubmitOutcome,
};

/// Write a fake qsub that runs `body` under `sh`.
fn fake_qsub(dir: &Path, body: &str) -> QsubClient {
    let script = dir.join("fake-qsub.sh");
    fs::write(&script, body).unwrap();
    QsubClient::new(QsubConfig {
        program: PathBuf::from("sh"),
        args: vec![script.display().to_string()],
        ..QsubConfig::default()
    })
}

#[test]
fn test_hello_world_render() {
    let work = tempfile::tempdir().unwrap();
    let mut job = Qsub::new(JobConfig::new("hellworld").with_work_dir(work.path())).unwrap();
    job.add("echo hello").unwrap();

    let script = job.script().unwrap();
    let expected = format!(
        "#PBS -N hellworld\n\
         #PBS -l nodes=1:ppn=1\n\
         #PBS -j oe\n\
         #PBS -S /bin/bash\n\
         #PBS -l walltime=1:00:00\n\
         set -x\n\
         cd {}\n\
         source $HOME/.bash_profile\n\
         time echo hello\n",
        work.path().display()
    );
    assert_eq!(script, expected);
    assert_eq!(job.commands(), &["time echo hello"]);
}

#[test]
fn test_parallel_side_script_matches_input() {
    let work = tempfile::tempdir().unwrap();
    let mut job = Qsub::new(JobConfig::new("fanout").with_work_dir(work.path())).unwrap();

    let commands = ["python batch.py 1", "python  batch.py 2", "time python batch.py 3"];
    job.add("mycmd a=b").unwrap();
    let path = job.add_parallel(&commands).unwrap();
    job.add("mycmd a=c").unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    for (line, command) in lines.iter().zip(commands) {
        assert_eq!(*line, wrap(TIME_PREFIX, command, true));
    }

    assert_eq!(job.commands().len(), 3);
    assert_eq!(
        job.commands()[1],
        format!("time mpiexec parallel-command-processor {}", path.display())
    );
    assert!(path.starts_with(work.path().join("tmp_scripts")));
}

#[test]
fn test_rejected_per_node_leaves_job_unchanged() {
    let work = tempfile::tempdir().unwrap();
    let mut job = Qsub::new(
        JobConfig::new("ranks")
            .with_ppn(2)
            .with_work_dir(work.path()),
    )
    .unwrap();
    job.add("setup").unwrap();
    let before = job.script().unwrap();

    assert!(matches!(
        job.add_with("solve", AddOptions::new().per_node(3)),
        Err(SchedError::Config(_))
    ));
    assert_eq!(job.script().unwrap(), before);
}

#[cfg(unix)]
#[tokio::test]
async fn test_submit_pipes_script_and_returns_raw_id() {
    let work = tempfile::tempdir().unwrap();
    let captured = work.path().join("captured.pbs");
    let client = fake_qsub(
        work.path(),
        &format!(
            "cat > '{}'\necho '31337.fake-server.example.org'\n",
            captured.display()
        ),
    );

    let mut job = Qsub::new(
        JobConfig::new("piped")
            .with_nodes(2)
            .with_ppn(4)
            .with_work_dir(work.path())
            .after(["100.fake-server"]),
    )
    .unwrap();
    job.add("./run").unwrap();

    let outcome = job.submit(&client, false).await.unwrap();
    let id = outcome.job_id().unwrap();
    assert_eq!(id.as_str(), "31337.fake-server.example.org");
    assert_eq!(id.sequence(), "31337");
    assert_eq!(job.state(), JobState::Submitted);

    let sent = fs::read_to_string(&captured).unwrap();
    assert_eq!(sent, job.script().unwrap());
    assert!(sent.contains("#PBS -W depend=afterany:100.fake-server\n"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_submission_failure_surfaces_diagnostic() {
    let work = tempfile::tempdir().unwrap();
    let client = fake_qsub(
        work.path(),
        "cat > /dev/null\nprintf 'qsub: invalid option' >&2\n",
    );

    let mut job = Qsub::new(JobConfig::new("broken").with_work_dir(work.path())).unwrap();
    job.add("echo hello").unwrap();

    match job.submit(&client, false).await {
        Err(SchedError::Submission(msg)) => assert_eq!(msg, "qsub: invalid option"),
        other => panic!("expected submission failure, got {other:?}"),
    }
    assert_eq!(job.state(), JobState::Building);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_render_never_spawns() {
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("ran");
    let client = fake_qsub(work.path(), &format!("touch '{}'\n", marker.display()));

    // No commands: rendering fails before the binary is started.
    let mut job = Qsub::new(JobConfig::new("empty").with_work_dir(work.path())).unwrap();
    assert!(matches!(
        job.submit(&client, false).await,
        Err(SchedError::TemplateRender(_))
    ));
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_manifest_to_submission() {
    let work = tempfile::tempdir().unwrap();
    let manifest = format!(
        "job:\n  name: sweep\n  ppn: 4\n  work_dir: {}\nsteps:\n  - parallel: [\"a 1\", \"a 2\"]\n  - run: b\n    per_node: 4\n",
        work.path().display()
    );
    let mut job = JobManifest::from_yaml_str(&manifest)
        .unwrap()
        .into_builder()
        .unwrap();

    let mock = MockSubmitter::with_server("cluster");
    let outcome = job.submit(&mock, false).await.unwrap();
    assert_eq!(outcome.to_string(), "1000.cluster");
    assert_ne!(outcome, SubmitOutcome::DryRun);

    let scripts = mock.scripts();
    assert_eq!(scripts.len(), 1);
    assert!(scripts[0].contains("#PBS -l nodes=1:ppn=4\n"));
    assert!(scripts[0].ends_with("mpiexec -npernode 4 time b\n"));
}
