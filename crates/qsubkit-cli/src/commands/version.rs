//! Version command implementation.

use console::style;

/// Environment variable that overrides the submission binary.
const QSUB_ENV: &str = "QSUBKIT_QSUB";

/// Build metadata and the effective submission binary, one item per line.
pub fn details() -> Vec<(&'static str, String)> {
    let qsub = std::env::var(QSUB_ENV).unwrap_or_else(|_| "qsub".to_string());
    vec![
        ("sched", format!("qsubkit-sched {}", env!("CARGO_PKG_VERSION"))),
        ("qsub", format!("{qsub} (override with {QSUB_ENV})")),
        ("source", env!("CARGO_PKG_REPOSITORY").to_string()),
        ("license", env!("CARGO_PKG_LICENSE").to_string()),
    ]
}

/// Execute the version command.
pub fn execute() {
    println!(
        "{} {}",
        style("qsubkit").cyan().bold(),
        style(env!("CARGO_PKG_VERSION")).yellow()
    );
    for (key, value) in details() {
        println!("  {:<8} {}", style(key).dim(), value);
    }
}
