//! Directive command implementation.
//!
//! Prints one `#PBS` line, for use from shell scripts.

use std::path::Path;

use anyhow::Result;

use qsubkit_sched::pbs::directives::{self, split_jobids};
use qsubkit_sched::{Delay, DependKind, Relation};

/// Arguments of the delay directive.
pub struct DelayArgs {
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: u32,
    pub minute: u32,
    pub second: Option<u32>,
}

/// Execute `directive mail`.
pub fn execute_mail(begin: bool, end: bool, abort: bool) -> Result<()> {
    println!("{}", directives::mail_option(begin, end, abort));
    Ok(())
}

/// Execute `directive stdout`.
pub fn execute_stdout(path: &Path) -> Result<()> {
    println!("{}", directives::stdout_option(path));
    Ok(())
}

/// Execute `directive stderr`.
pub fn execute_stderr(path: &Path) -> Result<()> {
    println!("{}", directives::stderr_option(path));
    Ok(())
}

/// Execute `directive depend`.
pub fn execute_depend(jobids: &[String], relation: &str, kind: &str) -> Result<()> {
    let ids: Vec<String> = jobids.iter().flat_map(|s| split_jobids(s)).collect();
    println!(
        "{}",
        directives::dependency_option(&ids, parse_relation(relation)?, parse_kind(kind)?)?
    );
    Ok(())
}

/// Execute `directive threads`.
pub fn execute_threads(n: u32) -> Result<()> {
    println!("{}", directives::env_threads_option(n)?);
    Ok(())
}

/// Execute `directive delay`.
pub fn execute_delay(args: DelayArgs) -> Result<()> {
    let delay = Delay {
        year: args.year,
        month: args.month,
        day: args.day,
        hour: args.hour,
        minute: args.minute,
        second: args.second,
    };
    println!("{}", directives::delay_option(&delay)?);
    Ok(())
}

fn parse_relation(relation: &str) -> Result<Relation> {
    match relation.to_lowercase().as_str() {
        "after" => Ok(Relation::After),
        "before" => Ok(Relation::Before),
        other => anyhow::bail!("Unknown relation: '{other}'. Available: after, before"),
    }
}

fn parse_kind(kind: &str) -> Result<DependKind> {
    match kind.to_lowercase().as_str() {
        "any" => Ok(DependKind::Any),
        "ok" => Ok(DependKind::Ok),
        "notok" => Ok(DependKind::NotOk),
        other => anyhow::bail!("Unknown dependency type: '{other}'. Available: any, ok, notok"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relation() {
        assert_eq!(parse_relation("after").unwrap(), Relation::After);
        assert_eq!(parse_relation("BEFORE").unwrap(), Relation::Before);
        assert!(parse_relation("during").is_err());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("any").unwrap(), DependKind::Any);
        assert_eq!(parse_kind("notok").unwrap(), DependKind::NotOk);
        assert!(parse_kind("maybe").is_err());
    }

    #[test]
    fn test_depend_rejects_blank_ids() {
        assert!(execute_depend(&[":".to_string()], "after", "any").is_err());
    }
}
