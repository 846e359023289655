//! qsubkit Command-Line Interface
//!
//! Builds PBS job scripts from manifests or key=value pairs and submits them
//! through `qsub`.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{directive, fill, render, submit, version};

/// qsubkit - compose and submit PBS batch jobs
#[derive(Parser)]
#[command(name = "qsubkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the job script described by a manifest
    Render {
        /// Job manifest (YAML or JSON)
        manifest: PathBuf,
    },

    /// Render a manifest and submit it with qsub
    Submit {
        /// Job manifest (YAML or JSON)
        manifest: PathBuf,

        /// Build the job but do not submit it
        #[arg(long)]
        dry_run: bool,

        /// Submission binary
        #[arg(long, env = "QSUBKIT_QSUB", default_value = "qsub")]
        qsub: PathBuf,

        /// Give up on qsub after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print only the numeric part of the job ID
        #[arg(long)]
        sequence_only: bool,
    },

    /// Fill the script template from key=value pairs and submit it
    Fill {
        /// Template fields: jobname, n_nodes, n_ppn, walltime, options, script, work_dir, profile
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,

        /// Print the script without submitting it
        #[arg(long)]
        dry_run: bool,

        /// Submission binary
        #[arg(long, env = "QSUBKIT_QSUB", default_value = "qsub")]
        qsub: PathBuf,
    },

    /// Print a single PBS directive line
    Directive {
        #[command(subcommand)]
        kind: DirectiveKind,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum DirectiveKind {
    /// Mail notification (-m)
    Mail {
        /// Mail when the job begins
        #[arg(long)]
        begin: bool,

        /// Mail when the job ends
        #[arg(long)]
        end: bool,

        /// Mail when the job aborts
        #[arg(long)]
        abort: bool,
    },

    /// Standard output path (-o)
    Stdout { path: PathBuf },

    /// Standard error path (-e)
    Stderr { path: PathBuf },

    /// Dependency on other jobs (-W depend=)
    Depend {
        /// Job IDs; colon-joined lists are split
        #[arg(required = true)]
        jobids: Vec<String>,

        /// Relation to the listed jobs
        #[arg(long, default_value = "after", value_parser = ["after", "before"])]
        relation: String,

        /// Which termination releases the dependency
        #[arg(long = "type", default_value = "any", value_parser = ["any", "ok", "notok"])]
        kind: String,
    },

    /// Export OMP_NUM_THREADS (-v)
    Threads { n: u32 },

    /// Deferred start (-a)
    Delay {
        #[arg(long)]
        hour: u32,

        #[arg(long, default_value = "0")]
        minute: u32,

        #[arg(long)]
        second: Option<u32>,

        #[arg(long)]
        year: Option<u32>,

        #[arg(long)]
        month: Option<u32>,

        #[arg(long)]
        day: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Render { manifest } => render::execute(&manifest),

        Commands::Submit {
            manifest,
            dry_run,
            qsub,
            timeout,
            sequence_only,
        } => submit::execute(&manifest, dry_run, qsub, timeout, sequence_only).await,

        Commands::Fill {
            pairs,
            dry_run,
            qsub,
        } => fill::execute(&pairs, dry_run, qsub).await,

        Commands::Directive { kind } => match kind {
            DirectiveKind::Mail { begin, end, abort } => directive::execute_mail(begin, end, abort),
            DirectiveKind::Stdout { path } => directive::execute_stdout(&path),
            DirectiveKind::Stderr { path } => directive::execute_stderr(&path),
            DirectiveKind::Depend {
                jobids,
                relation,
                kind,
            } => directive::execute_depend(&jobids, &relation, &kind),
            DirectiveKind::Threads { n } => directive::execute_threads(n),
            DirectiveKind::Delay {
                hour,
                minute,
                second,
                year,
                month,
                day,
            } => directive::execute_delay(directive::DelayArgs {
                year,
                month,
                day,
                hour,
                minute,
                second,
            }),
        },

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
