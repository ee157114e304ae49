use std::path::PathBuf;

use clap::Parser;

/// Continuous test harness.
///
/// Keeps a warm worker process lurking in the background; when the watched
/// source tree changes and settles, the worker runs the suite, its report
/// is streamed and classified, and a desktop notification announces the
/// verdict.
#[derive(Parser, Debug)]
#[command(name = "overmind", version, about, long_about = None)]
pub struct Cli {
    /// Worker unit file declaring the available workers (TOML).
    pub unit: PathBuf,

    /// Name of the worker to instantiate from the unit file.
    pub worker: String,

    /// Program used to launch worker processes (defaults to this
    /// executable).
    #[arg(long)]
    pub runner: Option<PathBuf>,

    /// Supervise a second, independent lane concurrently.
    #[arg(long)]
    pub dual: bool,

    /// Internal: run the child-side worker lifecycle and exit after one
    /// run.
    #[arg(long, hide = true)]
    pub lurk: bool,

    /// Internal: lane index for this worker process.
    #[arg(long, hide = true, default_value_t = 0)]
    pub lane: usize,
}
