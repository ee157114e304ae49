pub mod stream;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::config::HarnessConfig;
use crate::marker::LivenessMarker;
use crate::notify::Notifier;
use crate::report::{self, Verdict};
use crate::shutdown::ShutdownToken;
use crate::watcher::{ChangeWatcher, SettleOutcome};
use crate::worker::WorkerUnit;
use stream::{EchoSink, ProgressEcho};

/// Identity of one supervision lane. Labels log output and seeds the
/// per-lane marker filename.
#[derive(Debug, Clone, Copy)]
pub struct LaneState {
    pub index: usize,
}

/// Launch recipe for a worker process.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    /// Command re-invoking this harness (or an alternate runner) in child
    /// mode for the given unit, worker, and lane.
    pub fn for_child(
        runner: Option<&Path>,
        unit: &Path,
        worker: &str,
        lane: usize,
    ) -> Result<Self> {
        let program = match runner {
            Some(path) => path.to_path_buf(),
            None => std::env::current_exe().context("failed to locate current executable")?,
        };
        Ok(Self {
            program,
            args: vec![
                unit.display().to_string(),
                worker.to_string(),
                "--lurk".to_string(),
                "--lane".to_string(),
                lane.to_string(),
            ],
        })
    }
}

/// One finished (or interrupted) worker invocation.
#[derive(Debug)]
pub struct WorkerRun {
    /// Everything the worker wrote, stdout and stderr combined.
    pub transcript: String,
    /// Exit status; `None` when the run was cancelled mid-stream.
    pub status: Option<std::process::ExitStatus>,
    pub cancelled: bool,
}

/// Echoes worker output to the console while accumulating the transcript.
/// Character-mode bytes are flushed one by one so progress dots appear the
/// instant the suite prints them.
struct ConsoleSink {
    transcript: Vec<u8>,
}

impl ConsoleSink {
    fn new() -> Self {
        Self {
            transcript: Vec::new(),
        }
    }

    fn err_line(&mut self, line: &str) {
        eprintln!("{line}");
        self.transcript.extend_from_slice(line.as_bytes());
        self.transcript.push(b'\n');
    }

    fn into_transcript(self) -> String {
        String::from_utf8_lossy(&self.transcript).into_owned()
    }
}

impl EchoSink for ConsoleSink {
    fn line(&mut self, line: &str) {
        println!("{line}");
        self.transcript.extend_from_slice(line.as_bytes());
        self.transcript.push(b'\n');
    }

    fn byte(&mut self, byte: u8) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(&[byte]);
        let _ = stdout.flush();
        self.transcript.push(byte);
    }
}

/// Launch the worker process and consume its output live until it exits.
///
/// Stdout runs through the [`ProgressEcho`] state machine; stderr is
/// relayed line-wise. Both land in one transcript. On shutdown the child
/// is killed and whatever accumulated is returned with `cancelled` set.
pub async fn stream_worker(
    command: &WorkerCommand,
    shutdown: &ShutdownToken,
) -> Result<WorkerRun> {
    let mut child = tokio::process::Command::new(&command.program)
        .args(&command.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to launch worker `{}`", command.program.display()))?;

    let stdout = child.stdout.take().context("worker stdout not captured")?;
    let stderr = child.stderr.take().context("worker stderr not captured")?;

    let mut out = stdout;
    let mut err_lines = BufReader::new(stderr).lines();

    let mut echo = ProgressEcho::new();
    let mut sink = ConsoleSink::new();
    let mut buf = [0u8; 4096];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = out.read(&mut buf), if out_open => match read {
                Ok(0) => out_open = false,
                Ok(n) => echo.feed(&buf[..n], &mut sink),
                Err(err) => {
                    tracing::warn!(error = %err, "worker stdout read failed");
                    out_open = false;
                }
            },
            line = err_lines.next_line(), if err_open => match line {
                Ok(Some(line)) => sink.err_line(&line),
                Ok(None) => err_open = false,
                Err(err) => {
                    tracing::warn!(error = %err, "worker stderr read failed");
                    err_open = false;
                }
            },
            _ = shutdown.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                echo.finish(&mut sink);
                return Ok(WorkerRun {
                    transcript: sink.into_transcript(),
                    status: None,
                    cancelled: true,
                });
            }
        }
    }

    echo.finish(&mut sink);

    let status = tokio::select! {
        status = child.wait() => Some(status.context("failed waiting for worker")?),
        _ = shutdown.cancelled() => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            None
        }
    };

    Ok(WorkerRun {
        transcript: sink.into_transcript(),
        cancelled: status.is_none(),
        status,
    })
}

/// Supervises one lane: clears the stale marker, spawns a warm worker,
/// streams its run, classifies the transcript, notifies, cools down, and
/// goes again until shutdown.
pub struct LaneSupervisor {
    lane: LaneState,
    config: HarnessConfig,
    command: WorkerCommand,
    worker: Box<dyn WorkerUnit>,
    notifier: Notifier,
    marker: LivenessMarker,
}

impl LaneSupervisor {
    pub fn new(
        lane: usize,
        config: HarnessConfig,
        command: WorkerCommand,
        worker: Box<dyn WorkerUnit>,
    ) -> Self {
        let marker = LivenessMarker::for_lane(&config.marker_dir(), lane);
        let notifier = Notifier::new(&config.notify);
        Self {
            lane: LaneState { index: lane },
            config,
            command,
            worker,
            notifier,
            marker,
        }
    }

    pub async fn run(&self, shutdown: ShutdownToken) {
        tracing::info!(lane = self.lane.index, "lane starting");

        while !shutdown.is_cancelled() {
            self.marker.clear();

            match stream_worker(&self.command, &shutdown).await {
                Ok(run) if run.cancelled => break,
                Ok(run) => {
                    self.marker.clear();
                    self.process_run(&run).await;
                }
                Err(err) => {
                    tracing::warn!(lane = self.lane.index, error = %err, "worker launch failed");
                }
            }

            // Cooldown keeps a crash-looping worker from thrashing.
            if shutdown.cancelled_within(self.config.cooldown()).await {
                break;
            }
        }

        self.marker.clear();
        tracing::info!(lane = self.lane.index, "lane stopped");
    }

    async fn process_run(&self, run: &WorkerRun) {
        if let Some(status) = run.status {
            tracing::debug!(lane = self.lane.index, %status, "worker exited");
        }

        match report::classify(&run.transcript) {
            Some(outcome) => {
                tracing::info!(
                    lane = self.lane.index,
                    kind = ?outcome.kind,
                    run = outcome.counts.run,
                    failures = outcome.counts.failures,
                    errors = outcome.counts.errors,
                    "worker run classified"
                );
                match outcome.verdict {
                    Verdict::Pass => self.notifier.notify_pass(&outcome).await,
                    Verdict::Fail => self.notifier.notify_fail(&outcome).await,
                }
            }
            None => {
                tracing::debug!(
                    lane = self.lane.index,
                    "no recognizable summary in worker output"
                );
            }
        }

        self.worker.on_results(&run.transcript);
    }
}

/// Child-side lifecycle: load, prepare, lurk until a settled change, run
/// the suite once, sign off. The supervising lane classifies the output
/// after exit and spawns the next warm worker.
pub async fn lurk(
    worker: &dyn WorkerUnit,
    lane: usize,
    config: &HarnessConfig,
    shutdown: &ShutdownToken,
) -> Result<()> {
    println!("OVERMIND IS LOADING");
    let watcher = ChangeWatcher::new(|| worker.files(), config.poll_interval());
    println!("watching {} files", watcher.snapshot().len());

    println!("STARTING PREPARE PHASE");
    worker.prepare().await?;

    println!("LURKING IN THE BACKGROUND");
    match watcher.wait_for_settled_change(shutdown).await {
        SettleOutcome::Cancelled => {
            println!("The End");
            return Ok(());
        }
        SettleOutcome::Settled { .. } => {}
    }

    // Wipe the screen and stamp the time so a human sees where this run
    // begins.
    print!("\x1b[2J\x1b[1;1H");
    println!("{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = std::io::stdout().flush();

    let marker = LivenessMarker::for_lane(&config.marker_dir(), lane);
    marker.write();
    let work = worker.main_work().await;
    marker.clear();
    work?;

    println!("done");
    println!("The End");
    Ok(())
}
