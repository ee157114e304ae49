use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::config::HarnessConfig;
use crate::shutdown::{self, ShutdownToken};
use crate::supervisor::{LaneSupervisor, WorkerCommand};
use crate::worker::WorkerRegistry;

/// Validated launch arguments for the supervising side.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub unit: PathBuf,
    pub worker: String,
    pub runner: Option<PathBuf>,
    pub dual: bool,
}

/// Start the supervision lanes and run until the operator interrupts.
///
/// Lane 0 starts immediately; with `--dual`, lane 1 follows after the
/// stagger delay so both warm workers do not fight over startup resources.
pub async fn run(opts: &LaunchOptions, config: &HarnessConfig) -> Result<()> {
    let (handle, token) = shutdown::channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            handle.trigger();
        }
    });

    let registry = WorkerRegistry::builtin();
    let lanes = if opts.dual { 2 } else { 1 };

    run_lanes(lanes, config.stagger(), &token, |lane| {
        let command = WorkerCommand::for_child(
            opts.runner.as_deref(),
            &opts.unit,
            &opts.worker,
            lane,
        )?;
        let worker = registry.build(&opts.unit, &opts.worker, config)?;
        let supervisor = LaneSupervisor::new(lane, config.clone(), command, worker);
        let lane_token = token.clone();
        Ok(async move { supervisor.run(lane_token).await })
    })
    .await
}

/// Launch `lanes` supervision futures, sleeping the stagger delay before
/// each lane after the first, then wait for all of them.
async fn run_lanes<F, Fut>(
    lanes: usize,
    stagger: Duration,
    shutdown: &ShutdownToken,
    mut launch: F,
) -> Result<()>
where
    F: FnMut(usize) -> Result<Fut>,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut tasks = Vec::new();

    for lane in 0..lanes {
        if lane > 0 {
            tracing::info!(lane, "staggering lane startup");
            if shutdown.cancelled_within(stagger).await {
                break;
            }
        }
        tasks.push(tokio::spawn(launch(lane)?));
    }

    for task in tasks {
        if let Err(err) = task.await {
            tracing::error!(error = %err, "lane task failed");
        }
    }

    Ok(())
}
