mod cli;
mod config;
mod marker;
mod notify;
mod orchestrator;
mod report;
mod shutdown;
mod supervisor;
mod walker;
mod watcher;
mod worker;

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use config::HarnessConfig;
use orchestrator::LaunchOptions;
use worker::WorkerRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = HarnessConfig::load(Path::new("."));

    if cli.lurk {
        // Child mode: one load → prepare → lurk → run pass, then exit so
        // the supervising lane can classify the transcript.
        let worker = WorkerRegistry::builtin().build(&cli.unit, &cli.worker, &config)?;
        let (handle, token) = shutdown::channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.trigger();
            }
        });
        supervisor::lurk(worker.as_ref(), cli.lane, &config, &token).await
    } else {
        let opts = LaunchOptions {
            unit: cli.unit,
            worker: cli.worker,
            runner: cli.runner,
            dual: cli.dual,
        };
        orchestrator::run(&opts, &config).await
    }
}
