use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::HarnessConfig;
use crate::walker::{self, WatchRules};

use super::{WorkerSpec, WorkerUnit};

/// Built-in worker kind that runs a configured command as the suite.
///
/// The command inherits stdio, so its report (the `Started` line, the
/// progress dots, the summary) flows straight out of the worker process to
/// the supervising lane. A non-zero exit is not an error here: failing
/// suites exit non-zero, and the verdict comes from the report text.
#[derive(Debug)]
pub struct CommandWorker {
    name: String,
    command: Vec<String>,
    truncate: Vec<PathBuf>,
    rules: WatchRules,
    root: PathBuf,
}

impl CommandWorker {
    pub fn construct(
        name: &str,
        spec: &WorkerSpec,
        config: &HarnessConfig,
    ) -> Result<Box<dyn WorkerUnit>> {
        if spec.command.is_empty() {
            bail!("worker `{name}` has an empty command");
        }

        Ok(Box::new(Self {
            name: name.to_string(),
            command: spec.command.clone(),
            truncate: spec.truncate.clone(),
            rules: WatchRules::from_config(
                config,
                spec.extensions.as_deref(),
                spec.exclude.as_deref(),
            ),
            root: PathBuf::from("."),
        }))
    }
}

#[async_trait]
impl WorkerUnit for CommandWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn files(&self) -> Vec<PathBuf> {
        walker::watch_set(&self.root, &self.rules)
    }

    async fn prepare(&self) -> Result<()> {
        for path in &self.truncate {
            let target = self.root.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::File::create(&target)
                .with_context(|| format!("failed to truncate {}", target.display()))?;
            tracing::debug!(path = %target.display(), "truncated log file");
        }
        Ok(())
    }

    async fn main_work(&self) -> Result<()> {
        let status = tokio::process::Command::new(&self.command[0])
            .args(&self.command[1..])
            .current_dir(&self.root)
            .status()
            .await
            .with_context(|| format!("failed to launch suite command `{}`", self.command[0]))?;

        if !status.success() {
            tracing::debug!(%status, "suite command exited non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn spec(command: &[&str], truncate: &[&str]) -> WorkerSpec {
        WorkerSpec {
            kind: "command".to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            truncate: truncate.iter().map(PathBuf::from).collect(),
            extensions: Some(vec!["rs".to_string()]),
            exclude: None,
        }
    }

    /// CommandWorker rooted in the test sandbox instead of the cwd.
    fn build(dir: &TempDir, command: &[&str], truncate: &[&str]) -> CommandWorker {
        CommandWorker {
            name: "w".to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            truncate: truncate.iter().map(PathBuf::from).collect(),
            rules: WatchRules {
                extensions: vec!["rs".to_string()],
                exclude: Vec::new(),
            },
            root: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = CommandWorker::construct("w", &spec(&[], &[]), &HarnessConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("empty command"));
    }

    #[test]
    fn test_files_uses_watch_rules() {
        let dir = tmp();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();

        let worker = build(&dir, &["true"], &[]);
        let files = worker.files();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.rs"));
    }

    #[tokio::test]
    async fn test_prepare_truncates_logs() {
        let dir = tmp();
        let log = dir.path().join("log").join("test.log");
        fs::create_dir_all(log.parent().unwrap()).unwrap();
        fs::write(&log, "old noise\n").unwrap();

        let worker = build(&dir, &["true"], &["log/test.log"]);
        worker.prepare().await.expect("prepare");

        assert_eq!(fs::metadata(&log).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_prepare_creates_missing_log() {
        let dir = tmp();
        let worker = build(&dir, &["true"], &["log/test.log"]);
        worker.prepare().await.expect("prepare");
        assert!(dir.path().join("log/test.log").exists());
    }

    #[tokio::test]
    async fn test_main_work_tolerates_failing_suite() {
        let dir = tmp();
        let worker = build(&dir, &["false"], &[]);
        worker.main_work().await.expect("non-zero exit is not an error");
    }

    #[tokio::test]
    async fn test_main_work_errors_on_unlaunchable_command() {
        let dir = tmp();
        let worker = build(&dir, &["definitely-not-a-real-binary-7f3a"], &[]);
        assert!(worker.main_work().await.is_err());
    }
}
