pub mod command;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::HarnessConfig;
use crate::walker::{self, WatchRules};

/// The pluggable unit of work a lane supervises.
///
/// `main_work` is the only required method: it runs the actual suite and
/// prints its status lines (the `Started` line, progress, and the summary)
/// to stdout, where the supervising lane streams and classifies them.
#[async_trait]
pub trait WorkerUnit: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Paths this worker wants watched. Default: every file with a
    /// recognized source extension under the working tree, recursively.
    fn files(&self) -> Vec<PathBuf> {
        walker::watch_set(Path::new("."), &WatchRules::default())
    }

    /// Environment setup before lurking (log truncation and the like).
    /// Errors are not handled specially; they fail the cycle and the
    /// supervisor starts over.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn main_work(&self) -> Result<()>;

    /// Hook invoked with the full transcript once a run's output has been
    /// collected, whether or not it classified.
    fn on_results(&self, _transcript: &str) {}
}

/// One worker definition from a unit file.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSpec {
    /// Registry key selecting the worker implementation.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Argv of the suite command, for kinds that run one.
    #[serde(default)]
    pub command: Vec<String>,
    /// Log files truncated during the prepare phase.
    #[serde(default)]
    pub truncate: Vec<PathBuf>,
    /// Watch-set extension override.
    pub extensions: Option<Vec<String>>,
    /// Watch-set exclude override.
    pub exclude: Option<Vec<String>>,
}

fn default_kind() -> String {
    "command".to_string()
}

/// A worker unit file: named worker definitions under `[workers.<name>]`.
#[derive(Debug, Deserialize)]
pub struct UnitFile {
    #[serde(default)]
    pub workers: BTreeMap<String, WorkerSpec>,
}

impl UnitFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read worker unit file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse worker unit file {}", path.display()))
    }
}

type Constructor = fn(&str, &WorkerSpec, &HarnessConfig) -> Result<Box<dyn WorkerUnit>>;

/// Maps worker kinds to constructors. Startup resolves the unit file's
/// `kind` field here instead of loading code dynamically.
pub struct WorkerRegistry {
    kinds: BTreeMap<&'static str, Constructor>,
}

impl WorkerRegistry {
    pub fn builtin() -> Self {
        let mut kinds: BTreeMap<&'static str, Constructor> = BTreeMap::new();
        kinds.insert("command", command::CommandWorker::construct);
        Self { kinds }
    }

    /// Load `unit_path` and instantiate the worker named `worker_name`.
    pub fn build(
        &self,
        unit_path: &Path,
        worker_name: &str,
        config: &HarnessConfig,
    ) -> Result<Box<dyn WorkerUnit>> {
        let unit = UnitFile::load(unit_path)?;
        let spec = unit.workers.get(worker_name).with_context(|| {
            format!(
                "worker `{worker_name}` is not defined in {} (available: {})",
                unit_path.display(),
                unit.workers
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;
        let constructor = self
            .kinds
            .get(spec.kind.as_str())
            .with_context(|| format!("unknown worker kind `{}`", spec.kind))?;
        constructor(worker_name, spec, config)
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

    fn write_unit(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("workers.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_build_command_worker() {
        let dir = tmp();
        let unit = write_unit(
            dir.path(),
            r#"
[workers.unit-tests]
command = ["true"]
truncate = ["log/test.log"]
extensions = ["rs"]
"#,
        );

        let registry = WorkerRegistry::builtin();
        let worker = registry
            .build(&unit, "unit-tests", &HarnessConfig::default())
            .expect("build worker");
        assert_eq!(worker.name(), "unit-tests");
    }

    #[test]
    fn test_kind_defaults_to_command() {
        let dir = tmp();
        let unit = write_unit(dir.path(), "[workers.w]\ncommand = [\"true\"]\n");

        let unit_file = UnitFile::load(&unit).unwrap();
        assert_eq!(unit_file.workers["w"].kind, "command");
    }

    #[test]
    fn test_unknown_worker_name_errors() {
        let dir = tmp();
        let unit = write_unit(dir.path(), "[workers.present]\ncommand = [\"true\"]\n");

        let err = WorkerRegistry::builtin()
            .build(&unit, "absent", &HarnessConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("absent"));
        assert!(err.to_string().contains("present"));
    }

    #[test]
    fn test_unknown_kind_errors() {
        let dir = tmp();
        let unit = write_unit(
            dir.path(),
            "[workers.w]\nkind = \"telepathy\"\ncommand = [\"true\"]\n",
        );

        let err = WorkerRegistry::builtin()
            .build(&unit, "w", &HarnessConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("telepathy"));
    }

    #[test]
    fn test_missing_unit_file_errors() {
        let dir = tmp();
        let err = WorkerRegistry::builtin()
            .build(&dir.path().join("nope.toml"), "w", &HarnessConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
