use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Source file extensions watched when neither the config file nor the
/// worker unit overrides them.
pub const DEFAULT_EXTENSIONS: &[&str] = &["rs", "rb", "py", "js", "ts", "go"];

/// Configuration loaded from `overmind.toml` at the project root.
///
/// Every field has a default, so a missing or broken config file never
/// prevents startup. Intervals are in milliseconds so tests can run the
/// watch and cooldown loops at millisecond pace.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Delay between filesystem polls while waiting for a change.
    pub poll_interval_ms: u64,
    /// Pause after a worker process exits before launching the next one.
    pub cooldown_ms: u64,
    /// Startup delay for the second lane when dual mode is enabled.
    pub stagger_ms: u64,
    /// Extensions of files placed on watch.
    pub extensions: Vec<String>,
    /// Glob patterns excluded from the watch set (beyond .gitignore rules).
    pub exclude: Vec<String>,
    /// Directory for the advisory worker-alive markers. Defaults to the
    /// system temp directory.
    pub marker_dir: Option<PathBuf>,
    pub notify: NotifyConfig,
}

/// Icons handed to the desktop notification sink. Plain freedesktop icon
/// names by default; absolute paths to image assets also work.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub pass_icon: String,
    pub fail_icon: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            cooldown_ms: 5_000,
            stagger_ms: 15_000,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            marker_dir: None,
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            pass_icon: "face-smile".to_string(),
            fail_icon: "face-sad".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from `overmind.toml` in the given root directory.
    ///
    /// Returns the default configuration if the file does not exist or
    /// cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join("overmind.toml");

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("warning: failed to parse overmind.toml: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!("warning: failed to read overmind.toml: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn marker_dir(&self) -> PathBuf {
        self.marker_dir.clone().unwrap_or_else(std::env::temp_dir)
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

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tmp();
        let config = HarnessConfig::load(dir.path());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.cooldown(), Duration::from_secs(5));
        assert_eq!(config.stagger(), Duration::from_secs(15));
        assert!(config.extensions.contains(&"rs".to_string()));
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let dir = tmp();
        fs::write(
            dir.path().join("overmind.toml"),
            "poll_interval_ms = 250\nextensions = [\"rb\"]\n",
        )
        .unwrap();

        let config = HarnessConfig::load(dir.path());
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.extensions, vec!["rb".to_string()]);
        assert_eq!(config.cooldown_ms, 5_000);
    }

    #[test]
    fn test_load_broken_file_falls_back() {
        let dir = tmp();
        fs::write(dir.path().join("overmind.toml"), "poll_interval_ms = [").unwrap();
        let config = HarnessConfig::load(dir.path());
        assert_eq!(config.poll_interval_ms, 1_000);
    }

    #[test]
    fn test_notify_section() {
        let dir = tmp();
        fs::write(
            dir.path().join("overmind.toml"),
            "[notify]\nfail_icon = \"/opt/icons/red.png\"\n",
        )
        .unwrap();

        let config = HarnessConfig::load(dir.path());
        assert_eq!(config.notify.fail_icon, "/opt/icons/red.png");
        assert_eq!(config.notify.pass_icon, "face-smile");
    }
}
