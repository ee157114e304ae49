use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_EXTENSIONS, HarnessConfig};

/// Filters applied while building the watch set.
#[derive(Debug, Clone)]
pub struct WatchRules {
    /// File extensions to include.
    pub extensions: Vec<String>,
    /// Glob patterns to exclude (matched against the full path and against
    /// individual path components).
    pub exclude: Vec<String>,
}

impl Default for WatchRules {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
        }
    }
}

impl WatchRules {
    /// Rules from the harness config, optionally narrowed by a worker
    /// unit's own extension/exclude overrides.
    pub fn from_config(
        config: &HarnessConfig,
        extensions: Option<&[String]>,
        exclude: Option<&[String]>,
    ) -> Self {
        Self {
            extensions: extensions.unwrap_or(&config.extensions).to_vec(),
            exclude: exclude.unwrap_or(&config.exclude).to_vec(),
        }
    }
}

/// Walk the tree under `root` and collect every file with a watched
/// extension.
///
/// Respects `.gitignore` rules (also outside git repositories) and applies
/// the exclude globs from `rules`. Walk errors are reported as warnings and
/// skipped: watch-set discovery runs once per cycle and must never abort
/// the harness.
pub fn watch_set(root: &Path, rules: &WatchRules) -> Vec<PathBuf> {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(true)
        // Read .gitignore files even when the directory is not inside a git
        // repository, so exclusions work in standalone trees and tests.
        .require_git(false)
        .build();

    let mut files = Vec::new();

    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "watch-set walk error");
                continue;
            }
        };

        let path = entry.path();

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        if is_excluded(path, &rules.exclude) {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !rules.extensions.iter().any(|e| e == ext) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files
}

/// Returns true if `path` matches any exclusion glob.
fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if let Ok(matcher) = glob::Pattern::new(pattern)
            && matcher.matches(&path_str)
        {
            return true;
        }
        // Also check individual components, so `target` excludes
        // `target/debug/foo.rs` without needing a `**` pattern.
        for component in path.components() {
            if let Some(s) = component.as_os_str().to_str()
                && let Ok(matcher) = glob::Pattern::new(pattern)
                && matcher.matches(s)
            {
                return true;
            }
        }
    }

    false
}
