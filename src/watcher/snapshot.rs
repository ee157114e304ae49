use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Last-observed modification times for the watched files.
///
/// Keys are exactly the watch set as it existed when the snapshot was
/// captured; a path that could not be stat'ed (already gone, permission
/// race) is simply absent. Rebuilt from scratch on every capture; the
/// map is never patched in place.
#[derive(Debug, Clone, Default)]
pub struct FileSnapshot {
    entries: BTreeMap<PathBuf, SystemTime>,
}

impl FileSnapshot {
    /// Record the current modification time of every path in `paths`.
    pub fn capture(paths: &[PathBuf]) -> Self {
        let mut entries = BTreeMap::new();
        for path in paths {
            if let Ok(meta) = std::fs::metadata(path)
                && let Ok(mtime) = meta.modified()
            {
                entries.insert(path.clone(), mtime);
            }
        }
        Self { entries }
    }

    pub fn mtime(&self, path: &Path) -> Option<SystemTime> {
        self.entries.get(path).copied()
    }

    /// Recorded paths in deterministic (sorted) order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Overwrite the recorded mtime for one path. Test hook for building
    /// snapshots that predate the filesystem state.
    #[cfg(test)]
    pub(crate) fn record(&mut self, path: PathBuf, mtime: SystemTime) {
        self.entries.insert(path, mtime);
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
    fn test_capture_records_existing_files() {
        let dir = tmp();
        let a = dir.path().join("a.rs");
        let b = dir.path().join("b.rs");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let snap = FileSnapshot::capture(&[a.clone(), b.clone()]);
        assert_eq!(snap.len(), 2);
        assert!(snap.mtime(&a).is_some());
        assert!(snap.mtime(&b).is_some());
    }

    #[test]
    fn test_capture_skips_missing_files() {
        let dir = tmp();
        let present = dir.path().join("present.rs");
        let ghost = dir.path().join("ghost.rs");
        fs::write(&present, "x").unwrap();

        let snap = FileSnapshot::capture(&[present.clone(), ghost.clone()]);
        assert_eq!(snap.len(), 1);
        assert!(snap.mtime(&present).is_some());
        assert!(snap.mtime(&ghost).is_none());
    }

    #[test]
    fn test_paths_are_sorted() {
        let dir = tmp();
        let z = dir.path().join("z.rs");
        let a = dir.path().join("a.rs");
        fs::write(&z, "").unwrap();
        fs::write(&a, "").unwrap();

        let snap = FileSnapshot::capture(&[z.clone(), a.clone()]);
        let order: Vec<_> = snap.paths().cloned().collect();
        assert_eq!(order, vec![a, z]);
    }
}
