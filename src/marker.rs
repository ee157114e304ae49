use std::path::{Path, PathBuf};

/// Advisory worker-alive marker for one lane.
///
/// External monitors read it to see that a worker run is in flight; the
/// harness itself never reads it back, so races are harmless. Writes go
/// through a temp file plus rename so a reader never observes a partial
/// marker. All operations are best-effort.
#[derive(Debug, Clone)]
pub struct LivenessMarker {
    path: PathBuf,
}

impl LivenessMarker {
    pub fn for_lane(dir: &Path, lane: usize) -> Self {
        Self {
            path: dir.join(format!("overmind-worker-{lane}.alive")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the marker atomically. Content is a single `pid timestamp`
    /// line for the benefit of whoever is watching.
    pub fn write(&self) {
        let stamp = format!(
            "{} {}\n",
            std::process::id(),
            chrono::Utc::now().timestamp()
        );
        let tmp = self.path.with_extension(format!("tmp.{}", std::process::id()));

        if let Err(err) =
            std::fs::write(&tmp, stamp).and_then(|()| std::fs::rename(&tmp, &self.path))
        {
            tracing::debug!(error = %err, path = %self.path.display(), "liveness marker write failed");
            let _ = std::fs::remove_file(&tmp);
        }
    }

    /// Remove the marker. Idempotent; a missing marker is not an error.
    pub fn clear(&self) {
        if let Err(err) = std::fs::remove_file(&self.path)
            && err.kind() != std::io::ErrorKind::NotFound
        {
            tracing::debug!(error = %err, path = %self.path.display(), "liveness marker clear failed");
        }
    }
}
