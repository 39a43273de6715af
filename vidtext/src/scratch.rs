use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use tracing::warn;

use crate::error::Result;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A per-invocation temp directory, removed with everything in it when dropped.
///
/// Names are unique per process and per call, so concurrent requests never
/// share a directory.
pub(crate) struct ScratchDir(PathBuf);

impl ScratchDir {
    pub(crate) fn new(prefix: &str) -> Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "{prefix}-{}-{nanos}-{seq}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir)?;
        Ok(Self(dir))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.0) {
                warn!(path = %self.0.display(), error = %e, "failed to clean up temp dir");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_on_drop() {
        let path = {
            let scratch = ScratchDir::new("vidtext-test-scratch").unwrap();
            std::fs::write(scratch.path().join("f"), "x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_unique_names() {
        let a = ScratchDir::new("vidtext-test-unique").unwrap();
        let b = ScratchDir::new("vidtext-test-unique").unwrap();
        assert_ne!(a.path(), b.path());
    }
}
