//! Artifact persistence and retention
//!
//! Each capture produces a `{id}.mhtml` snapshot and a `{id}.png` screenshot
//! under a single storage root. A background sweep deletes artifacts older
//! than the retention window; it never blocks request handling and tolerates
//! files vanishing between listing and deletion.

use crate::CaptureError;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Which half of an artifact pair to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Markup,
    Screenshot,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Markup => "mhtml",
            ArtifactKind::Screenshot => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Markup => "message/rfc822",
            ArtifactKind::Screenshot => "image/png",
        }
    }
}

/// One stored file, as seen by the sweep and the listing command.
#[derive(Debug, Clone)]
pub struct ArtifactEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Filesystem-backed artifact store rooted at a single directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the root directory if absent. Idempotent and
    /// safe to call at startup.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str, kind: ArtifactKind) -> PathBuf {
        self.root.join(format!("{}.{}", id, kind.extension()))
    }

    /// Persist both halves of an artifact pair.
    ///
    /// If the second write fails, the first is removed so a failed capture
    /// never leaves a partial pair behind.
    pub async fn save(
        &self,
        id: &str,
        markup_snapshot: &str,
        screenshot: &[u8],
    ) -> Result<(), CaptureError> {
        let markup_path = self.path_for(id, ArtifactKind::Markup);
        tokio::fs::write(&markup_path, markup_snapshot).await?;
        debug!(
            "Wrote {} bytes to {}",
            markup_snapshot.len(),
            markup_path.display()
        );

        let screenshot_path = self.path_for(id, ArtifactKind::Screenshot);
        if let Err(e) = tokio::fs::write(&screenshot_path, screenshot).await {
            let _ = tokio::fs::remove_file(&markup_path).await;
            return Err(e.into());
        }
        debug!(
            "Wrote {} bytes to {}",
            screenshot.len(),
            screenshot_path.display()
        );

        Ok(())
    }

    /// Resolve the stored path for a download.
    pub async fn fetch(&self, id: &str, kind: ArtifactKind) -> Result<PathBuf, CaptureError> {
        let path = self.path_for(id, kind);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(path),
            Ok(false) => Err(CaptureError::ArtifactNotFound(
                path.display().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete both halves of an artifact pair, ignoring missing files.
    /// Used to clean up after failed captures.
    pub async fn remove(&self, id: &str) {
        for kind in [ArtifactKind::Markup, ArtifactKind::Screenshot] {
            let path = self.path_for(id, kind);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed partial artifact {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }

    /// List stored files with sizes and modification times.
    pub async fn list(&self) -> Result<Vec<ArtifactEntry>, CaptureError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = metadata.modified().map(DateTime::<Utc>::from)?;
            entries.push(ArtifactEntry {
                path: entry.path(),
                size: metadata.len(),
                modified,
            });
        }

        Ok(entries)
    }

    /// Delete every stored file strictly older than `now - retention`.
    ///
    /// Returns the number of files deleted. A file that disappears between
    /// listing and deletion was cleaned up by someone else; that is success,
    /// not an error.
    pub async fn sweep_expired(&self, retention: Duration) -> Result<usize, CaptureError> {
        let mut deleted = 0;
        let mut dir = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let age = metadata
                .modified()
                .ok()
                .and_then(|mtime| mtime.elapsed().ok());

            // Unreadable or future mtimes are treated as fresh
            let expired = age.map(|age| age > retention).unwrap_or(false);
            if !expired {
                continue;
            }

            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Swept expired artifact {}", path.display());
                    deleted += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Sweep failed to remove {}: {}", path.display(), e),
            }
        }

        if deleted > 0 {
            info!("Retention sweep deleted {deleted} artifact(s)");
        }

        Ok(deleted)
    }

    /// Run the retention sweep on a fixed interval until the task is aborted.
    pub fn spawn_sweeper(
        self: std::sync::Arc<Self>,
        interval: Duration,
        retention: Duration,
        metrics: std::sync::Arc<crate::Metrics>,
    ) -> JoinHandle<()> {
        let store = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // Skip the immediate first tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match store.sweep_expired(retention).await {
                    Ok(deleted) => metrics.record_sweep(deleted),
                    Err(e) => warn!("Retention sweep failed: {e}"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("clones")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a/b/clones");
        let store = ArtifactStore::open(&root).await.unwrap();
        assert!(store.root().is_dir());

        // Idempotent
        ArtifactStore::open(&root).await.unwrap();
    }

    #[tokio::test]
    async fn save_then_fetch_round_trips() {
        let (_dir, store) = store().await;
        store.save("clone", "<html>snapshot</html>", b"\x89PNG").await.unwrap();

        let markup = store.fetch("clone", ArtifactKind::Markup).await.unwrap();
        assert_eq!(
            tokio::fs::read(&markup).await.unwrap(),
            b"<html>snapshot</html>"
        );

        let shot = store.fetch("clone", ArtifactKind::Screenshot).await.unwrap();
        assert_eq!(tokio::fs::read(&shot).await.unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn fetch_missing_is_artifact_not_found() {
        let (_dir, store) = store().await;
        let err = store.fetch("nope", ArtifactKind::Markup).await.unwrap_err();
        assert!(matches!(err, CaptureError::ArtifactNotFound(_)));
    }

    #[tokio::test]
    async fn remove_is_quiet_about_missing_files() {
        let (_dir, store) = store().await;
        store.save("x", "m", b"s").await.unwrap();
        store.remove("x").await;
        store.remove("x").await; // second pass finds nothing, still fine

        assert!(store
            .fetch("x", ArtifactKind::Markup)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn sweep_deletes_old_and_keeps_new() {
        let (_dir, store) = store().await;
        store.save("old", "m", b"s").await.unwrap();

        // Let the "old" pair age past the window, then write a fresh pair
        tokio::time::sleep(Duration::from_millis(400)).await;
        store.save("new", "m", b"s").await.unwrap();

        let deleted = store
            .sweep_expired(Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        assert!(store.fetch("old", ArtifactKind::Markup).await.is_err());
        assert!(store.fetch("new", ArtifactKind::Markup).await.is_ok());
    }

    #[tokio::test]
    async fn sweep_with_nothing_expired_deletes_nothing() {
        let (_dir, store) = store().await;
        store.save("fresh", "m", b"s").await.unwrap();

        let deleted = store.sweep_expired(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn list_reports_sizes_and_mtimes() {
        let (_dir, store) = store().await;
        store.save("clone", "markup", b"png").await.unwrap();

        let mut entries = store.list().await.unwrap();
        entries.sort_by_key(|e| e.path.clone());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.size == "markup".len() as u64));
    }
}
