//! Persistent record of already published headlines.
//!
//! The store is a JSON array of raw titles, oldest first. It is loaded fresh at
//! the start of every cycle and rewritten wholesale at the end, keeping only the
//! most recent [`CAPACITY`] entries.
//!
//! # File Format
//!
//! ```text
//! [
//!   "Зенит обыграл Спартак",
//!   "Трансфер года: ..."
//! ]
//! ```
//!
//! Reading is permissive: a missing or malformed file is an empty store.

use crate::error::StoreError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Maximum number of titles kept after a persist.
pub const CAPACITY: usize = 200;

/// File-backed store of published titles.
#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the published titles, oldest first.
    ///
    /// Never fails: an absent, unreadable or unparseable file yields an empty list.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Vec<String> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No posted-titles file yet; starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read posted-titles file; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(titles) => {
                debug!(count = titles.len(), "Loaded posted titles");
                titles
            }
            Err(e) => {
                warn!(error = %e, "Posted-titles file is malformed; treating as empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the file with the last [`CAPACITY`] titles of `titles`.
    ///
    /// The new content goes to a sibling temporary file, is flushed to disk, and
    /// is then renamed over the target, so readers only ever see a complete
    /// document, even after a crash.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = titles.len()))]
    pub async fn persist(&self, titles: &[String]) -> Result<(), StoreError> {
        let kept = recent(titles);
        let json = serde_json::to_string_pretty(kept)?;

        let tmp = self.tmp_path();
        write_synced(&tmp, json.as_bytes())
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.display().to_string(),
                source,
            })?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        debug!(kept = kept.len(), "Persisted posted titles");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "posted_news.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// The most recent [`CAPACITY`] titles, in their original order.
pub fn recent(titles: &[String]) -> &[String] {
    &titles[titles.len().saturating_sub(CAPACITY)..]
}

/// Exact membership test on the raw title.
pub fn contains(titles: &[String], title: &str) -> bool {
    titles.iter().any(|t| t == title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Новость {i}")).collect()
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::new(dir.path().join("posted_news.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted_news.json");
        std::fs::write(&path, "[\"unterminated").unwrap();
        let store = DedupStore::new(&path);
        assert!(store.load().await.is_empty());

        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::new(dir.path().join("posted_news.json"));
        let written = vec!["Зенит — Спартак 2:1".to_string(), "Реал купил защитника".to_string()];

        store.persist(&written).await.unwrap();
        assert_eq!(store.load().await, written);
    }

    #[tokio::test]
    async fn test_persist_keeps_most_recent_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::new(dir.path().join("posted_news.json"));

        store.persist(&titles(250)).await.unwrap();
        let loaded = store.load().await;

        assert_eq!(loaded.len(), CAPACITY);
        assert_eq!(loaded.first().unwrap(), "Новость 50");
        assert_eq!(loaded.last().unwrap(), "Новость 249");
    }

    #[tokio::test]
    async fn test_persist_of_loaded_store_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted_news.json");
        let store = DedupStore::new(&path);

        store.persist(&titles(230)).await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let loaded = store.load().await;
        store.persist(&loaded).await.unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_persisted_file_is_indented_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted_news.json");
        let store = DedupStore::new(&path);

        store.persist(&["Гол!".to_string()]).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();

        assert_eq!(raw, "[\n  \"Гол!\"\n]");
        assert!(!dir.path().join("posted_news.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_persist_replaces_stale_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted_news.json");
        let tmp = dir.path().join("posted_news.json.tmp");
        std::fs::write(&tmp, "[\"left over from an interrupted write\", \"and more\"]").unwrap();

        let store = DedupStore::new(&path);
        store.persist(&["Гол!".to_string()]).await.unwrap();

        assert_eq!(store.load().await, vec!["Гол!".to_string()]);
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn test_write_synced_writes_whole_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let payload = serde_json::to_string_pretty(&titles(CAPACITY)).unwrap();

        write_synced(&path, payload.as_bytes()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::new(dir.path().join("missing").join("posted_news.json"));
        let err = store.persist(&titles(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_contains_is_exact() {
        let posted = vec!["Матч завершился 2:1!".to_string()];
        assert!(contains(&posted, "Матч завершился 2:1!"));
        assert!(!contains(&posted, "МАТЧ ЗАВЕРШИЛСЯ 2:1!"));
        assert!(!contains(&posted, "Матч завершился 2:1"));
    }

    #[test]
    fn test_recent_short_list_untouched() {
        let list = titles(3);
        assert_eq!(recent(&list), &list[..]);
    }
}
