//! Task history and last-check bookkeeping backing the status commands.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use taskwatch_core::Result;
use tracing::debug;

/// Entries older than this are hidden from the recent view.
pub const RECENT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Oldest entries are dropped past this cap.
const HISTORY_CAP: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub title: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryFile {
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_check_ms: Option<i64>,
    entries: Vec<HistoryEntry>,
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self {
            version: 1,
            last_check_ms: None,
            entries: Vec::new(),
        }
    }
}

pub struct HistoryStore {
    path: PathBuf,
    last_check_ms: Option<i64>,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Load from disk; an absent file yields an empty history.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let file = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str::<HistoryFile>(&content)?
        } else {
            HistoryFile::default()
        };

        debug!(count = file.entries.len(), "Loaded task history");
        Ok(Self {
            path,
            last_check_ms: file.last_check_ms,
            entries: file.entries,
        })
    }

    pub fn last_check_ms(&self) -> Option<i64> {
        self.last_check_ms
    }

    /// Record a completed refresh tick.
    pub fn touch_check(&mut self, now_ms: i64) {
        self.last_check_ms = Some(now_ms);
    }

    /// Append newly notified titles, dropping the oldest entries past the cap.
    pub fn record(&mut self, titles: &[String], now_ms: i64) {
        for title in titles {
            self.entries.push(HistoryEntry {
                title: title.clone(),
                timestamp_ms: now_ms,
            });
        }
        if self.entries.len() > HISTORY_CAP {
            let excess = self.entries.len() - HISTORY_CAP;
            self.entries.drain(..excess);
        }
    }

    /// Entries within the recent window, newest first, capped at `limit`.
    pub fn recent(&self, now_ms: i64, limit: usize) -> Vec<HistoryEntry> {
        let cutoff = now_ms - RECENT_WINDOW_MS;
        let mut recent: Vec<HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.timestamp_ms > cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        recent.truncate(limit);
        recent
    }

    pub async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = HistoryFile {
            version: 1,
            last_check_ms: self.last_check_ms,
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Drop all entries and the last-check marker, then persist.
    pub async fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.last_check_ms = None;
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn titles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_recent_filters_window_and_orders_newest_first() {
        let dir = TempDir::new().unwrap();
        let mut store = HistoryStore::load(dir.path().join("history.json"))
            .await
            .unwrap();

        let now = 10 * RECENT_WINDOW_MS;
        store.record(&titles(&["old"]), now - RECENT_WINDOW_MS - 1);
        store.record(&titles(&["earlier"]), now - 5000);
        store.record(&titles(&["latest"]), now - 1000);

        let recent = store.recent(now, 10);
        let names: Vec<&str> = recent.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(names, vec!["latest", "earlier"]);
    }

    #[tokio::test]
    async fn test_record_caps_entries() {
        let dir = TempDir::new().unwrap();
        let mut store = HistoryStore::load(dir.path().join("history.json"))
            .await
            .unwrap();

        for i in 0..(HISTORY_CAP + 25) {
            store.record(&titles(&[&format!("t{}", i)]), i as i64);
        }
        // Oldest entries were dropped, newest kept.
        assert_eq!(store.entries.len(), HISTORY_CAP);
        assert_eq!(store.entries.last().unwrap().title, format!("t{}", HISTORY_CAP + 24));
    }

    #[tokio::test]
    async fn test_persist_round_trip_with_last_check() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(path.clone()).await.unwrap();
        store.record(&titles(&["a"]), 1234);
        store.touch_check(5678);
        store.persist().await.unwrap();

        let reloaded = HistoryStore::load(path).await.unwrap();
        assert_eq!(reloaded.last_check_ms(), Some(5678));
        assert_eq!(reloaded.recent(2000, 10).len(), 1);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(path.clone()).await.unwrap();
        store.record(&titles(&["a"]), 1);
        store.touch_check(2);
        store.clear().await.unwrap();

        let reloaded = HistoryStore::load(path).await.unwrap();
        assert_eq!(reloaded.last_check_ms(), None);
        assert!(reloaded.recent(3, 10).is_empty());
    }
}
