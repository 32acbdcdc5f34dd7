//! The persisted set of titles the user has already been notified about.
//!
//! Loaded once at startup, mutated only by the report handler, and written
//! back after each mutation. On disk it is a versioned JSON document holding
//! the titles as an ordered sequence of strings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use taskwatch_core::Result;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct NotifiedFile {
    version: u32,
    titles: Vec<String>,
}

impl Default for NotifiedFile {
    fn default() -> Self {
        Self {
            version: 1,
            titles: Vec::new(),
        }
    }
}

pub struct NotifiedStore {
    path: PathBuf,
    /// Titles in first-seen order.
    titles: Vec<String>,
    index: HashSet<String>,
}

impl NotifiedStore {
    /// Load the store from disk; an absent file yields an empty set.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let file = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str::<NotifiedFile>(&content)?
        } else {
            NotifiedFile::default()
        };

        let mut titles = Vec::with_capacity(file.titles.len());
        let mut index = HashSet::with_capacity(file.titles.len());
        for title in file.titles {
            if index.insert(title.clone()) {
                titles.push(title);
            }
        }

        debug!(count = titles.len(), "Loaded notified titles");
        Ok(Self {
            path,
            titles,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains(title)
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Union `titles` into the set. Returns the ones actually added, in input
    /// order; already-present titles are silently skipped.
    pub fn add_all(&mut self, titles: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for title in titles {
            if self.index.insert(title.clone()) {
                self.titles.push(title.clone());
                added.push(title.clone());
            }
        }
        added
    }

    /// Write the current set back to disk.
    pub async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = NotifiedFile {
            version: 1,
            titles: self.titles.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Reset to empty and persist, allowing previously notified titles to be
    /// notified again.
    pub async fn clear(&mut self) -> Result<()> {
        self.titles.clear();
        self.index.clear();
        self.persist().await?;
        info!("Cleared notified titles");
        Ok(())
    }
}
