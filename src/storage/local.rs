// src/storage/local.rs

//! Local filesystem storage.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml                   # Crawler configuration
//! ├── yamap_cookies.json            # Exported browser cookies (input)
//! ├── mountains_hierarchy.json      # Persisted hierarchy tree
//! ├── debug_listing_page_1.html     # Diagnostic dump (only when suspicious)
//! └── gpx/                          # Filesystem mirror of the tree
//!     └── {mountain}/{course}/{activity}.gpx
//! ```

use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Hierarchy;

/// Filesystem store rooted at the data directory.
#[derive(Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist the hierarchy tree.
    pub async fn save_hierarchy(&self, key: &str, hierarchy: &Hierarchy) -> Result<()> {
        self.write_json(key, hierarchy).await
    }

    /// Load a previously persisted hierarchy tree.
    pub async fn load_hierarchy(&self, key: &str) -> Result<Hierarchy> {
        self.read_json(key).await?.ok_or_else(|| {
            AppError::config(format!(
                "Hierarchy file not found at {}. Run 'scrape' first.",
                self.path(key).display()
            ))
        })
    }

    /// Persist the raw HTML of a suspicious listing page for inspection.
    pub async fn dump_debug_page(&self, page: u32, html: &str) -> Result<()> {
        let key = format!("debug_listing_page_{page}.html");
        self.write_bytes(&key, html.as_bytes()).await?;
        log::warn!("Saved page HTML to {}", self.path(&key).display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, ModelCourse, Mountain};
    use tempfile::TempDir;

    fn sample_hierarchy() -> Hierarchy {
        Hierarchy {
            source_url: "https://yamap.com/mountains/famous/265338".to_string(),
            scraped_at: "2026-08-30 09:00:00".to_string(),
            total_mountains: 1,
            mountains: vec![Mountain {
                id: "1".to_string(),
                name: "富士山".to_string(),
                url: "https://yamap.com/mountains/1".to_string(),
                model_courses: vec![ModelCourse {
                    id: "10".to_string(),
                    name: "吉田ルート".to_string(),
                    url: "https://yamap.com/model-courses/10".to_string(),
                    activities: vec![Activity {
                        id: "100".to_string(),
                        title: "夏の富士山".to_string(),
                        url: "https://yamap.com/activities/100".to_string(),
                    }],
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.write_bytes("test.txt", b"hello").await.unwrap();
        let data = store.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let data = store.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_hierarchy_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let hierarchy = sample_hierarchy();
        store
            .save_hierarchy("mountains_hierarchy.json", &hierarchy)
            .await
            .unwrap();

        let loaded = store
            .load_hierarchy("mountains_hierarchy.json")
            .await
            .unwrap();
        assert_eq!(loaded.total_mountains, 1);
        assert_eq!(loaded.mountains[0].model_courses[0].activities.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_hierarchy_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let result = store.load_hierarchy("mountains_hierarchy.json").await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_debug_dump_lands_in_root() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.dump_debug_page(1, "<html></html>").await.unwrap();
        assert!(tmp.path().join("debug_listing_page_1.html").exists());
    }
}
