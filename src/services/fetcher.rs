// src/services/fetcher.rs

//! Per-activity GPX export.
//!
//! Navigates to an activity page, clicks the export control, and watches the
//! download directory for the new file. Download completion is detected by
//! diffing directory listings before/after the click; nothing else may write
//! matching files into that directory during a run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thirtyfour::By;

use crate::error::Result;
use crate::models::{Activity, Config};
use crate::session::Session;
use crate::utils::pacing;
use crate::utils::text::sanitize_filename;

const GPX_EXT: &str = "gpx";

/// Terminal outcome of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File downloaded and renamed to its canonical name
    Downloaded(String),

    /// Target file already present; nothing was fetched
    AlreadyExists(String),

    /// Redirected to the login page; the whole run must stop
    SessionExpired,

    /// No export control matched any locator strategy
    NoExportControl,

    /// The export was triggered but no file appeared within the budget
    Timeout,
}

/// Fetches GPX exports through a shared browser session.
pub struct GpxFetcher<'a> {
    session: &'a Session,
    config: &'a Config,
}

impl<'a> GpxFetcher<'a> {
    pub fn new(session: &'a Session, config: &'a Config) -> Self {
        Self { session, config }
    }

    /// Fetch the GPX track for one activity into `dir`.
    ///
    /// The caller-supplied title is preferred; the page is only re-scraped
    /// when it is empty. Skips without network action when the target file
    /// already exists.
    pub async fn fetch(&self, activity: &Activity, dir: &Path) -> Result<FetchOutcome> {
        log::debug!("Navigating to activity page: {}", activity.url);
        self.session.goto(&activity.url).await?;
        pacing::pause(self.config.pacing.activity_nav).await;

        if self.session.is_login_redirect().await? {
            return Ok(FetchOutcome::SessionExpired);
        }

        let title = if activity.title.trim().is_empty() {
            let html = self.session.page_html().await?;
            crate::services::extract::detail_page_title(&html)
                .unwrap_or_else(|| format!("activity_{}", activity.id))
        } else {
            activity.title.clone()
        };

        let filename = expected_filename(&title);
        let final_path = dir.join(&filename);
        if final_path.exists() {
            log::debug!("File already exists, skipping: {}", filename);
            return Ok(FetchOutcome::AlreadyExists(filename));
        }

        let snapshot = snapshot_files(dir, GPX_EXT).await?;

        let wait = Duration::from_secs(self.config.crawler.selector_wait_secs);
        let Some(control) = self
            .session
            .find_first(&export_control_locators(), wait)
            .await
        else {
            return Ok(FetchOutcome::NoExportControl);
        };

        self.session.click(&control).await?;

        log::debug!("Waiting for download of {}", filename);
        let budget = Duration::from_secs(self.config.crawler.download_budget_secs);
        let interval = Duration::from_secs(self.config.crawler.download_poll_secs);
        match await_new_file(dir, GPX_EXT, &snapshot, budget, interval).await? {
            Some(downloaded) => {
                if downloaded != final_path {
                    // Replace any stale file left at the canonical path.
                    if final_path.exists() {
                        tokio::fs::remove_file(&final_path).await?;
                    }
                    tokio::fs::rename(&downloaded, &final_path).await?;
                }
                Ok(FetchOutcome::Downloaded(filename))
            }
            None => Ok(FetchOutcome::Timeout),
        }
    }
}

/// Canonical filename for an activity title.
pub fn expected_filename(title: &str) -> String {
    format!("{}.{}", sanitize_filename(title), GPX_EXT)
}

/// Locator strategies for the export control, in trial order.
fn export_control_locators() -> Vec<By> {
    vec![
        By::XPath("//button[contains(text(), 'エクスポート')]"),
        By::Css("button[class*='DownloadButton']"),
        By::XPath("//a[contains(text(), 'エクスポート')]"),
    ]
}

/// Snapshot the set of files with the given extension in `dir`.
async fn snapshot_files(dir: &Path, extension: &str) -> Result<HashSet<PathBuf>> {
    let mut files = HashSet::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.insert(path);
        }
    }
    Ok(files)
}

/// Await a new file matching `extension` in `dir` that is not in `existing`.
///
/// Polls once per `interval` for up to `budget`; returns `None` on timeout.
pub async fn await_new_file(
    dir: &Path,
    extension: &str,
    existing: &HashSet<PathBuf>,
    budget: Duration,
    interval: Duration,
) -> Result<Option<PathBuf>> {
    let deadline = tokio::time::Instant::now() + budget;

    loop {
        tokio::time::sleep(interval).await;

        let current = snapshot_files(dir, extension).await?;
        if let Some(new_file) = current.difference(existing).next() {
            return Ok(Some(new_file.clone()));
        }

        if tokio::time::Instant::now() >= deadline {
            return Ok(None);
        }
    }
}
