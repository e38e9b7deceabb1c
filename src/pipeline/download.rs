// src/pipeline/download.rs

//! Download pipeline: mirror the scraped hierarchy on disk and fetch a
//! GPX track for every activity in tree order.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, Result};
use crate::models::{Config, CookieRecord};
use crate::services::{FetchOutcome, GpxFetcher};
use crate::session::Session;
use crate::storage::LocalStore;
use crate::utils::pacing::pause;
use crate::utils::text::sanitize_filename;

/// Tally of per-activity results across a download run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub processed: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadStats {
    /// Folds one fetch outcome into the tally. Returns `false` when the
    /// outcome ends the whole run; counts accumulated so far stay valid.
    fn record(&mut self, outcome: &FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Downloaded(name) => {
                log::info!("    Saved {name}");
                self.downloaded += 1;
            }
            FetchOutcome::AlreadyExists(name) => {
                log::info!("    Skipping {name} (already downloaded)");
                self.skipped += 1;
            }
            FetchOutcome::NoExportControl => {
                log::warn!("    No export control found, skipping");
                self.failed += 1;
            }
            FetchOutcome::Timeout => {
                log::warn!("    Download did not finish in time");
                self.failed += 1;
            }
            FetchOutcome::SessionExpired => return false,
        }
        true
    }
}

/// On-disk directory for one model course, mirroring the hierarchy with
/// filesystem-safe names.
fn course_dir(base: &Path, mountain_name: &str, course_name: &str) -> PathBuf {
    base.join(sanitize_filename(mountain_name))
        .join(sanitize_filename(course_name))
}

/// Pause only between items, never after the last one at a level.
async fn pause_between(idx: usize, len: usize, range: (f64, f64)) {
    if idx + 1 < len {
        pause(range).await;
    }
}

/// Run the download phase over a previously scraped hierarchy.
pub async fn run_download(
    config: &Config,
    session: &Session,
    store: &LocalStore,
) -> Result<DownloadStats> {
    let hierarchy = store.load_hierarchy(&config.paths.hierarchy_file).await?;
    log::info!(
        "Loaded hierarchy of {} mountains (scraped at {})",
        hierarchy.total_mountains,
        hierarchy.scraped_at
    );

    let cookie_path = store.path(&config.paths.cookie_file);
    let cookies = CookieRecord::load_all(&cookie_path)?;
    session.authenticate(&cookies).await?;

    let base = store.path(&config.paths.output_dir);
    fs::create_dir_all(&base).await?;

    let fetcher = GpxFetcher::new(session, config);
    let mut stats = DownloadStats::default();

    for (m_idx, mountain) in hierarchy.mountains.iter().enumerate() {
        log::info!("Mountain: {}", mountain.name);

        for (c_idx, course) in mountain.model_courses.iter().enumerate() {
            log::info!("  Course: {}", course.name);
            if course.activities.is_empty() {
                log::info!("    No activities recorded, skipping");
                continue;
            }

            let dir = course_dir(&base, &mountain.name, &course.name);
            fs::create_dir_all(&dir).await?;
            // The export click saves wherever the browser points; retarget
            // it before touching any activity in this course.
            session.set_download_dir(&dir).await?;

            for (a_idx, activity) in course.activities.iter().enumerate() {
                stats.processed += 1;
                log::info!("    Activity: {} ({})", activity.title, activity.url);
                match fetcher.fetch(activity, &dir).await {
                    Ok(outcome) => {
                        if !stats.record(&outcome) {
                            log::error!("Session expired, stopping the run");
                            log_summary(&stats);
                            return Err(AppError::SessionExpired);
                        }
                    }
                    Err(e) => {
                        log::warn!("    Fetch failed for {}: {e}", activity.url);
                        stats.failed += 1;
                    }
                }
                pause_between(a_idx, course.activities.len(), config.pacing.download_activity)
                    .await;
            }
            pause_between(
                c_idx,
                mountain.model_courses.len(),
                config.pacing.download_course,
            )
            .await;
        }
        pause_between(m_idx, hierarchy.mountains.len(), config.pacing.download_mountain).await;
    }

    log_summary(&stats);
    Ok(stats)
}

fn log_summary(stats: &DownloadStats) {
    log::info!("Download summary:");
    log::info!("    Processed:  {}", stats.processed);
    log::info!("    Downloaded: {}", stats.downloaded);
    log::info!("    Skipped:    {}", stats.skipped);
    log::info!("    Failed:     {}", stats.failed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tallies_each_outcome() {
        let mut stats = DownloadStats::default();
        assert!(stats.record(&FetchOutcome::Downloaded("a.gpx".into())));
        assert!(stats.record(&FetchOutcome::AlreadyExists("b.gpx".into())));
        assert!(stats.record(&FetchOutcome::NoExportControl));
        assert!(stats.record(&FetchOutcome::Timeout));
        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 2);
    }

    #[test]
    fn expired_session_stops_without_touching_counts() {
        let outcomes = vec![
            FetchOutcome::Downloaded("a.gpx".into()),
            FetchOutcome::AlreadyExists("b.gpx".into()),
            FetchOutcome::SessionExpired,
            FetchOutcome::Downloaded("never-reached.gpx".into()),
        ];
        let mut stats = DownloadStats::default();
        for outcome in &outcomes {
            if !stats.record(outcome) {
                break;
            }
        }
        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn no_pause_after_the_last_item() {
        let items = ["a", "b", "c"];
        let start = tokio::time::Instant::now();
        for (idx, _) in items.iter().enumerate() {
            pause_between(idx, items.len(), (1.0, 1.5)).await;
        }
        // Two gaps between three items; a trailing pause would push past 3s.
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_secs(2));
        assert!(elapsed < std::time::Duration::from_secs(3));
    }

    #[test]
    fn course_dir_sanitizes_both_levels() {
        let dir = course_dir(Path::new("gpx"), "Mt. Fuji / Yoshida", "Route: A?");
        assert_eq!(dir, Path::new("gpx").join("Mt. Fuji _ Yoshida").join("Route_ A_"));
    }
}
