// src/pipeline/scrape.rs

//! Scrape pipeline: authenticate, walk the hierarchy, persist the tree.

use crate::error::Result;
use crate::models::{Config, CookieRecord};
use crate::services::HierarchyBuilder;
use crate::session::Session;
use crate::storage::LocalStore;

/// Run the scrape phase.
pub async fn run_scrape(
    config: &Config,
    session: &Session,
    store: &LocalStore,
    limit: Option<usize>,
) -> Result<()> {
    let cookie_path = store.path(&config.paths.cookie_file);
    log::info!("Loading cookies from {}", cookie_path.display());
    let cookies = CookieRecord::load_all(&cookie_path)?;

    log::info!("Logging in to {}...", config.crawler.site_root);
    session.authenticate(&cookies).await?;

    log::info!("Starting hierarchy scrape from {}", config.crawler.listing_url);
    let builder = HierarchyBuilder::new(session, store, config);
    let (hierarchy, stats) = builder.build(limit).await?;

    store
        .save_hierarchy(&config.paths.hierarchy_file, &hierarchy)
        .await?;

    let output = store.path(&config.paths.hierarchy_file);
    log::info!("Results saved to {}", output.display());
    log::info!("Scrape summary:");
    log::info!("    Total mountains:     {}", stats.mountains);
    log::info!("    Total model courses: {}", stats.courses);
    log::info!("    Total activities:    {}", stats.activities);
    if stats.branch_failures > 0 {
        log::warn!(
            "    Partial branches:    {} (kept with fewer children)",
            stats.branch_failures
        );
    }

    Ok(())
}
