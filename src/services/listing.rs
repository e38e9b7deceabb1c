// src/services/listing.rs

//! Paginated listing walker.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Config, LinkPattern, ScrapedEntity};
use crate::services::extract::extract_entities;
use crate::session::Session;
use crate::storage::LocalStore;
use crate::utils::pacing;

/// Walks the paginated top-level listing, accumulating unique entities.
pub struct ListingWalker<'a> {
    session: &'a Session,
    store: &'a LocalStore,
    config: &'a Config,
}

impl<'a> ListingWalker<'a> {
    pub fn new(session: &'a Session, store: &'a LocalStore, config: &'a Config) -> Self {
        Self {
            session,
            store,
            config,
        }
    }

    /// Walk pages `1..=max_pages` of `base_url`, deduplicating by id across
    /// pages.
    ///
    /// A page that contributes zero new entities is the end-of-pagination
    /// signal; the walk stops there without error. If the very first page
    /// yields suspiciously few entities, its raw HTML is persisted as a
    /// diagnostic side-channel.
    pub async fn collect(
        &self,
        base_url: &str,
        pattern: &LinkPattern,
    ) -> Result<Vec<ScrapedEntity>> {
        let max_pages = self.config.crawler.max_pages;
        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        for page in 1..=max_pages {
            let url = page_url(base_url, page);
            log::info!("Scraping listing page {}/{}: {}", page, max_pages, url);

            self.session.goto(&url).await?;
            pacing::pause(self.config.pacing.page).await;
            self.session.scroll_to_bottom().await?;

            let html = self.session.page_html().await?;
            let new_entities = extract_entities(&html, pattern, &mut seen);
            let new_count = new_entities.len();
            entities.extend(new_entities);

            log::info!(
                "Found {} new entities on page {} (total: {})",
                new_count,
                page,
                entities.len()
            );

            if page == 1 && new_count < self.config.crawler.debug_threshold {
                log::warn!(
                    "Only {} entities on the first page; dumping HTML for inspection",
                    new_count
                );
                if let Err(e) = self.store.dump_debug_page(page, &html).await {
                    log::warn!("Failed to dump debug page: {}", e);
                }
            }

            if new_count == 0 {
                log::info!("No new entities found, stopping pagination");
                break;
            }
        }

        log::info!("Total unique entities found: {}", entities.len());
        Ok(entities)
    }
}

/// Build the URL for one listing page.
fn page_url(base_url: &str, page: u32) -> String {
    format!("{base_url}?page={page}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        assert_eq!(
            page_url("https://yamap.com/mountains/famous/265338", 3),
            "https://yamap.com/mountains/famous/265338?page=3"
        );
    }
}
