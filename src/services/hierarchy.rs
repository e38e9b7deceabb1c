// src/services/hierarchy.rs

//! Three-level hierarchy builder.
//!
//! Drives the descent mountains → model courses → activities. A failure
//! while processing one mountain or course is contained to that branch: the
//! partial branch (possibly with zero children) is kept and the run
//! continues.

use std::collections::HashSet;

use chrono::Local;

use crate::error::Result;
use crate::models::{Activity, Config, Hierarchy, LinkPattern, ModelCourse, Mountain, ScrapedEntity};
use crate::services::extract::{detail_page_title, extract_entities};
use crate::services::listing::ListingWalker;
use crate::session::Session;
use crate::storage::LocalStore;
use crate::utils::pacing;
use crate::utils::text::normalize_whitespace;

/// How many of a course's discovered activities to keep (the most recent
/// ones appear last on the page). Fixed by observed site behavior.
const RECENT_ACTIVITY_COUNT: usize = 2;

/// Aggregate counters for one scrape run.
#[derive(Debug, Default)]
pub struct ScrapeStats {
    pub mountains: usize,
    pub courses: usize,
    pub activities: usize,
    /// Branches (mountain or course) kept partial after an error
    pub branch_failures: usize,
}

/// Builds the hierarchy tree through a shared browser session.
pub struct HierarchyBuilder<'a> {
    session: &'a Session,
    store: &'a LocalStore,
    config: &'a Config,
    course_pattern: LinkPattern,
    activity_pattern: LinkPattern,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(session: &'a Session, store: &'a LocalStore, config: &'a Config) -> Self {
        let site_root = &config.crawler.site_root;
        Self {
            session,
            store,
            config,
            course_pattern: LinkPattern::model_courses(site_root),
            activity_pattern: LinkPattern::activities(site_root),
        }
    }

    /// Walk the full hierarchy starting from the configured listing URL.
    ///
    /// `limit` optionally truncates the mountain list for partial/test runs.
    pub async fn build(&self, limit: Option<usize>) -> Result<(Hierarchy, ScrapeStats)> {
        let listing_url = &self.config.crawler.listing_url;
        let walker = ListingWalker::new(self.session, self.store, self.config);
        let mountain_pattern = LinkPattern::mountains(&self.config.crawler.site_root);

        let mut discovered = walker.collect(listing_url, &mountain_pattern).await?;
        if let Some(limit) = limit {
            discovered.truncate(limit);
            log::info!("Limiting to first {} mountains", limit);
        }

        let mut stats = ScrapeStats::default();
        let total = discovered.len();
        let mut mountains = Vec::with_capacity(total);

        for (idx, entity) in discovered.iter().enumerate() {
            log::info!(
                "[{}/{}] Processing mountain: {} (id {})",
                idx + 1,
                total,
                entity.label,
                entity.id
            );
            mountains.push(self.mountain_branch(entity, &mut stats).await);
            pacing::pause(self.config.pacing.mountain).await;
        }

        stats.mountains = mountains.len();
        stats.courses = mountains.iter().map(|m| m.model_courses.len()).sum();
        stats.activities = mountains
            .iter()
            .flat_map(|m| &m.model_courses)
            .map(|c| c.activities.len())
            .sum();

        let hierarchy = Hierarchy {
            source_url: listing_url.clone(),
            scraped_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            total_mountains: mountains.len(),
            mountains,
        };
        Ok((hierarchy, stats))
    }

    /// Process one mountain, containing any error to this branch.
    async fn mountain_branch(&self, entity: &ScrapedEntity, stats: &mut ScrapeStats) -> Mountain {
        let mut mountain = Mountain {
            id: entity.id.clone(),
            name: entity.label.clone(),
            url: entity.url.clone(),
            model_courses: Vec::new(),
        };

        if let Err(e) = self.fill_courses(&mut mountain, stats).await {
            stats.branch_failures += 1;
            log::warn!(
                "Error processing mountain {}: {}; keeping partial branch",
                mountain.id,
                e
            );
        }
        mountain
    }

    async fn fill_courses(&self, mountain: &mut Mountain, stats: &mut ScrapeStats) -> Result<()> {
        log::info!("Scraping model courses from: {}", mountain.url);
        self.session.goto(&mountain.url).await?;
        pacing::pause(self.config.pacing.page).await;

        let html = self.session.page_html().await?;
        let mut seen = HashSet::new();
        let courses = extract_entities(&html, &self.course_pattern, &mut seen);
        log::info!("Found {} model courses", courses.len());

        for (idx, entity) in courses.iter().enumerate() {
            log::info!(
                "  [{}/{}] Processing course: {} (id {})",
                idx + 1,
                courses.len(),
                entity.label,
                entity.id
            );
            mountain
                .model_courses
                .push(self.course_branch(entity, stats).await);
            pacing::pause(self.config.pacing.course).await;
        }
        Ok(())
    }

    /// Process one course, containing any error to this branch.
    async fn course_branch(&self, entity: &ScrapedEntity, stats: &mut ScrapeStats) -> ModelCourse {
        let mut course = ModelCourse {
            id: entity.id.clone(),
            name: normalize_whitespace(&entity.label),
            url: entity.url.clone(),
            activities: Vec::new(),
        };

        if let Err(e) = self.fill_activities(&mut course).await {
            stats.branch_failures += 1;
            log::warn!(
                "Error processing course {}: {}; keeping partial branch",
                course.id,
                e
            );
        }
        course
    }

    async fn fill_activities(&self, course: &mut ModelCourse) -> Result<()> {
        self.session.goto(&course.url).await?;
        pacing::pause(self.config.pacing.page).await;
        self.session.scroll_to_bottom().await?;

        let html = self.session.page_html().await?;
        let mut seen = HashSet::new();
        let discovered = extract_entities(&html, &self.activity_pattern, &mut seen);
        log::info!("    Found {} activities", discovered.len());

        for entity in select_recent(&discovered, RECENT_ACTIVITY_COUNT) {
            // The listing-page title is unreliable; always refetch from the
            // activity's own page.
            let title = self.fetch_activity_title(entity).await;
            log::info!("    ✓ {}", title);
            course.activities.push(Activity {
                id: entity.id.clone(),
                title,
                url: entity.url.clone(),
            });
            pacing::pause(self.config.pacing.title).await;
        }
        Ok(())
    }

    /// Load the activity page and take its canonical title, falling back to
    /// a placeholder on any failure.
    async fn fetch_activity_title(&self, entity: &ScrapedEntity) -> String {
        let placeholder = format!("Activity {}", entity.id);

        let html = match self.load_page(&entity.url).await {
            Ok(html) => html,
            Err(e) => {
                log::warn!("Error fetching title for activity {}: {}", entity.id, e);
                return placeholder;
            }
        };

        detail_page_title(&html).unwrap_or(placeholder)
    }

    async fn load_page(&self, url: &str) -> Result<String> {
        self.session.goto(url).await?;
        self.session.settle().await;
        self.session.page_html().await
    }
}

/// The "last N in discovered order" selection policy.
fn select_recent(entities: &[ScrapedEntity], n: usize) -> &[ScrapedEntity] {
    &entities[entities.len().saturating_sub(n)..]
}
