//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// WebDriver connection settings
    #[serde(default)]
    pub webdriver: WebDriverConfig,

    /// Crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Randomized pacing ranges, in seconds, per traversal level
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Input/output file locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.webdriver.server_url.trim().is_empty() {
            return Err(AppError::validation("webdriver.server_url is empty"));
        }
        if self.crawler.site_root.trim().is_empty() {
            return Err(AppError::validation("crawler.site_root is empty"));
        }
        if self.crawler.listing_url.trim().is_empty() {
            return Err(AppError::validation("crawler.listing_url is empty"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        if self.crawler.selector_wait_secs == 0 {
            return Err(AppError::validation(
                "crawler.selector_wait_secs must be > 0",
            ));
        }
        if self.crawler.download_poll_secs == 0 {
            return Err(AppError::validation(
                "crawler.download_poll_secs must be > 0",
            ));
        }
        if self.crawler.download_budget_secs < self.crawler.download_poll_secs {
            return Err(AppError::validation(
                "crawler.download_budget_secs must cover at least one poll interval",
            ));
        }
        if self.crawler.token_cookie.trim().is_empty() || self.crawler.user_cookie.trim().is_empty()
        {
            return Err(AppError::validation("required cookie names are empty"));
        }
        for (name, range) in [
            ("pacing.page", self.pacing.page),
            ("pacing.mountain", self.pacing.mountain),
            ("pacing.course", self.pacing.course),
            ("pacing.title", self.pacing.title),
            ("pacing.activity_nav", self.pacing.activity_nav),
            ("pacing.download_activity", self.pacing.download_activity),
            ("pacing.download_course", self.pacing.download_course),
            ("pacing.download_mountain", self.pacing.download_mountain),
        ] {
            if range.0 < 0.0 || range.1 <= range.0 {
                return Err(AppError::validation(format!(
                    "{name} must be a (low, high) range with low < high"
                )));
            }
        }
        Ok(())
    }
}

/// WebDriver connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    /// URL of the running chromedriver instance
    #[serde(default = "defaults::server_url")]
    pub server_url: String,

    /// Run the browser without a visible window
    #[serde(default)]
    pub headless: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            server_url: defaults::server_url(),
            headless: false,
        }
    }
}

/// Crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Site root used for cookie injection and login verification
    #[serde(default = "defaults::site_root")]
    pub site_root: String,

    /// URL of the paginated mountain listing to walk
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// Maximum number of listing pages to request
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Fixed wait after a navigation, in seconds
    #[serde(default = "defaults::settle_secs")]
    pub settle_secs: u64,

    /// Fixed wait after a full-page scroll, in seconds
    #[serde(default = "defaults::scroll_settle_secs")]
    pub scroll_settle_secs: u64,

    /// Wait budget per export-control locator strategy, in seconds
    #[serde(default = "defaults::selector_wait_secs")]
    pub selector_wait_secs: u64,

    /// Poll interval while waiting for a downloaded file, in seconds
    #[serde(default = "defaults::download_poll_secs")]
    pub download_poll_secs: u64,

    /// Total poll budget while waiting for a downloaded file, in seconds
    #[serde(default = "defaults::download_budget_secs")]
    pub download_budget_secs: u64,

    /// Dump the first listing page when it yields fewer entities than this
    #[serde(default = "defaults::debug_threshold")]
    pub debug_threshold: usize,

    /// Cookie name carrying the authentication token
    #[serde(default = "defaults::token_cookie")]
    pub token_cookie: String,

    /// Cookie name carrying the user identifier
    #[serde(default = "defaults::user_cookie")]
    pub user_cookie: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            site_root: defaults::site_root(),
            listing_url: defaults::listing_url(),
            max_pages: defaults::max_pages(),
            settle_secs: defaults::settle_secs(),
            scroll_settle_secs: defaults::scroll_settle_secs(),
            selector_wait_secs: defaults::selector_wait_secs(),
            download_poll_secs: defaults::download_poll_secs(),
            download_budget_secs: defaults::download_budget_secs(),
            debug_threshold: defaults::debug_threshold(),
            token_cookie: defaults::token_cookie(),
            user_cookie: defaults::user_cookie(),
        }
    }
}

/// Randomized pacing ranges `(low, high)` in seconds.
///
/// Purely a politeness measure against rate limiting; correctness never
/// depends on these values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Between listing pages
    #[serde(default = "defaults::pace_page")]
    pub page: (f64, f64),

    /// Between mountains during the scrape
    #[serde(default = "defaults::pace_mountain")]
    pub mountain: (f64, f64),

    /// Between model courses during the scrape
    #[serde(default = "defaults::pace_course")]
    pub course: (f64, f64),

    /// Between per-activity title fetches
    #[serde(default = "defaults::pace_title")]
    pub title: (f64, f64),

    /// After navigating to an activity page in the download phase
    #[serde(default = "defaults::pace_activity_nav")]
    pub activity_nav: (f64, f64),

    /// Between activities in the download phase
    #[serde(default = "defaults::pace_download_activity")]
    pub download_activity: (f64, f64),

    /// Between courses in the download phase
    #[serde(default = "defaults::pace_download_course")]
    pub download_course: (f64, f64),

    /// Between mountains in the download phase
    #[serde(default = "defaults::pace_download_mountain")]
    pub download_mountain: (f64, f64),
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page: defaults::pace_page(),
            mountain: defaults::pace_mountain(),
            course: defaults::pace_course(),
            title: defaults::pace_title(),
            activity_nav: defaults::pace_activity_nav(),
            download_activity: defaults::pace_download_activity(),
            download_course: defaults::pace_download_course(),
            download_mountain: defaults::pace_download_mountain(),
        }
    }
}

/// Input/output file locations, relative to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Exported browser cookies (JSON array)
    #[serde(default = "defaults::cookie_file")]
    pub cookie_file: String,

    /// Persisted hierarchy tree (scrape output, download input)
    #[serde(default = "defaults::hierarchy_file")]
    pub hierarchy_file: String,

    /// Base directory for the GPX folder mirror
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cookie_file: defaults::cookie_file(),
            hierarchy_file: defaults::hierarchy_file(),
            output_dir: defaults::output_dir(),
        }
    }
}

mod defaults {
    // WebDriver defaults
    pub fn server_url() -> String {
        "http://localhost:9515".into()
    }

    // Crawler defaults
    pub fn site_root() -> String {
        "https://yamap.com".into()
    }
    pub fn listing_url() -> String {
        // 3000m峰 mountain list
        "https://yamap.com/mountains/famous/265338".into()
    }
    pub fn max_pages() -> u32 {
        10
    }
    pub fn settle_secs() -> u64 {
        2
    }
    pub fn scroll_settle_secs() -> u64 {
        1
    }
    pub fn selector_wait_secs() -> u64 {
        5
    }
    pub fn download_poll_secs() -> u64 {
        1
    }
    pub fn download_budget_secs() -> u64 {
        15
    }
    pub fn debug_threshold() -> usize {
        3
    }
    pub fn token_cookie() -> String {
        "yamap_token".into()
    }
    pub fn user_cookie() -> String {
        "user_id".into()
    }

    // Pacing defaults
    pub fn pace_page() -> (f64, f64) {
        (2.0, 4.0)
    }
    pub fn pace_mountain() -> (f64, f64) {
        (3.0, 5.0)
    }
    pub fn pace_course() -> (f64, f64) {
        (2.0, 3.0)
    }
    pub fn pace_title() -> (f64, f64) {
        (1.0, 2.0)
    }
    pub fn pace_activity_nav() -> (f64, f64) {
        (2.0, 5.0)
    }
    pub fn pace_download_activity() -> (f64, f64) {
        (2.0, 4.0)
    }
    pub fn pace_download_course() -> (f64, f64) {
        (3.0, 5.0)
    }
    pub fn pace_download_mountain() -> (f64, f64) {
        (5.0, 8.0)
    }

    // Path defaults
    pub fn cookie_file() -> String {
        "yamap_cookies.json".into()
    }
    pub fn hierarchy_file() -> String {
        "mountains_hierarchy.json".into()
    }
    pub fn output_dir() -> String {
        "gpx".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_pages() {
        let mut config = Config::default();
        config.crawler.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_pacing_range() {
        let mut config = Config::default();
        config.pacing.course = (5.0, 2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_budget_below_poll_interval() {
        let mut config = Config::default();
        config.crawler.download_poll_secs = 10;
        config.crawler.download_budget_secs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml = r#"
            [crawler]
            max_pages = 3

            [pacing]
            page = [1.0, 2.0]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.crawler.max_pages, 3);
        assert_eq!(config.pacing.page, (1.0, 2.0));
        assert_eq!(config.crawler.token_cookie, "yamap_token");
    }
}
