// src/session.rs

//! Authenticated browser session.
//!
//! Wraps the WebDriver handle in an explicit `Session` object that is passed
//! by reference to every component needing the browser. Authentication only
//! restores a previously exported cookie set and verifies it; there is no
//! login flow and no renewal.

use std::path::Path;
use std::time::Duration;

use serde_json::json;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;

use crate::error::{AppError, Result};
use crate::models::{Config, CookieRecord};

/// A connected browser session.
pub struct Session {
    driver: WebDriver,
    site_root: String,
    settle: Duration,
    scroll_settle: Duration,
    token_cookie: String,
    user_cookie: String,
}

impl Session {
    /// Connect to chromedriver and open a fresh browser.
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        if config.webdriver.headless {
            caps.set_headless()?;
        }

        let driver = WebDriver::new(&config.webdriver.server_url, caps).await?;

        Ok(Self {
            driver,
            site_root: config.crawler.site_root.clone(),
            settle: Duration::from_secs(config.crawler.settle_secs),
            scroll_settle: Duration::from_secs(config.crawler.scroll_settle_secs),
            token_cookie: config.crawler.token_cookie.clone(),
            user_cookie: config.crawler.user_cookie.clone(),
        })
    }

    /// Restore a cookie session and verify it.
    ///
    /// Navigates to the site root, injects each record best-effort (per-record
    /// failures are counted, never surfaced), reloads, and checks the cookie
    /// jar for the two required names. Failure is fatal to the calling run.
    pub async fn authenticate(&self, records: &[CookieRecord]) -> Result<()> {
        self.goto(&self.site_root).await?;
        self.settle().await;

        let mut applied = 0usize;
        for record in records {
            match self.driver.add_cookie(to_browser_cookie(record)).await {
                Ok(()) => applied += 1,
                Err(e) => log::debug!("Cookie '{}' rejected: {}", record.name, e),
            }
        }
        log::info!("Applied {}/{} cookies", applied, records.len());

        // Reload so the injected cookies take effect before verification.
        self.goto(&self.site_root).await?;
        self.settle().await;

        let jar = self.driver.get_all_cookies().await?;
        let has_token = jar.iter().any(|c| c.name == self.token_cookie);
        let has_user = jar.iter().any(|c| c.name == self.user_cookie);

        if has_token && has_user {
            log::info!(
                "Found authentication cookies ({}, {})",
                self.token_cookie,
                self.user_cookie
            );
            Ok(())
        } else {
            Err(AppError::auth(format!(
                "missing required cookies after injection ({}, {})",
                self.token_cookie, self.user_cookie
            )))
        }
    }

    /// Navigate to a URL.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    /// Fixed post-navigation wait.
    pub async fn settle(&self) {
        tokio::time::sleep(self.settle).await;
    }

    /// Current page source.
    pub async fn page_html(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }

    /// Current URL as a string.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    /// Whether the browser was bounced to the login page.
    pub async fn is_login_redirect(&self) -> Result<bool> {
        let url = self.current_url().await?;
        Ok(url.to_lowercase().contains("login"))
    }

    /// Scroll to the bottom of the page to force lazy content to render,
    /// then wait for it to settle.
    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await?;
        tokio::time::sleep(self.scroll_settle).await;
        Ok(())
    }

    /// Try an ordered list of locators, first match wins.
    ///
    /// Each strategy gets the full wait budget before the next is tried.
    pub async fn find_first(&self, locators: &[By], wait: Duration) -> Option<WebElement> {
        for locator in locators {
            let found = self
                .driver
                .query(locator.clone())
                .wait(wait, Duration::from_millis(500))
                .first()
                .await;
            if let Ok(element) = found {
                return Some(element);
            }
        }
        None
    }

    /// Scroll an element into view and click it.
    pub async fn click(&self, element: &WebElement) -> Result<()> {
        element.scroll_into_view().await?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        element.click().await?;
        Ok(())
    }

    /// Point the browser's download target at a directory.
    ///
    /// Must be called before triggering any export whose file should land
    /// there.
    pub async fn set_download_dir(&self, dir: &Path) -> Result<()> {
        let dev_tools = ChromeDevTools::new(self.driver.handle.clone());
        dev_tools
            .execute_cdp_with_params(
                "Page.setDownloadBehavior",
                json!({
                    "behavior": "allow",
                    "downloadPath": dir.to_string_lossy(),
                }),
            )
            .await?;
        Ok(())
    }

    /// Close the browser.
    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await?;
        Ok(())
    }
}

/// Convert an exported cookie record into a browser cookie.
///
/// The export's `httpOnly` flag has no counterpart on the wire cookie and
/// is not forwarded.
fn to_browser_cookie(record: &CookieRecord) -> Cookie {
    let mut cookie = Cookie::new(record.name.clone(), record.value.clone());
    cookie.set_domain(record.domain.clone());
    cookie.set_path(record.path.clone());
    cookie.set_secure(record.secure);

    // Exports allow fractional seconds; the wire cookie takes whole seconds.
    if let Some(expiry) = record.expiration_date {
        cookie.set_expiry(expiry as i64);
    }

    // "unspecified" is what exports emit when the site set nothing.
    match record.same_site.as_deref() {
        Some("lax") => cookie.set_same_site(SameSite::Lax),
        Some("strict") => cookie.set_same_site(SameSite::Strict),
        Some("no_restriction") | Some("none") => cookie.set_same_site(SameSite::None),
        _ => {}
    }

    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CookieRecord;

    fn record() -> CookieRecord {
        CookieRecord {
            name: "yamap_token".to_string(),
            value: "abc".to_string(),
            domain: ".yamap.com".to_string(),
            path: "/".to_string(),
            secure: true,
            expiration_date: Some(1790000000.0),
            http_only: Some(true),
            same_site: Some("lax".to_string()),
        }
    }

    #[test]
    fn test_to_browser_cookie_maps_fields() {
        let cookie = to_browser_cookie(&record());
        assert_eq!(cookie.name, "yamap_token");
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.domain.as_deref(), Some(".yamap.com"));
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(cookie.secure, Some(true));
        assert_eq!(cookie.expiry, Some(1790000000));
        assert!(matches!(cookie.same_site, Some(SameSite::Lax)));
    }

    #[test]
    fn test_fractional_expiry_truncates_to_whole_seconds() {
        let mut rec = record();
        rec.expiration_date = Some(1790000000.75);
        let cookie = to_browser_cookie(&rec);
        assert_eq!(cookie.expiry, Some(1790000000));
    }

    #[test]
    fn test_unspecified_same_site_is_skipped() {
        let mut rec = record();
        rec.same_site = Some("unspecified".to_string());
        let cookie = to_browser_cookie(&rec);
        assert!(cookie.same_site.is_none());
    }
}
