// src/models/patterns.rs

//! Identifier-bearing link patterns for each hierarchy level.

use regex::Regex;

/// Matches hrefs for one entity kind and builds canonical URLs.
#[derive(Debug, Clone)]
pub struct LinkPattern {
    regex: Regex,
    url_prefix: String,
}

impl LinkPattern {
    /// Listing links to mountain pages.
    ///
    /// Anchored: sub-paths like `/mountains/123/activities` must not match.
    pub fn mountains(site_root: &str) -> Self {
        Self {
            regex: Regex::new(r"^/mountains/(\d+)$").expect("static pattern"),
            url_prefix: format!("{}/mountains/", site_root.trim_end_matches('/')),
        }
    }

    /// Links to model course pages.
    pub fn model_courses(site_root: &str) -> Self {
        Self {
            regex: Regex::new(r"/model-courses/(\d+)").expect("static pattern"),
            url_prefix: format!("{}/model-courses/", site_root.trim_end_matches('/')),
        }
    }

    /// Links to activity pages.
    pub fn activities(site_root: &str) -> Self {
        Self {
            regex: Regex::new(r"/activities/(\d+)").expect("static pattern"),
            url_prefix: format!("{}/activities/", site_root.trim_end_matches('/')),
        }
    }

    /// Extract the identifier from an href, if it matches this pattern.
    pub fn capture(&self, href: &str) -> Option<String> {
        self.regex
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Canonical URL for an identifier.
    pub fn url_for(&self, id: &str) -> String {
        format!("{}{}", self.url_prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://yamap.com";

    #[test]
    fn test_mountain_pattern_is_anchored() {
        let pattern = LinkPattern::mountains(ROOT);
        assert_eq!(pattern.capture("/mountains/123"), Some("123".to_string()));
        assert_eq!(pattern.capture("/mountains/123/activities"), None);
        assert_eq!(pattern.capture("/model-courses/123"), None);
    }

    #[test]
    fn test_course_pattern_matches_inside_longer_paths() {
        let pattern = LinkPattern::model_courses(ROOT);
        assert_eq!(
            pattern.capture("/model-courses/456?tab=map"),
            Some("456".to_string())
        );
    }

    #[test]
    fn test_url_for() {
        let pattern = LinkPattern::activities(ROOT);
        assert_eq!(pattern.url_for("789"), "https://yamap.com/activities/789");
    }

    #[test]
    fn test_trailing_slash_in_root_is_normalized() {
        let pattern = LinkPattern::mountains("https://yamap.com/");
        assert_eq!(pattern.url_for("1"), "https://yamap.com/mountains/1");
    }
}
