// src/services/extract.rs

//! Entity extraction from rendered pages.
//!
//! Scans anchor elements for identifier-bearing hrefs and derives a display
//! label through an ordered list of strategies. Everything here is a pure
//! function over an HTML string so it can be tested without a browser.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::models::{LinkPattern, ScrapedEntity};
use crate::utils::text::normalize_whitespace;

/// Labels shorter than this are treated as missing.
const MIN_LABEL_LEN: usize = 2;

/// One way of deriving a label from an anchor and its surroundings.
type LabelStrategy = fn(&ElementRef) -> Option<String>;

/// Tried in order; the first non-trivial result wins.
const LABEL_STRATEGIES: &[LabelStrategy] = &[anchor_text, parent_heading, parent_first_line];

fn parse(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

/// Extract entities whose hrefs match `pattern`, skipping ids already in
/// `seen`.
///
/// The seen-set is caller-owned so a paginated walk can dedup across pages.
/// First occurrence wins; output preserves first-seen order.
pub fn extract_entities(
    html: &str,
    pattern: &LinkPattern,
    seen: &mut HashSet<String>,
) -> Vec<ScrapedEntity> {
    let document = Html::parse_document(html);
    let anchor_sel = parse("a");

    let mut entities = Vec::new();
    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(id) = pattern.capture(href) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let label = derive_label(&anchor, &id);
        let url = pattern.url_for(&id);
        entities.push(ScrapedEntity { id, label, url });
    }
    entities
}

/// Apply the strategy chain, falling back to a synthesized placeholder.
fn derive_label(anchor: &ElementRef, id: &str) -> String {
    for strategy in LABEL_STRATEGIES {
        if let Some(raw) = strategy(anchor) {
            let label = normalize_whitespace(&raw);
            if label.chars().count() >= MIN_LABEL_LEN {
                return label;
            }
        }
    }
    format!("entity_{id}")
}

/// The anchor's own text.
fn anchor_text(anchor: &ElementRef) -> Option<String> {
    Some(anchor.text().collect::<String>())
}

/// A heading element inside the anchor's parent.
fn parent_heading(anchor: &ElementRef) -> Option<String> {
    let parent = anchor.parent().and_then(ElementRef::wrap)?;
    let heading_sel = parse("h1, h2, h3, h4");
    let heading = parent.select(&heading_sel).next()?;
    Some(heading.text().collect::<String>())
}

/// The first non-empty line of the parent's full text.
fn parent_first_line(anchor: &ElementRef) -> Option<String> {
    let parent = anchor.parent().and_then(ElementRef::wrap)?;
    let text: String = parent.text().collect();
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Canonical title extraction for a detail page.
///
/// Two-step fallback: the `<title>` text before the `/` separator, else the
/// first `h1`. Returns `None` if neither yields anything; callers substitute
/// their placeholder.
pub fn detail_page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let title_sel = parse("title");
    if let Some(title_elem) = document.select(&title_sel).next() {
        let full: String = title_elem.text().collect();
        let main = full.split('/').next().unwrap_or("").trim();
        if !main.is_empty() {
            return Some(normalize_whitespace(main));
        }
    }

    let h1_sel = parse("h1");
    document
        .select(&h1_sel)
        .next()
        .map(|h1| normalize_whitespace(&h1.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mountains() -> LinkPattern {
        LinkPattern::mountains("https://yamap.com")
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let html = r#"
            <a href="/mountains/3">穂高岳</a>
            <a href="/mountains/1">富士山</a>
            <a href="/mountains/3">穂高岳 again</a>
            <a href="/mountains/2">槍ヶ岳</a>
            <a href="/mountains/1">富士山 again</a>
        "#;
        let mut seen = HashSet::new();
        let entities = extract_entities(html, &mountains(), &mut seen);

        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(entities[1].label, "富士山");
        assert_eq!(entities[1].url, "https://yamap.com/mountains/1");
    }

    #[test]
    fn test_seen_set_spans_calls() {
        let html = r#"<a href="/mountains/1">富士山</a>"#;
        let mut seen = HashSet::new();
        assert_eq!(extract_entities(html, &mountains(), &mut seen).len(), 1);
        // Same page again contributes nothing new.
        assert!(extract_entities(html, &mountains(), &mut seen).is_empty());
    }

    #[test]
    fn test_ignores_non_matching_links() {
        let html = r#"
            <a href="/mountains/1/activities">activities</a>
            <a href="/model-courses/5">course</a>
            <a>no href</a>
        "#;
        let mut seen = HashSet::new();
        assert!(extract_entities(html, &mountains(), &mut seen).is_empty());
    }

    #[test]
    fn test_label_falls_back_to_parent_heading() {
        let html = r#"
            <div>
                <h3>立山</h3>
                <a href="/mountains/7"><img src="x.png"></a>
            </div>
        "#;
        let mut seen = HashSet::new();
        let entities = extract_entities(html, &mountains(), &mut seen);
        assert_eq!(entities[0].label, "立山");
    }

    #[test]
    fn test_label_falls_back_to_parent_first_line() {
        let html = "<div>\n剱岳\n標高2999m\n<a href=\"/mountains/8\"></a></div>";
        let mut seen = HashSet::new();
        let entities = extract_entities(html, &mountains(), &mut seen);
        assert_eq!(entities[0].label, "剱岳");
    }

    #[test]
    fn test_label_placeholder_when_nothing_found() {
        let html = r#"<a href="/mountains/9"></a>"#;
        let mut seen = HashSet::new();
        let entities = extract_entities(html, &mountains(), &mut seen);
        assert_eq!(entities[0].label, "entity_9");
    }

    #[test]
    fn test_short_anchor_text_is_rejected() {
        // Single-character anchor text falls through to the heading.
        let html = r#"<div><h2>白馬岳</h2><a href="/mountains/10">→</a></div>"#;
        let mut seen = HashSet::new();
        let entities = extract_entities(html, &mountains(), &mut seen);
        assert_eq!(entities[0].label, "白馬岳");
    }

    #[test]
    fn test_detail_title_from_title_tag() {
        let html = "<html><head><title>夏の富士山 / 山の活動日記 | YAMAP</title></head></html>";
        assert_eq!(detail_page_title(html), Some("夏の富士山".to_string()));
    }

    #[test]
    fn test_detail_title_falls_back_to_h1() {
        let html = "<html><head><title></title></head><body><h1>御来光</h1></body></html>";
        assert_eq!(detail_page_title(html), Some("御来光".to_string()));
    }

    #[test]
    fn test_detail_title_none_when_absent() {
        assert_eq!(detail_page_title("<html><body></body></html>"), None);
    }
}
