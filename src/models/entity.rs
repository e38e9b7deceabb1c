// src/models/entity.rs

//! Mountain, ModelCourse, and Activity data structures.

use serde::{Deserialize, Serialize};

/// A raw entity discovered on a page before it is typed into the tree.
///
/// Identity is the id extracted from the link path; the label comes from the
/// surrounding markup and may be a synthesized placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedEntity {
    pub id: String,
    pub label: String,
    pub url: String,
}

/// The persisted three-level hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Listing page the crawl started from
    pub source_url: String,

    /// Local timestamp of the scrape run (`YYYY-MM-DD HH:MM:SS`)
    pub scraped_at: String,

    /// Number of mountains at the time of the scrape
    pub total_mountains: usize,

    /// The mountains in discovery order
    pub mountains: Vec<Mountain>,
}

impl Hierarchy {
    /// Count model courses across all mountains.
    pub fn course_count(&self) -> usize {
        self.mountains.iter().map(|m| m.model_courses.len()).sum()
    }

    /// Count activities across all courses.
    pub fn activity_count(&self) -> usize {
        self.mountains
            .iter()
            .flat_map(|m| &m.model_courses)
            .map(|c| c.activities.len())
            .sum()
    }
}

/// A mountain with its model courses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mountain {
    /// Identifier from the `/mountains/{id}` path
    pub id: String,

    /// Display name
    pub name: String,

    /// Canonical mountain page URL
    pub url: String,

    /// Model courses discovered on the mountain page
    #[serde(default)]
    pub model_courses: Vec<ModelCourse>,
}

/// A suggested route on a mountain, with its sampled activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCourse {
    /// Identifier from the `/model-courses/{id}` path
    pub id: String,

    /// Display name
    pub name: String,

    /// Canonical course page URL
    pub url: String,

    /// The selected recent activities for this course
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// A recorded hike whose GPX track can be exported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    /// Identifier from the `/activities/{id}` path
    pub id: String,

    /// Title fetched from the activity's own page
    pub title: String,

    /// Canonical activity page URL
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_hierarchy() -> Hierarchy {
        Hierarchy {
            source_url: "https://yamap.com/mountains/famous/265338".to_string(),
            scraped_at: "2026-08-30 12:00:00".to_string(),
            total_mountains: 1,
            mountains: vec![Mountain {
                id: "1".to_string(),
                name: "富士山".to_string(),
                url: "https://yamap.com/mountains/1".to_string(),
                model_courses: vec![ModelCourse {
                    id: "10".to_string(),
                    name: "吉田ルート".to_string(),
                    url: "https://yamap.com/model-courses/10".to_string(),
                    activities: vec![
                        Activity {
                            id: "100".to_string(),
                            title: "夏の富士山".to_string(),
                            url: "https://yamap.com/activities/100".to_string(),
                        },
                        Activity {
                            id: "101".to_string(),
                            title: "御来光".to_string(),
                            url: "https://yamap.com/activities/101".to_string(),
                        },
                    ],
                }],
            }],
        }
    }

    #[test]
    fn test_counts() {
        let hierarchy = create_test_hierarchy();
        assert_eq!(hierarchy.course_count(), 1);
        assert_eq!(hierarchy.activity_count(), 2);
    }

    #[test]
    fn test_json_round_trip_preserves_field_names() {
        let hierarchy = create_test_hierarchy();
        let json = serde_json::to_string(&hierarchy).unwrap();
        assert!(json.contains("\"source_url\""));
        assert!(json.contains("\"model_courses\""));
        assert!(json.contains("\"total_mountains\""));

        let loaded: Hierarchy = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.mountains[0].model_courses[0].activities.len(), 2);
    }

    #[test]
    fn test_missing_children_default_to_empty() {
        let json = r#"{
            "source_url": "u",
            "scraped_at": "t",
            "total_mountains": 1,
            "mountains": [{"id": "1", "name": "n", "url": "u"}]
        }"#;
        let loaded: Hierarchy = serde_json::from_str(json).unwrap();
        assert!(loaded.mountains[0].model_courses.is_empty());
    }
}
