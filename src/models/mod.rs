// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod cookie;
mod entity;
mod patterns;

// Re-export all public types
pub use config::{Config, CrawlerConfig, PacingConfig, PathsConfig, WebDriverConfig};
pub use cookie::CookieRecord;
pub use entity::{Activity, Hierarchy, ModelCourse, Mountain, ScrapedEntity};
pub use patterns::LinkPattern;
