// src/services/mod.rs

//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Entity extraction from rendered pages (`extract`)
//! - Paginated listing traversal (`ListingWalker`)
//! - Hierarchy assembly (`HierarchyBuilder`)
//! - Per-activity GPX export (`GpxFetcher`)

pub mod extract;
mod fetcher;
mod hierarchy;
mod listing;

pub use fetcher::{FetchOutcome, GpxFetcher, await_new_file, expected_filename};
pub use hierarchy::{HierarchyBuilder, ScrapeStats};
pub use listing::ListingWalker;
