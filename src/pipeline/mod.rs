// src/pipeline/mod.rs

mod download;
mod scrape;

pub use download::{run_download, DownloadStats};
pub use scrape::run_scrape;
