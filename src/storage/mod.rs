// src/storage/mod.rs

//! Storage for persisted crawl state.

pub mod local;

pub use local::LocalStore;
