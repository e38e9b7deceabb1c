// src/utils/mod.rs

//! Utility functions and helpers.

pub mod pacing;
pub mod text;
