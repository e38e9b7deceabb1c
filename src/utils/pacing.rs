// src/utils/pacing.rs

//! Randomized pacing between requests.
//!
//! All delays are drawn uniformly from a `(low, high)` seconds range. They
//! exist purely to avoid detectable request bursts; nothing synchronizes on
//! them.

use std::time::Duration;

use rand::Rng;

/// Draw a random duration from the given seconds range.
pub fn jitter(range: (f64, f64)) -> Duration {
    let secs = rand::rng().random_range(range.0..range.1);
    Duration::from_secs_f64(secs)
}

/// Sleep for a random duration from the given seconds range.
pub async fn pause(range: (f64, f64)) {
    tokio::time::sleep(jitter(range)).await;
}
