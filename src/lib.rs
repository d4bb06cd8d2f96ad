// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod blacklist;
pub mod classifier;
pub mod config;
pub mod decision;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod heuristic;
pub mod logging;
pub mod metrics;
pub mod submission;

use std::time::Duration;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::decision::{Action, Decision};

/// Shared outbound HTTP client (classifier + delivery). Per-call timeouts are
/// set on each request.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("quiz-antibot/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4))
        .build()
}
