//! Startup configuration: environment-driven `AppConfig` plus per-origin
//! frontend routing.

pub mod app;
pub mod frontends;

pub use app::{AppConfig, ClassifierCredentials, ClassifierSettings};
pub use frontends::{FrontendEndpoints, FrontendRouting};

/// Fatal at startup; the binary exits when it sees one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid frontends config: {0}")]
    Toml(#[from] toml::de::Error),
}
