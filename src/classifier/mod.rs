//! External classifier: provider abstraction used by the decision engine.
//!
//! A classifier either returns a shape-validated [`ClassifierResult`] or
//! `None`. Failures never escape this module; they are logged and counted and
//! the engine falls back to the heuristic score.

pub mod auth;
pub mod prompt;
pub mod remote;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ClassifierSettings;
use crate::decision::ClassifierResult;
use crate::submission::Submission;

pub use auth::AuthError;
pub use remote::RemoteClassifier;

/// Trait object used by the engine and the HTTP handlers.
pub trait Classifier: Send + Sync {
    /// Assess a submission; `None` means "classifier unavailable".
    fn classify<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> Pin<Box<dyn Future<Output = Option<ClassifierResult>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Why a classification attempt produced no result.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("auth failed: {0}")]
    Auth(#[from] AuthError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("completion timed out")]
    Timeout,

    #[error("empty completion content")]
    EmptyContent,

    #[error("malformed completion: {0}")]
    Malformed(String),
}

impl ClassifierError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierError::Auth(_) => "auth",
            ClassifierError::Http(_) => "http",
            ClassifierError::Status { .. } => "status",
            ClassifierError::Timeout => "timeout",
            ClassifierError::EmptyContent => "empty",
            ClassifierError::Malformed(_) => "malformed",
        }
    }
}

/// Returns `None` always; used when the classifier is switched off.
pub struct DisabledClassifier;

impl Classifier for DisabledClassifier {
    fn classify<'a>(
        &'a self,
        _submission: &'a Submission,
    ) -> Pin<Box<dyn Future<Output = Option<ClassifierResult>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns a fixed answer; for local runs and tests.
#[derive(Clone)]
pub struct StaticClassifier {
    pub fixed: Option<ClassifierResult>,
}

impl Classifier for StaticClassifier {
    fn classify<'a>(
        &'a self,
        _submission: &'a Submission,
    ) -> Pin<Box<dyn Future<Output = Option<ClassifierResult>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "static"
    }
}

/// Factory: the remote classifier unless disabled in config.
pub fn build_classifier(settings: &ClassifierSettings, http: reqwest::Client) -> DynClassifier {
    if !settings.enabled {
        tracing::info!("classifier disabled; decisions use heuristics only");
        return Arc::new(DisabledClassifier);
    }
    Arc::new(RemoteClassifier::new(settings.clone(), http))
}
