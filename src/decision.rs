//! decision.rs: final verdict shape and the reconciliation of heuristic and
//! classifier output.

use serde::{Deserialize, Serialize, Serializer};

use crate::heuristic::HeuristicResult;

/// What the frontend should do with the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Deny,
    Challenge,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Deny => "deny",
            Action::Challenge => "challenge",
        }
    }

    /// Lenient parse for classifier output: trims and ignores case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(Action::Allow),
            "deny" => Some(Action::Deny),
            "challenge" => Some(Action::Challenge),
            _ => None,
        }
    }

    /// Leads are forwarded for everything except `deny`.
    pub fn forwards_lead(&self) -> bool {
        !matches!(self, Action::Deny)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the external classifier after shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierResult {
    pub score: f64,
    pub action: Action,
    pub reason: String,
}

/// Where a decision came from; used for metrics and logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Blacklist,
    Honeypot,
    Classifier,
    Heuristic,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Blacklist => "blacklist",
            DecisionSource::Honeypot => "honeypot",
            DecisionSource::Classifier => "classifier",
            DecisionSource::Heuristic => "heuristic",
        }
    }
}

/// The externally visible `{score, action, reason}` triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Not bounded when it comes from the classifier.
    #[serde(serialize_with = "serialize_score")]
    pub score: f64,
    pub action: Action,
    pub reason: String,
    #[serde(skip)]
    pub source: DecisionSource,
}

impl Decision {
    pub fn blacklisted() -> Self {
        Self {
            score: 0.0,
            action: Action::Deny,
            reason: "blacklisted".to_string(),
            source: DecisionSource::Blacklist,
        }
    }

    pub fn honeypot() -> Self {
        Self {
            score: 0.0,
            action: Action::Deny,
            reason: "honeypot".to_string(),
            source: DecisionSource::Honeypot,
        }
    }
}

/// Deny/allow cut-offs applied to the heuristic score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Scores strictly below are denied.
    pub deny: i64,
    /// Scores at or above are allowed.
    pub allow: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { deny: 20, allow: 85 }
    }
}

pub fn threshold_action(thresholds: &Thresholds, score: i64) -> Action {
    if score < thresholds.deny {
        Action::Deny
    } else if score >= thresholds.allow {
        Action::Allow
    } else {
        Action::Challenge
    }
}

/// Prefer the classifier verbatim; otherwise map the heuristic through the thresholds.
pub fn reconcile(
    thresholds: &Thresholds,
    heuristic: &HeuristicResult,
    classifier: Option<ClassifierResult>,
) -> Decision {
    match classifier {
        Some(c) => Decision {
            score: c.score,
            action: c.action,
            reason: c.reason,
            source: DecisionSource::Classifier,
        },
        None => Decision {
            score: heuristic.score as f64,
            action: threshold_action(thresholds, heuristic.score),
            reason: heuristic.reasons.join(", "),
            source: DecisionSource::Heuristic,
        },
    }
}

// Whole numbers go out as JSON integers so `25` does not become `25.0`.
fn serialize_score<S: Serializer>(score: &f64, s: S) -> Result<S::Ok, S::Error> {
    if score.is_finite() && score.fract() == 0.0 && score.abs() < i64::MAX as f64 {
        s.serialize_i64(*score as i64)
    } else {
        s.serialize_f64(*score)
    }
}
