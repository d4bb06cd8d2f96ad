//! # Decision Engine
//! Maps `(submission, client meta)` → `Decision`.
//!
//! Order: blacklist (short-circuit deny) → heuristic score → honeypot
//! (short-circuit deny, classifier skipped) → classifier → reconcile.
//! The heuristic always runs; a classifier verdict only supersedes it.

use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::decision::{reconcile, Decision};
use crate::heuristic;
use crate::submission::{ClientMeta, Submission};

pub async fn decide(
    cfg: &AppConfig,
    classifier: &dyn Classifier,
    sub: &Submission,
    meta: &ClientMeta,
) -> Decision {
    if cfg
        .blacklist
        .is_blacklisted(&sub.phone, &meta.ip, &meta.user_agent)
    {
        info!(ip = %meta.ip, "blacklisted submission");
        return record(Decision::blacklisted());
    }

    let h = heuristic::score(
        &cfg.heuristic,
        &sub.events,
        sub.duration_ms,
        &sub.phone,
        &sub.honeypot,
    );
    if h.is_honeypot() {
        info!(ip = %meta.ip, "honeypot filled");
        return record(Decision::honeypot());
    }
    debug!(score = h.score, reasons = ?h.reasons, "heuristic score");

    let verdict = classifier.classify(sub).await;
    record(reconcile(&cfg.thresholds, &h, verdict))
}

fn record(d: Decision) -> Decision {
    metrics::counter!(
        "quiz_decisions_total",
        "action" => d.action.as_str(),
        "source" => d.source.as_str()
    )
    .increment(1);
    d
}
