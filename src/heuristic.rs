//! # Heuristic Scorer
//! Deterministic, penalty-based bot score computed locally from timing, paste
//! and phone-format signals. No I/O, no hidden state.
//!
//! Penalties are subtracted from 100 in a fixed order and the total is clamped
//! to `[0, 100]` only once, at the end. A filled honeypot bypasses every other
//! check.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::submission::{Event, EventKind};

pub const HONEYPOT_REASON: &str = "honeypot filled";

/// Used as the average interval when there are no events, so the interval
/// penalty cannot fire on an empty list.
const NO_EVENTS_AVG_SENTINEL: f64 = 9999.0;

const FAST_COMPLETION_PENALTY: i64 = 50;
const ROBOTIC_INTERVAL_PENALTY: i64 = 40;
const PASTE_PENALTY: i64 = 20;
const INVALID_PHONE_PENALTY: i64 = 25;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+7[0-9]{10}$").expect("static phone pattern compiles"));

/// Tunable limits for the scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicParams {
    pub min_duration_ms: u64,
    pub min_avg_interval_ms: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            min_duration_ms: 8000,
            min_avg_interval_ms: 300.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicResult {
    /// Always within `[0, 100]`.
    pub score: i64,
    pub reasons: Vec<String>,
}

impl HeuristicResult {
    /// True when the scorer stopped at the honeypot check.
    pub fn is_honeypot(&self) -> bool {
        self.score == 0 && self.reasons.iter().any(|r| r == HONEYPOT_REASON)
    }
}

pub fn score(
    params: &HeuristicParams,
    events: &[Event],
    duration_ms: u64,
    phone: &str,
    honeypot: &str,
) -> HeuristicResult {
    if !honeypot.trim().is_empty() {
        return HeuristicResult {
            score: 0,
            reasons: vec![HONEYPOT_REASON.to_string()],
        };
    }

    let mut score: i64 = 100;
    let mut reasons = Vec::new();

    if duration_ms < params.min_duration_ms {
        score -= FAST_COMPLETION_PENALTY;
        reasons.push(format!("completed too fast: {duration_ms}ms"));
    }

    let avg = average_interval(events);
    if avg < params.min_avg_interval_ms {
        score -= ROBOTIC_INTERVAL_PENALTY;
        reasons.push(format!("robotic intervals: {}ms", avg.round() as i64));
    }

    let pastes = events.iter().filter(|e| e.kind == EventKind::Paste).count() as i64;
    if pastes > 0 {
        score -= pastes * PASTE_PENALTY;
        reasons.push(format!("pasted data: {pastes} times"));
    }

    if !is_valid_phone(phone) {
        score -= INVALID_PHONE_PENALTY;
        reasons.push("invalid phone".to_string());
    }

    HeuristicResult {
        score: score.clamp(0, 100),
        reasons,
    }
}

/// Mean of the clamped intervals, or the sentinel for an empty list.
pub fn average_interval(events: &[Event]) -> f64 {
    if events.is_empty() {
        return NO_EVENTS_AVG_SENTINEL;
    }
    let total: f64 = events.iter().map(Event::clamped_interval).sum();
    total / events.len() as f64
}

/// `+7` followed by exactly ten digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}
