//! Inbound quiz submission: the JSON body posted by the quiz frontend.
//!
//! Every field has a default so that partial payloads still score; only a body
//! that is not valid JSON at all is rejected by the handler.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Kind of a recorded UI interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Click,
    Input,
    Paste,
    /// Anything the frontend sends that we do not score on (kept verbatim for the prompt).
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Click => "click",
            EventKind::Input => "input",
            EventKind::Paste => "paste",
            EventKind::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "click" => EventKind::Click,
            "input" => EventKind::Input,
            "paste" => EventKind::Paste,
            _ => EventKind::Other(s),
        }
    }
}

impl From<EventKind> for String {
    fn from(k: EventKind) -> Self {
        k.as_str().to_string()
    }
}

impl Default for EventKind {
    fn default() -> Self {
        EventKind::Other(String::new())
    }
}

/// One interaction event. `interval_ms` is the gap since the previous event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default)]
    pub label: String,
    /// May be negative or missing in the wild.
    #[serde(default)]
    pub interval_ms: Option<f64>,
}

impl Event {
    pub fn new(kind: EventKind, label: impl Into<String>, interval_ms: f64) -> Self {
        Self {
            kind,
            label: label.into(),
            interval_ms: Some(interval_ms),
        }
    }

    /// Interval clamped to `>= 0`; missing counts as 0.
    pub fn clamped_interval(&self) -> f64 {
        self.interval_ms.unwrap_or(0.0).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default = "unknown", deserialize_with = "null_as_unknown")]
    pub user_id: String,
    #[serde(default)]
    pub events: Vec<Event>,
    /// Question → answer, in the order the frontend sent them.
    #[serde(default)]
    pub answers: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub honeypot: String,
    /// Fractional milliseconds are truncated; negative values are rejected.
    #[serde(default, deserialize_with = "whole_millis")]
    pub duration_ms: u64,
    #[serde(default)]
    pub behavior_data: Option<Value>,
    #[serde(default = "unknown", deserialize_with = "null_as_unknown")]
    pub frontend: String,
}

fn unknown() -> String {
    "unknown".to_string()
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_unknown<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(unknown))
}

fn whole_millis<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match Option::<f64>::deserialize(d)? {
        None => Ok(0),
        Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(ms.trunc() as u64),
        Some(ms) => Err(de::Error::custom(format!(
            "durationMs must be a non-negative number, got {ms}"
        ))),
    }
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            user_id: unknown(),
            events: Vec::new(),
            answers: Map::new(),
            phone: String::new(),
            honeypot: String::new(),
            duration_ms: 0,
            behavior_data: None,
            frontend: unknown(),
        }
    }
}

impl Submission {
    /// Answer text for a question; non-string answers render as their JSON text.
    pub fn answer(&self, question: &str) -> Option<String> {
        self.answers.get(question).map(answer_text)
    }

    /// `(question, answer)` pairs in submission order.
    pub fn answer_pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.answers.iter().map(|(q, a)| (q.as_str(), answer_text(a)))
    }

    pub fn behavior(&self) -> BehaviorSummary {
        BehaviorSummary::from_blob(self.behavior_data.as_ref())
    }
}

fn answer_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Counts extracted from the optional `behaviorData` blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviorSummary {
    pub mouse_movements: usize,
    /// Raw JSON of the per-question timing map, if any.
    pub question_timings: Option<String>,
    pub click_positions: usize,
}

impl BehaviorSummary {
    pub fn from_blob(blob: Option<&Value>) -> Self {
        let Some(obj) = blob.and_then(Value::as_object) else {
            return Self::default();
        };
        let array_len = |key: &str| obj.get(key).and_then(Value::as_array).map_or(0, Vec::len);
        Self {
            mouse_movements: array_len("mouseMovements"),
            question_timings: obj
                .get("questionTimings")
                .filter(|v| !v.is_null())
                .map(Value::to_string),
            click_positions: array_len("clickPositions"),
        }
    }
}

/// Request-side metadata that does not come from the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: String,
    pub origin: Option<String>,
}
