// src/classifier/prompt.rs
//! Prompt text sent to the chat-completion classifier.

use std::fmt::Write as _;

use crate::submission::Submission;

pub const SYSTEM_PROMPT: &str = r#"You are an advanced anti-bot classifier. Analyse user behaviour across many signals.

INPUT:
- Core events: clicks, input, paste
- Timings: total time, intervals, answer speed
- Behaviour: mouse movement, time spent on each question
- Quiz answers

WHAT TO LOOK FOR:
1. NATURAL BEHAVIOUR:
   - Smooth mouse movement (sharp or perfectly straight lines = bot)
   - Thinking time per answer (identical = bot)
   - Activity between questions (complete inactivity = bot)

2. HUMAN PATTERNS:
   - Random micro-pauses
   - Imperfect mouse trajectories
   - Natural variation in answer speed

3. SIGNS OF AUTOMATION:
   - Machine-precise timings
   - Perfect click geometry
   - No input mistakes
   - Predictable patterns

Return strictly JSON:
{
 "score": 0-100,
 "action": "allow" | "deny" | "challenge",
 "reason": "detailed explanation naming the specific anomalies"
}

Be strict with suspicious patterns!"#;

/// Serialise a submission into the user message.
///
/// Intervals are reported raw here (negative values included); only the
/// heuristic scorer clamps them.
pub fn build_user_content(sub: &Submission) -> String {
    let answers = sub
        .answer_pairs()
        .map(|(q, a)| format!("{q}: {a}"))
        .collect::<Vec<_>>()
        .join("\n");

    let events = sub
        .events
        .iter()
        .map(|e| {
            let interval = e.interval_ms.map(|v| v.to_string()).unwrap_or_default();
            format!("{}|{}|{}", e.kind.as_str(), e.label, interval)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let avg_interval = if sub.events.is_empty() {
        0.0
    } else {
        let total: f64 = sub.events.iter().map(|e| e.interval_ms.unwrap_or(0.0)).sum();
        total / sub.events.len() as f64
    };

    let behavior = sub.behavior();

    let mut out = String::with_capacity(256 + answers.len() + events.len());
    let _ = writeln!(out, "answers:\n{answers}");
    let _ = writeln!(out, "events:\n{events}");
    let _ = writeln!(out, "duration: {}", sub.duration_ms);
    let _ = writeln!(out, "avgInterval: {avg_interval}");
    let _ = writeln!(out, "honeypot: {}", !sub.honeypot.is_empty());
    let _ = writeln!(out, "phone: {}", sub.phone);
    let _ = writeln!(out, "mouseMovements: {}", behavior.mouse_movements);
    let _ = writeln!(
        out,
        "questionTimings: {}",
        behavior.question_timings.as_deref().unwrap_or("none")
    );
    let _ = write!(out, "clickPositions: {}", behavior.click_positions);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_content_lists_every_signal_in_order() {
        let sub: Submission = serde_json::from_value(json!({
            "answers": { "area": "40m2", "name": "Olga" },
            "events": [
                { "type": "click", "label": "area", "intervalMs": 400 },
                { "type": "paste", "label": "phone", "intervalMs": -100 },
                { "type": "input", "label": "name" }
            ],
            "phone": "+79991234567",
            "durationMs": 12000,
            "behaviorData": {
                "mouseMovements": [1, 2],
                "questionTimings": { "area": 3000 },
                "clickPositions": [1]
            }
        }))
        .unwrap();

        let expected = "answers:\n\
area: 40m2\n\
name: Olga\n\
events:\n\
click|area|400\n\
paste|phone|-100\n\
input|name|\n\
duration: 12000\n\
avgInterval: 100\n\
honeypot: false\n\
phone: +79991234567\n\
mouseMovements: 2\n\
questionTimings: {\"area\":3000}\n\
clickPositions: 1";
        assert_eq!(build_user_content(&sub), expected);
    }

    #[test]
    fn empty_submission_still_renders() {
        let content = build_user_content(&Submission::default());
        assert!(content.starts_with("answers:\n\nevents:\n\nduration: 0\n"));
        assert!(content.contains("avgInterval: 0\n"));
        assert!(content.contains("questionTimings: none\n"));
        assert!(content.ends_with("clickPositions: 0"));
    }
}
