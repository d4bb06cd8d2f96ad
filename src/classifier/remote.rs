// src/classifier/remote.rs
//! Remote chat-completion classifier (OAuth token + completions endpoint).

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::auth::fetch_access_token;
use super::prompt::{build_user_content, SYSTEM_PROMPT};
use super::{Classifier, ClassifierError};
use crate::config::ClassifierSettings;
use crate::decision::{Action, ClassifierResult};
use crate::submission::Submission;

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 500;

pub struct RemoteClassifier {
    http: reqwest::Client,
    settings: ClassifierSettings,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl RemoteClassifier {
    pub fn new(settings: ClassifierSettings, http: reqwest::Client) -> Self {
        Self { http, settings }
    }

    async fn try_classify(&self, sub: &Submission) -> Result<ClassifierResult, ClassifierError> {
        let user_content = build_user_content(sub);
        let token = fetch_access_token(&self.http, &self.settings).await?;

        // Dropping the future on timeout aborts the in-flight request.
        let content = tokio::time::timeout(
            self.settings.timeout,
            self.complete(&token, &user_content),
        )
        .await
        .map_err(|_| ClassifierError::Timeout)??;

        parse_completion(&content)
    }

    async fn complete(&self, token: &str, user_content: &str) -> Result<String, ClassifierError> {
        let req = Req {
            model: &self.settings.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .http
            .post(&self.settings.completions_url)
            .bearer_auth(token)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Resp = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ClassifierError::EmptyContent)
    }
}

impl Classifier for RemoteClassifier {
    fn classify<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> Pin<Box<dyn Future<Output = Option<ClassifierResult>> + Send + 'a>> {
        Box::pin(async move {
            match self.try_classify(submission).await {
                Ok(result) => {
                    debug!(score = result.score, action = %result.action, "classifier verdict");
                    Some(result)
                }
                Err(e) => {
                    warn!(error = %e, kind = e.kind(), "classifier unavailable; using heuristics");
                    metrics::counter!("classifier_failures_total", "kind" => e.kind()).increment(1);
                    None
                }
            }
        })
    }
    fn provider_name(&self) -> &'static str {
        "remote"
    }
}

/// Strict parse of the completion text: a JSON object with numeric `score`
/// and non-empty `action` (one of allow/deny/challenge) and `reason`.
pub fn parse_completion(content: &str) -> Result<ClassifierResult, ClassifierError> {
    let v: Value = serde_json::from_str(content.trim())
        .map_err(|e| ClassifierError::Malformed(format!("not JSON: {e}")))?;

    let score = v
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| ClassifierError::Malformed("score is not a number".into()))?;

    let action_raw = non_empty_str(&v, "action")
        .ok_or_else(|| ClassifierError::Malformed("action missing".into()))?;
    let action = Action::parse(action_raw)
        .ok_or_else(|| ClassifierError::Malformed(format!("unknown action {action_raw:?}")))?;

    let reason = non_empty_str(&v, "reason")
        .ok_or_else(|| ClassifierError::Malformed("reason missing".into()))?;

    Ok(ClassifierResult {
        score,
        action,
        reason: reason.to_string(),
    })
}

fn non_empty_str<'v>(v: &'v Value, key: &str) -> Option<&'v str> {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
