//! Outbound delivery: decision log + lead forwarding.
//!
//! Everything here is best-effort. The dispatcher runs sinks on a spawned task
//! and the request handler drops the returned handle, so the response never
//! waits on (or fails because of) a downstream endpoint. No retries.

pub mod crm;
pub mod sheets;

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::FrontendEndpoints;
use crate::decision::Decision;
use crate::submission::{ClientMeta, Submission};

pub use crm::CrmLeadSink;
pub use sheets::{LeadSheetSink, LogSink};

const NAME_PLACEHOLDER: &str = "Not specified";
const SINK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned {0}")]
    Status(u16),
}

/// Everything a sink needs about one finished submission.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub ip: String,
    pub user_agent: String,
    /// `q: a; q2: a2`
    pub answers_summary: String,
    pub decision: Decision,
    pub ts: DateTime<Utc>,
}

impl DeliveryRecord {
    pub fn new(sub: &Submission, meta: &ClientMeta, decision: Decision) -> Self {
        let answers_summary = sub
            .answer_pairs()
            .map(|(q, a)| format!("{q}: {a}"))
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            user_id: sub.user_id.clone(),
            name: sub
                .answer("name")
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| NAME_PLACEHOLDER.to_string()),
            phone: sub.phone.clone(),
            ip: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            answers_summary,
            decision,
            ts: Utc::now(),
        }
    }

    /// Human-readable line attached to forwarded leads.
    pub fn comment(&self) -> String {
        format!(
            "Antibot status: {} ({})",
            self.decision.action.as_str().to_uppercase(),
            self.decision.reason
        )
    }

    pub fn timestamp_iso(&self) -> String {
        self.ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// One downstream destination.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Label for logs and metrics.
    fn name(&self) -> &'static str;
    async fn send(&self, record: &DeliveryRecord) -> Result<(), DeliveryError>;
}

/// POST a JSON body; non-2xx counts as failure.
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
) -> Result<(), DeliveryError> {
    let resp = client
        .post(url)
        .timeout(SINK_TIMEOUT)
        .json(body)
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DeliveryError::Status(status.as_u16()));
    }
    Ok(())
}

/// Picks sinks per frontend/decision and runs them off the request path.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
}

impl Dispatcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Log sink always (when configured); lead sinks only for non-deny decisions.
    pub fn sinks_for(
        &self,
        endpoints: &FrontendEndpoints,
        decision: &Decision,
    ) -> Vec<Box<dyn Sink>> {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
        if let Some(url) = &endpoints.logs_url {
            sinks.push(Box::new(LogSink::new(self.client.clone(), url.clone())));
        }
        if decision.action.forwards_lead() {
            if let Some(url) = &endpoints.lead_url {
                sinks.push(Box::new(LeadSheetSink::new(self.client.clone(), url.clone())));
            }
            if let Some(url) = &endpoints.crm_lead_url {
                sinks.push(Box::new(CrmLeadSink::new(self.client.clone(), url.clone())));
            }
        }
        sinks
    }

    /// Spawn delivery. Callers that must not wait simply drop the handle.
    pub fn dispatch(&self, endpoints: &FrontendEndpoints, record: DeliveryRecord) -> JoinHandle<()> {
        let sinks = self.sinks_for(endpoints, &record.decision);
        tokio::spawn(async move {
            if sinks.is_empty() {
                debug!("no delivery endpoints configured");
                return;
            }
            for sink in sinks {
                match sink.send(&record).await {
                    Ok(()) => debug!(sink = sink.name(), "delivered"),
                    Err(e) => {
                        warn!(sink = sink.name(), error = %e, "delivery failed");
                        metrics::counter!("delivery_failures_total", "sink" => sink.name())
                            .increment(1);
                    }
                }
            }
        })
    }
}
