// src/delivery/sheets.rs
//! Spreadsheet web-app endpoints: append-only decision log and lead capture.

use reqwest::Client;
use serde::Serialize;

use super::{post_json, DeliveryError, DeliveryRecord, Sink};
use crate::decision::Decision;

pub struct LogSink {
    client: Client,
    url: String,
}

impl LogSink {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    user_id: &'a str,
    #[serde(flatten)]
    decision: &'a Decision,
    phone: &'a str,
    ip: &'a str,
    ua: &'a str,
    answers: &'a str,
    timestamp: String,
}

impl<'a> LogPayload<'a> {
    fn from_record(r: &'a DeliveryRecord) -> Self {
        Self {
            kind: "quiz",
            user_id: &r.user_id,
            decision: &r.decision,
            phone: &r.phone,
            ip: &r.ip,
            ua: &r.user_agent,
            answers: &r.answers_summary,
            timestamp: r.timestamp_iso(),
        }
    }
}

#[async_trait::async_trait]
impl Sink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, record: &DeliveryRecord) -> Result<(), DeliveryError> {
        post_json(&self.client, &self.url, &LogPayload::from_record(record)).await
    }
}

pub struct LeadSheetSink {
    client: Client,
    url: String,
}

impl LeadSheetSink {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadPayload<'a> {
    name: &'a str,
    phone: &'a str,
    user_id: &'a str,
    comment: String,
    source: &'static str,
}

#[async_trait::async_trait]
impl Sink for LeadSheetSink {
    fn name(&self) -> &'static str {
        "lead_sheet"
    }

    async fn send(&self, record: &DeliveryRecord) -> Result<(), DeliveryError> {
        let body = LeadPayload {
            name: &record.name,
            phone: &record.phone,
            user_id: &record.user_id,
            comment: record.comment(),
            source: "quiz",
        };
        post_json(&self.client, &self.url, &body).await
    }
}
