// src/delivery/crm.rs
//! CRM REST lead endpoint (`crm.lead.add`-style nested `fields` body).

use reqwest::Client;
use serde::Serialize;

use super::{post_json, DeliveryError, DeliveryRecord, Sink};

pub struct CrmLeadSink {
    client: Client,
    url: String,
}

impl CrmLeadSink {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct PhoneValue<'a> {
    value: &'a str,
    value_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LeadFields<'a> {
    name: &'a str,
    phone: Vec<PhoneValue<'a>>,
    comments: String,
    source_id: &'static str,
}

#[derive(Serialize)]
struct CrmPayload<'a> {
    fields: LeadFields<'a>,
}

impl<'a> CrmPayload<'a> {
    fn from_record(r: &'a DeliveryRecord) -> Self {
        Self {
            fields: LeadFields {
                name: &r.name,
                phone: vec![PhoneValue {
                    value: &r.phone,
                    value_type: "WORK",
                }],
                comments: r.comment(),
                source_id: "QUIZ",
            },
        }
    }
}

#[async_trait::async_trait]
impl Sink for CrmLeadSink {
    fn name(&self) -> &'static str {
        "crm"
    }

    async fn send(&self, record: &DeliveryRecord) -> Result<(), DeliveryError> {
        post_json(&self.client, &self.url, &CrmPayload::from_record(record)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Action, Decision, DecisionSource};
    use serde_json::json;

    #[test]
    fn nested_fields_shape() {
        let r = DeliveryRecord {
            user_id: "u".into(),
            name: "Not specified".into(),
            phone: "+79991234567".into(),
            ip: String::new(),
            user_agent: String::new(),
            answers_summary: String::new(),
            decision: Decision {
                score: 60.0,
                action: Action::Challenge,
                reason: "invalid phone".into(),
                source: DecisionSource::Heuristic,
            },
            ts: chrono::Utc::now(),
        };
        let v = serde_json::to_value(CrmPayload::from_record(&r)).unwrap();
        assert_eq!(
            v,
            json!({
                "fields": {
                    "NAME": "Not specified",
                    "PHONE": [{ "VALUE": "+79991234567", "VALUE_TYPE": "WORK" }],
                    "COMMENTS": "Antibot status: CHALLENGE (invalid phone)",
                    "SOURCE_ID": "QUIZ"
                }
            })
        );
    }
}
