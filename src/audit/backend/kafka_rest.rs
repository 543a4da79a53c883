// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0
//! # Kafka REST audit driver
//!
//! Produces events through a Kafka REST proxy (v2 JSON embedded format).
//! Every record is keyed by the subject id so that events of one subject
//! land on the same partition and keep their order.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::audit::backend::AuditBackend;
use crate::audit::{AuditEvent, AuditProviderError};
use crate::config::KafkaRestSection;

static CONTENT_TYPE: &str = "application/vnd.kafka.json.v2+json";

#[derive(Clone, Debug)]
pub struct KafkaRestBackend {
    client: Client,
    topic_url: Url,
}

#[derive(Serialize)]
struct ProduceRequest<'a> {
    records: [Record<'a>; 1],
}

#[derive(Serialize)]
struct Record<'a> {
    key: Option<&'a str>,
    value: &'a AuditEvent,
}

#[derive(Default, Deserialize)]
struct ProduceResponse {
    #[serde(default)]
    offsets: Vec<Offset>,
}

#[derive(Deserialize)]
struct Offset {
    error_code: Option<i64>,
    error: Option<String>,
}

impl KafkaRestBackend {
    pub fn new(config: &KafkaRestSection) -> Result<Self, AuditProviderError> {
        let mut base = Url::parse(&config.url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let topic_url = base.join(&format!("topics/{}", config.topic))?;
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { client, topic_url })
    }
}

#[async_trait]
impl AuditBackend for KafkaRestBackend {
    #[tracing::instrument(level = "debug", skip_all, fields(event_id = %event.event_id))]
    async fn publish(&self, event: &AuditEvent) -> Result<(), AuditProviderError> {
        let request = ProduceRequest {
            records: [Record {
                key: event.subject_id.as_deref(),
                value: event,
            }],
        };
        let response = self
            .client
            .post(self.topic_url.clone())
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .json(&request)
            .send()
            .await
            .map_err(|err| AuditProviderError::PublishFailed(err.without_url().to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AuditProviderError::PublishFailed(format!(
                "event stream returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(AuditProviderError::Rejected(format!(
                "event stream returned {status}"
            )));
        }

        let body: ProduceResponse = response.json().await.unwrap_or_default();
        if let Some(offset) = body.offsets.iter().find(|o| o.error_code.is_some()) {
            return Err(AuditProviderError::PublishFailed(
                offset.error.clone().unwrap_or_else(|| "record not acknowledged".into()),
            ));
        }
        debug!("audit event produced");
        Ok(())
    }
}
