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
//! Audit provider types.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::error::AuditProviderError;
use crate::error::BuilderError;

/// Kind of the authentication event.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    AuthSuccess,
    AuthFailure,
    TokenIssued,
    TokenRejected,
    SessionRevoked,
}

impl AuditEventType {
    /// Name of the event type on the audit stream.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthSuccess => "AUTH_SUCCESS",
            Self::AuthFailure => "AUTH_FAILURE",
            Self::TokenIssued => "TOKEN_ISSUED",
            Self::TokenRejected => "TOKEN_REJECTED",
            Self::SessionRevoked => "SESSION_REVOKED",
        }
    }
}

/// Append-only authentication event.
#[derive(Builder, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct AuditEvent {
    #[builder(default = "Uuid::new_v4()")]
    pub event_id: Uuid,
    pub event_type: AuditEventType,
    /// Subject the event is about, when known.
    #[builder(default)]
    pub subject_id: Option<String>,
    #[builder(default = "Utc::now()")]
    pub timestamp: DateTime<Utc>,
    /// Correlation id of the request that produced the event.
    pub correlation_id: String,
    /// Failure or rejection reason.
    #[builder(default)]
    pub reason: Option<String>,
}

/// Audit publisher interface.
#[async_trait]
pub trait AuditApi: Send + Sync + Clone {
    /// Append the event to the audit stream.
    async fn publish(&self, event: &AuditEvent) -> Result<(), AuditProviderError>;
}
