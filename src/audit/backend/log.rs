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
//! # Log audit driver
//!
//! Writes every event as a structured record on the `audit` tracing target.
use async_trait::async_trait;
use tracing::info;

use crate::audit::backend::AuditBackend;
use crate::audit::{AuditEvent, AuditProviderError};

#[derive(Clone, Debug, Default)]
pub struct LogBackend {}

#[async_trait]
impl AuditBackend for LogBackend {
    async fn publish(&self, event: &AuditEvent) -> Result<(), AuditProviderError> {
        info!(
            target: "audit",
            event_id = %event.event_id,
            event_type = event.event_type.as_str(),
            subject_id = event.subject_id.as_deref().unwrap_or("-"),
            correlation_id = %event.correlation_id,
            reason = event.reason.as_deref().unwrap_or("-"),
            timestamp = %event.timestamp,
            "audit event"
        );
        Ok(())
    }
}
