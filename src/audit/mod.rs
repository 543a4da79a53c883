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
//! # Audit provider
//!
//! Publishes authentication events to an append-only stream. Publishing is
//! fire-and-forget from the point of view of the authentication outcome:
//! the pipeline dispatches events on detached tasks and never waits for or
//! fails on them.
//!
//! Following drivers are available:
//!
//! - `log` writes structured records on the `audit` tracing target (default).
//! - `kafka_rest` produces JSON records through a Kafka REST proxy
//!   (`[kafka_rest]` section).
use std::sync::Arc;

use async_trait::async_trait;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::config::Config;
use crate::plugin_manager::PluginManager;
use backend::{AuditBackend, kafka_rest::KafkaRestBackend, log::LogBackend};

pub use error::AuditProviderError;
#[cfg(test)]
pub use mock::MockAuditProvider;
pub use types::*;

/// Audit provider.
#[derive(Clone)]
pub struct AuditProvider {
    /// Backend driver.
    backend_driver: Arc<dyn AuditBackend>,
}

impl AuditProvider {
    pub fn new(config: &Config, plugin_manager: &PluginManager) -> Result<Self, AuditProviderError> {
        let backend_driver: Arc<dyn AuditBackend> =
            if let Some(driver) = plugin_manager.get_audit_backend(config.audit.driver.clone()) {
                driver.clone()
            } else {
                match config.audit.driver.as_str() {
                    "log" => Arc::new(LogBackend::default()),
                    "kafka_rest" => Arc::new(KafkaRestBackend::new(&config.kafka_rest)?),
                    _ => {
                        return Err(AuditProviderError::UnsupportedDriver(
                            config.audit.driver.clone(),
                        ));
                    }
                }
            };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl AuditApi for AuditProvider {
    #[tracing::instrument(level = "debug", skip_all, fields(event_type = ?event.event_type))]
    async fn publish(&self, event: &AuditEvent) -> Result<(), AuditProviderError> {
        self.backend_driver.publish(event).await
    }
}
