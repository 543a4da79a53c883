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
//! # Gateway service
//!
//! Process wide state shared by every request: configuration, providers, the
//! per dependency resilience orchestrators and the tracker of detached audit
//! tasks.
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::info;

use crate::config::Config;
use crate::provider::Provider;
use crate::resilience::{CircuitSnapshot, Resilience};

pub struct Service {
    /// Config file
    pub config: Config,
    /// Service Provider
    pub provider: Provider,
    /// Resilience orchestrators of the remote dependencies.
    pub resilience: Resilience,
    /// Detached audit tasks.
    audit_tasks: TaskTracker,
}

pub type ServiceState = Arc<Service>;

impl Service {
    pub fn new(cfg: Config, provider: Provider) -> Self {
        Self {
            resilience: Resilience::new(&cfg),
            config: cfg,
            provider,
            audit_tasks: TaskTracker::new(),
        }
    }

    /// Run `task` detached from the caller.
    pub(crate) fn spawn_audit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.audit_tasks.spawn(task);
    }

    /// Number of audit tasks still running.
    pub fn pending_audit_tasks(&self) -> usize {
        self.audit_tasks.len()
    }

    /// Wait for every audit task spawned so far.
    pub async fn drain_audit(&self) {
        self.audit_tasks.close();
        self.audit_tasks.wait().await;
        self.audit_tasks.reopen();
    }

    /// Circuit state of the remote dependencies.
    pub fn health(&self) -> BTreeMap<String, CircuitSnapshot> {
        self.resilience.health()
    }

    pub async fn terminate(&self) {
        info!(
            pending_audit_tasks = self.audit_tasks.len(),
            "Terminating identity gateway"
        );
        self.audit_tasks.close();
        self.audit_tasks.wait().await;
    }
}
