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
//! # Audit configuration
use serde::Deserialize;

/// Audit publisher.
#[derive(Debug, Deserialize, Clone)]
pub struct AuditSection {
    /// Audit backend driver.
    #[serde(default = "default_audit_driver")]
    pub driver: String,
}

fn default_audit_driver() -> String {
    "log".into()
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            driver: default_audit_driver(),
        }
    }
}

/// Kafka REST proxy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KafkaRestSection {
    /// Base url of the REST proxy.
    pub url: String,
    /// Topic receiving the authentication events.
    pub topic: String,
}

impl Default for KafkaRestSection {
    fn default() -> Self {
        Self {
            url: "http://localhost:8082".into(),
            topic: "auth-audit".into(),
        }
    }
}
