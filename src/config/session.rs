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
//! # Session configuration
use serde::Deserialize;

/// Session cache.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionSection {
    /// Session cache backend driver.
    #[serde(default = "default_session_driver")]
    pub driver: String,
    /// Session lifetime in seconds. Should not be shorter than the token
    /// expiration, otherwise tokens become revoked before they expire.
    #[serde(default = "default_session_expiration")]
    pub expiration: u64,
    /// Behavior of the token validation when the session cache cannot be
    /// consulted.
    #[serde(default)]
    pub revocation_policy: RevocationPolicy,
    /// Whether sessions may be explicitly refreshed.
    #[serde(default = "default_true")]
    pub allow_refresh: bool,
    /// Interval (in seconds) of the expired session purge.
    #[serde(default = "default_purge_interval")]
    pub purge_interval: u64,
}

/// Revocation check policy.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevocationPolicy {
    /// Accept a well signed, unexpired token when the cache is unreachable.
    #[default]
    FavorAvailability,
    /// Reject the token when the session cannot be confirmed.
    RequireConfirmation,
}

fn default_session_driver() -> String {
    "memory".into()
}

fn default_session_expiration() -> u64 {
    900
}

fn default_true() -> bool {
    true
}

fn default_purge_interval() -> u64 {
    60
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            driver: default_session_driver(),
            expiration: default_session_expiration(),
            revocation_policy: RevocationPolicy::default(),
            allow_refresh: default_true(),
            purge_interval: default_purge_interval(),
        }
    }
}
