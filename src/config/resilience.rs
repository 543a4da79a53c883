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
//! # Resilience policy configuration
//!
//! The same section layout is used for every guarded dependency
//! (`[directory_resilience]`, `[cache_resilience]`, `[audit_resilience]`).
use serde::Deserialize;
use std::time::Duration;

/// Per dependency rate limiting, circuit breaking, timeout and retry
/// settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ResilienceSection {
    /// Token bucket capacity: number of calls permitted per
    /// `rate_limit_interval_ms`. `0` disables rate limiting.
    pub rate_limit_requests: u32,
    /// Interval in milliseconds in which `rate_limit_requests` are
    /// replenished.
    pub rate_limit_interval_ms: u64,
    /// Number of most recent call outcomes the circuit breaker evaluates.
    pub circuit_window_size: usize,
    /// Failure rate (in percent) at which the circuit opens.
    pub circuit_failure_threshold: u8,
    /// Minimal number of recorded outcomes before the failure rate is
    /// evaluated.
    pub circuit_minimum_calls: usize,
    /// Time in milliseconds the circuit stays open before probing.
    pub circuit_cooldown_ms: u64,
    /// Number of concurrent probe calls permitted while half open.
    pub circuit_half_open_probes: u32,
    /// Consecutive probe successes required to close the circuit.
    pub circuit_half_open_successes: u32,
    /// Upper bound for a single attempt in milliseconds.
    pub timeout_ms: u64,
    /// Total number of attempts (including the first one) for transient
    /// failures.
    pub retry_attempts: u32,
    /// Base delay for the exponential backoff in milliseconds.
    pub retry_backoff_base_ms: u64,
    /// Upper bound of the backoff delay in milliseconds.
    pub retry_backoff_max_ms: u64,
}

impl Default for ResilienceSection {
    fn default() -> Self {
        Self {
            rate_limit_requests: 100,
            rate_limit_interval_ms: 1000,
            circuit_window_size: 20,
            circuit_failure_threshold: 50,
            circuit_minimum_calls: 10,
            circuit_cooldown_ms: 30_000,
            circuit_half_open_probes: 1,
            circuit_half_open_successes: 3,
            timeout_ms: 2000,
            retry_attempts: 3,
            retry_backoff_base_ms: 100,
            retry_backoff_max_ms: 2000,
        }
    }
}

impl ResilienceSection {
    /// Defaults for the session cache: short timeouts, a single retry.
    pub fn cache() -> Self {
        Self {
            timeout_ms: 250,
            retry_attempts: 2,
            ..Default::default()
        }
    }

    /// Defaults for the audit publisher: no rate limiting, more attempts.
    pub fn audit() -> Self {
        Self {
            rate_limit_requests: 0,
            retry_attempts: 5,
            ..Default::default()
        }
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }

    pub fn circuit_cooldown(&self) -> Duration {
        Duration::from_millis(self.circuit_cooldown_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff_base(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_base_ms)
    }

    pub fn retry_backoff_max(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_max_ms)
    }
}
