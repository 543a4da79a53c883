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
//! # Retry policy
//!
//! Exponential backoff with jitter, retrying only transient failures.
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::Transient;
use crate::config::ResilienceSection;

/// Retry settings.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Upper bound of a single delay.
    pub backoff_max: Duration,
}

impl From<&ResilienceSection> for RetryPolicy {
    fn from(value: &ResilienceSection) -> Self {
        Self {
            max_attempts: value.retry_attempts.max(1),
            backoff_base: value.retry_backoff_base(),
            backoff_max: value.retry_backoff_max(),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt number `attempt` (starting
    /// at 1). The exponential delay is capped at `backoff_max`, then up to
    /// 10% of jitter is added so that capped retries of concurrent callers
    /// still spread.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let capped = self
            .backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.backoff_max);
        let jitter_ms = u64::try_from(capped.as_millis() / 10).unwrap_or(u64::MAX);
        let jitter = Duration::from_millis(rand::rng().random_range(0..=jitter_ms));
        capped.saturating_add(jitter)
    }

    /// Run `operation` until it succeeds, fails with a non transient error or
    /// the attempts are exhausted.
    pub async fn execute<F, Fut, T, E>(&self, dependency: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    debug!(dependency, attempt, ?delay, error = %err, "retrying transient failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
