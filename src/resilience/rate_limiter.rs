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
//! # Rate limiter
//!
//! Token bucket per dependency backed by [governor].
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::warn;

/// Token bucket holding `requests` cells, refilled evenly over `interval`.
pub struct TokenBucket {
    limiter: DefaultDirectRateLimiter,
    quota: Quota,
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("quota", &self.quota)
            .finish()
    }
}

impl TokenBucket {
    /// Build the bucket. Returns `None` (no limiting) for zero requests or a
    /// zero interval.
    pub fn new(requests: u32, interval: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(requests)?;
        if interval.is_zero() {
            return None;
        }
        let period = match interval.checked_div(requests)? {
            Duration::ZERO => {
                warn!(
                    requests,
                    ?interval,
                    "rate limit interval too short for the request count, refilling every nanosecond"
                );
                Duration::from_nanos(1)
            }
            period => period,
        };
        let quota = Quota::with_period(period)?.allow_burst(burst);
        Some(Self {
            limiter: RateLimiter::direct(quota),
            quota,
        })
    }

    /// Take one cell, `false` when the bucket is exhausted.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn test_disabled() {
        assert!(TokenBucket::new(0, Duration::from_secs(1)).is_none());
        assert!(TokenBucket::new(10, Duration::ZERO).is_none());
    }

    #[test]
    #[traced_test]
    fn test_sub_nanosecond_period_still_limits() {
        let bucket = TokenBucket::new(1_000, Duration::from_nanos(10)).unwrap();
        assert_eq!(1_000, bucket.quota.burst_size().get());
        assert_eq!(Duration::from_nanos(1), bucket.quota.replenish_interval());
        assert!(bucket.try_acquire());
        assert!(logs_contain("rate limit interval too short"));
    }

    #[test]
    fn test_burst_capacity() {
        let bucket = TokenBucket::new(3, Duration::from_secs(60)).unwrap();
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }
}
