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
//! # Resilience
//!
//! Every call to a remote dependency (directory, session cache, audit
//! stream) goes through a [ResilienceOrchestrator] owned by the service for
//! the lifetime of the process. The orchestrator applies its policies in a
//! fixed order:
//!
//!   1. rate limiter: an empty bucket rejects the call with
//!      [ResilienceError::RateLimited] before anything else is consulted,
//!   2. circuit breaker: an open circuit rejects the call with
//!      [ResilienceError::CircuitOpen] without invoking the operation,
//!   3. timeout: every single attempt is bounded,
//!   4. retry: transient failures are retried with exponential backoff.
//!
//! The breaker sees one outcome per call (after retries). Only transient
//! failures count against it; a stable rejection means the dependency
//! answered.
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

pub mod circuit_breaker;
pub mod error;
pub mod rate_limiter;
pub mod retry;

use crate::config::{Config, ResilienceSection};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState};
use error::AttemptError;
pub use error::ResilienceError;
use rate_limiter::TokenBucket;
use retry::RetryPolicy;

/// Dependency name of the directory client.
pub const DIRECTORY: &str = "directory";
/// Dependency name of the session cache.
pub const CACHE: &str = "cache";
/// Dependency name of the audit publisher.
pub const AUDIT: &str = "audit";

/// Classification of a failure for retry and circuit breaking.
pub trait Transient {
    /// `true` when the same call may succeed when repeated.
    fn is_transient(&self) -> bool;
}

impl<E: Transient> Transient for ResilienceError<E> {
    fn is_transient(&self) -> bool {
        match self {
            Self::Operation(err) => err.is_transient(),
            Self::Timeout { .. } => true,
            Self::RateLimited { .. } | Self::CircuitOpen { .. } => false,
        }
    }
}

/// Policy stack guarding one dependency.
#[derive(Debug)]
pub struct ResilienceOrchestrator {
    dependency: String,
    rate_limiter: Option<TokenBucket>,
    circuit_breaker: CircuitBreaker,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ResilienceOrchestrator {
    pub fn new<S: Into<String>>(dependency: S, config: &ResilienceSection) -> Self {
        let dependency = dependency.into();
        Self {
            rate_limiter: TokenBucket::new(config.rate_limit_requests, config.rate_limit_interval()),
            circuit_breaker: CircuitBreaker::new(dependency.clone(), config.into()),
            timeout: config.timeout(),
            retry: config.into(),
            dependency,
        }
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    /// State of the circuit breaker.
    pub fn circuit(&self) -> CircuitSnapshot {
        self.circuit_breaker.snapshot()
    }

    /// Invoke `operation` under the policies of the dependency.
    ///
    /// `operation` is called once per attempt. Dropping the returned future
    /// abandons the call without recording an outcome.
    pub async fn call<T, E, F, Fut>(&self, mut operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        if let Some(limiter) = &self.rate_limiter
            && !limiter.try_acquire()
        {
            debug!(dependency = %self.dependency, "call rejected by rate limiter");
            return Err(ResilienceError::RateLimited {
                dependency: self.dependency.clone(),
            });
        }

        let Some(permit) = self.circuit_breaker.try_acquire() else {
            debug!(dependency = %self.dependency, "call rejected by open circuit");
            return Err(ResilienceError::CircuitOpen {
                dependency: self.dependency.clone(),
            });
        };

        let timeout = self.timeout;
        let result = self
            .retry
            .execute(&self.dependency, || {
                let attempt = operation();
                async move {
                    match tokio::time::timeout(timeout, attempt).await {
                        Ok(Ok(val)) => Ok(val),
                        Ok(Err(err)) => Err(AttemptError::Failed(err)),
                        Err(_) => Err(AttemptError::TimedOut),
                    }
                }
            })
            .await;

        match result {
            Ok(val) => {
                permit.record_success();
                Ok(val)
            }
            Err(err) => {
                if err.is_transient() {
                    permit.record_failure();
                } else {
                    permit.record_success();
                }
                Err(match err {
                    AttemptError::Failed(err) => ResilienceError::Operation(err),
                    AttemptError::TimedOut => ResilienceError::Timeout {
                        dependency: self.dependency.clone(),
                        timeout,
                    },
                })
            }
        }
    }
}

/// Orchestrators of all guarded dependencies.
#[derive(Debug)]
pub struct Resilience {
    pub directory: ResilienceOrchestrator,
    pub cache: ResilienceOrchestrator,
    pub audit: ResilienceOrchestrator,
}

impl Resilience {
    pub fn new(config: &Config) -> Self {
        Self {
            directory: ResilienceOrchestrator::new(DIRECTORY, &config.directory_resilience),
            cache: ResilienceOrchestrator::new(CACHE, &config.cache_resilience),
            audit: ResilienceOrchestrator::new(AUDIT, &config.audit_resilience),
        }
    }

    /// Circuit state of every dependency keyed by the dependency name.
    pub fn health(&self) -> BTreeMap<String, CircuitSnapshot> {
        [&self.directory, &self.cache, &self.audit]
            .into_iter()
            .map(|orchestrator| (orchestrator.dependency().to_string(), orchestrator.circuit()))
            .collect()
    }
}
