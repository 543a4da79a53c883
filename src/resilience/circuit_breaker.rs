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
//! # Circuit breaker
//!
//! Count based sliding window breaker. All state lives behind one mutex which
//! is held only for the constant time bookkeeping of an admission or an
//! outcome, never across an await point.
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ResilienceSection;

/// Breaker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Breaker tuning.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub window_size: usize,
    /// Failure rate in percent.
    pub failure_threshold: u8,
    pub minimum_calls: usize,
    pub cooldown: Duration,
    pub half_open_probes: u32,
    pub half_open_successes: u32,
}

impl From<&ResilienceSection> for CircuitBreakerConfig {
    fn from(value: &ResilienceSection) -> Self {
        let window_size = value.circuit_window_size.max(1);
        Self {
            window_size,
            failure_threshold: value.circuit_failure_threshold.clamp(1, 100),
            minimum_calls: value.circuit_minimum_calls.clamp(1, window_size),
            cooldown: value.circuit_cooldown(),
            half_open_probes: value.circuit_half_open_probes.max(1),
            half_open_successes: value.circuit_half_open_successes.max(1),
        }
    }
}

/// Point in time view of a breaker, used for health reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    /// Failures in the current window (closed) or `0` otherwise.
    pub failure_count: usize,
    pub last_transition_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// `true` marks a failed call.
    window: VecDeque<bool>,
    failure_count: usize,
    opened_at: Instant,
    last_transition_at: DateTime<Utc>,
    /// Incremented on every transition. Outcomes of calls admitted under an
    /// older generation are discarded.
    generation: u64,
    probes_in_flight: u32,
    probe_successes: u32,
}

/// Circuit breaker of a single dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    dependency: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

/// Admission ticket for one call.
///
/// Dropping the permit without settling it (the call was cancelled) records
/// nothing and frees the probe slot it may hold.
#[must_use]
#[derive(Debug)]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl CircuitPermit<'_> {
    /// The dependency answered.
    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_outcome(self.generation, false);
    }

    /// The dependency failed.
    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.on_outcome(self.generation, true);
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

impl CircuitBreaker {
    pub fn new<S: Into<String>>(dependency: S, config: CircuitBreakerConfig) -> Self {
        Self {
            dependency: dependency.into(),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                window: VecDeque::with_capacity(config.window_size),
                failure_count: 0,
                opened_at: Instant::now(),
                last_transition_at: Utc::now(),
                generation: 0,
                probes_in_flight: 0,
                probe_successes: 0,
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask for admission of a call. `None` means the circuit rejects it.
    pub fn try_acquire(&self) -> Option<CircuitPermit<'_>> {
        let mut inner = self.lock();
        if inner.state == CircuitState::Open {
            if inner.opened_at.elapsed() < self.config.cooldown {
                return None;
            }
            self.transition(&mut inner, CircuitState::HalfOpen);
        }
        match inner.state {
            CircuitState::Closed => Some(CircuitPermit {
                breaker: self,
                generation: inner.generation,
                probe: false,
                settled: false,
            }),
            CircuitState::HalfOpen if inner.probes_in_flight < self.config.half_open_probes => {
                inner.probes_in_flight += 1;
                Some(CircuitPermit {
                    breaker: self,
                    generation: inner.generation,
                    probe: true,
                    settled: false,
                })
            }
            _ => None,
        }
    }

    /// Current state view.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            last_transition_at: inner.last_transition_at,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    fn on_outcome(&self, generation: u64, failed: bool) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.window.push_back(failed);
                if failed {
                    inner.failure_count += 1;
                }
                if inner.window.len() > self.config.window_size
                    && inner.window.pop_front() == Some(true)
                {
                    inner.failure_count -= 1;
                }
                let calls = inner.window.len();
                if calls >= self.config.minimum_calls
                    && inner.failure_count * 100 >= calls * usize::from(self.config.failure_threshold)
                {
                    warn!(
                        dependency = %self.dependency,
                        failures = inner.failure_count,
                        calls,
                        "failure rate threshold reached, opening circuit"
                    );
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
                if failed {
                    warn!(dependency = %self.dependency, "probe call failed, reopening circuit");
                    self.transition(&mut inner, CircuitState::Open);
                } else {
                    inner.probe_successes += 1;
                    if inner.probe_successes >= self.config.half_open_successes {
                        info!(dependency = %self.dependency, "dependency recovered, closing circuit");
                        self.transition(&mut inner, CircuitState::Closed);
                    }
                }
            }
            CircuitState::Open => {}
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        debug!(dependency = %self.dependency, from = ?inner.state, ?to, "circuit transition");
        inner.state = to;
        inner.generation += 1;
        inner.last_transition_at = Utc::now();
        inner.window.clear();
        inner.failure_count = 0;
        inner.probes_in_flight = 0;
        inner.probe_successes = 0;
        if to == CircuitState::Open {
            inner.opened_at = Instant::now();
        }
    }
}
