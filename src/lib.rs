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
//! # Identity gateway
//!
//! Authentication front door for an enterprise identity platform. The
//! gateway verifies credential pairs against a directory service, issues
//! signed self-contained tokens bound to server side sessions, validates
//! tokens on later requests and records an audit trail of every decision.
//!
//! The three remote dependencies (directory, session cache and audit
//! stream) are each guarded by a [resilience::ResilienceOrchestrator]
//! applying, in order, a token bucket rate limiter, a circuit breaker, a
//! per attempt timeout and a retry with exponential backoff. Failures of the
//! session cache and of the audit stream degrade the service but never turn
//! a valid login into a failed one.
//!
//! ```text
//!            ┌──────────────────────── AuthenticationPipeline ───────────────────────┐
//! request ──▶ directory (orchestrated) ─▶ token issue ─▶ session put ─▶ audit (detached)
//!            └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Providers follow the same layout: a `XxxApi` trait consumed by the
//! pipeline, a `XxxProvider` implementing it on top of a pluggable
//! `XxxBackend` driver selected by name from the configuration or registered
//! through the [plugin_manager::PluginManager].

pub mod audit;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod plugin_manager;
pub mod provider;
pub mod resilience;
pub mod serve;
pub mod session;
pub mod token;

#[cfg(test)]
mod tests;
