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
//! Resilience errors.
use std::time::Duration;

use thiserror::Error;

use super::Transient;

/// Outcome of a guarded call that did not succeed.
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    /// The dependency's token bucket is empty.
    #[error("rate limit for {dependency} exceeded")]
    RateLimited { dependency: String },

    /// The dependency's circuit rejects calls.
    #[error("circuit for {dependency} is open")]
    CircuitOpen { dependency: String },

    /// The last attempt did not finish in time.
    #[error("{dependency} did not respond within {timeout:?}")]
    Timeout {
        dependency: String,
        timeout: Duration,
    },

    /// The operation itself failed.
    #[error("{0}")]
    Operation(E),
}

/// Failure of a single attempt.
#[derive(Debug, Error)]
pub(super) enum AttemptError<E> {
    #[error("{0}")]
    Failed(E),
    #[error("attempt timed out")]
    TimedOut,
}

impl<E: Transient> Transient for AttemptError<E> {
    fn is_transient(&self) -> bool {
        match self {
            Self::Failed(err) => err.is_transient(),
            Self::TimedOut => true,
        }
    }
}
