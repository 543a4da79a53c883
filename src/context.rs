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
//! # Request context
//!
//! Per-call envelope carried by every public pipeline operation: the
//! correlation id stamped onto audit events and spans, an optional deadline
//! and an optional cancellation token of the caller.
use std::future::{Future, pending};
use std::time::Duration;

use derive_builder::Builder;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::BuilderError;
use crate::pipeline::PipelineError;

/// Request context.
#[derive(Builder, Clone, Debug)]
#[builder(build_fn(error = "BuilderError"))]
pub struct RequestContext {
    /// Correlation id, generated when not given.
    #[builder(default = "Uuid::new_v4().to_string()", setter(into))]
    correlation_id: String,
    /// Point in time after which the caller is no longer interested.
    #[builder(default, setter(strip_option))]
    deadline: Option<Instant>,
    /// Cancellation signal of the caller.
    #[builder(default, setter(strip_option))]
    cancellation: Option<CancellationToken>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            deadline: None,
            cancellation: None,
        }
    }
}

impl RequestContextBuilder {
    /// Set the deadline `timeout` from now.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.deadline(Instant::now() + timeout)
    }
}

impl RequestContext {
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `operation` until it completes, the deadline elapses or the
    /// caller cancels. The operation future is dropped in the latter cases.
    pub(crate) async fn guard<T, F>(&self, operation: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        // The timer may not fire on the first poll for a deadline that
        // elapsed less than a tick ago.
        if self.cancellation.as_ref().is_some_and(|token| token.is_cancelled()) {
            return Err(PipelineError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(PipelineError::DeadlineExceeded);
        }
        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => pending().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancelled => Err(PipelineError::Cancelled),
            _ = deadline => Err(PipelineError::DeadlineExceeded),
            result = operation => result,
        }
    }
}
