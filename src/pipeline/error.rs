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
//! Pipeline errors.
use std::fmt::Display;

use thiserror::Error;

use crate::directory::DirectoryProviderError;
use crate::resilience::{CACHE, DIRECTORY, ResilienceError};
use crate::session::SessionCacheProviderError;
use crate::token::TokenProviderError;

/// Outcome of a pipeline operation that did not succeed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A required dependency failed after the retry budget was spent.
    #[error("{dependency} unavailable: {reason}")]
    ServiceUnavailable { dependency: String, reason: String },

    #[error("rate limit for {dependency} exceeded")]
    RateLimited { dependency: String },

    #[error("circuit for {dependency} is open")]
    DependencyCircuitOpen { dependency: String },

    #[error("token expired")]
    TokenExpired,

    #[error("session revoked")]
    SessionRevoked,

    #[error("malformed token")]
    TokenMalformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("session refresh is disabled")]
    RefreshDisabled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stable machine readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "AUTH-100",
            Self::ServiceUnavailable { .. } => "AUTH-104",
            Self::RateLimited { .. } => "GEN-902",
            Self::DependencyCircuitOpen { .. } => "GEN-903",
            Self::DeadlineExceeded => "GEN-904",
            Self::Cancelled => "GEN-905",
            Self::TokenExpired => "TKN-301",
            Self::SessionRevoked => "TKN-302",
            Self::TokenMalformed => "TKN-303",
            Self::SignatureInvalid => "TKN-304",
            Self::RefreshDisabled => "TKN-305",
        }
    }

    /// Whether the request itself was refused, as opposed to a dependency
    /// or the caller giving up.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::TokenExpired
                | Self::SessionRevoked
                | Self::TokenMalformed
                | Self::SignatureInvalid
                | Self::RefreshDisabled
        )
    }

    pub(crate) fn unavailable<D: Into<String>, R: Display>(dependency: D, reason: R) -> Self {
        Self::ServiceUnavailable {
            dependency: dependency.into(),
            reason: reason.to_string(),
        }
    }

    fn from_guarded<E>(err: ResilienceError<E>, operation: impl FnOnce(E) -> Self) -> Self {
        match err {
            ResilienceError::RateLimited { dependency } => Self::RateLimited { dependency },
            ResilienceError::CircuitOpen { dependency } => Self::DependencyCircuitOpen { dependency },
            ResilienceError::Timeout {
                dependency,
                timeout,
            } => Self::unavailable(dependency, format!("no response within {timeout:?}")),
            ResilienceError::Operation(err) => operation(err),
        }
    }
}

impl From<ResilienceError<DirectoryProviderError>> for PipelineError {
    fn from(value: ResilienceError<DirectoryProviderError>) -> Self {
        Self::from_guarded(value, |err| match err {
            DirectoryProviderError::InvalidCredentials(_) => Self::InvalidCredentials,
            other => Self::unavailable(DIRECTORY, other),
        })
    }
}

impl From<ResilienceError<SessionCacheProviderError>> for PipelineError {
    fn from(value: ResilienceError<SessionCacheProviderError>) -> Self {
        Self::from_guarded(value, |err| Self::unavailable(CACHE, err))
    }
}

impl From<TokenProviderError> for PipelineError {
    fn from(value: TokenProviderError) -> Self {
        match value {
            TokenProviderError::Expired => Self::TokenExpired,
            TokenProviderError::Malformed => Self::TokenMalformed,
            TokenProviderError::SignatureInvalid => Self::SignatureInvalid,
            other => Self::unavailable("token", other),
        }
    }
}
