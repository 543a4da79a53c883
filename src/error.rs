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
//! # Error
//!
//! Errors that can occur while wiring up and running the gateway (not the
//! per-request pipeline outcomes, see [crate::pipeline::PipelineError]).
use thiserror::Error;

use crate::audit::error::AuditProviderError;
use crate::directory::error::DirectoryProviderError;
use crate::session::error::SessionCacheProviderError;
use crate::token::error::TokenProviderError;

/// Gateway error.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    AuditProvider {
        /// The source of the error.
        #[from]
        source: AuditProviderError,
    },

    /// Provider builder error.
    #[error(transparent)]
    Builder {
        /// The source of the error.
        #[from]
        source: BuilderError,
    },

    #[error(transparent)]
    DirectoryProvider {
        /// The source of the error.
        #[from]
        source: DirectoryProviderError,
    },

    #[error(transparent)]
    SessionCacheProvider {
        /// The source of the error.
        #[from]
        source: SessionCacheProviderError,
    },

    #[error(transparent)]
    TokenProvider {
        /// The source of the error.
        #[from]
        source: TokenProviderError,
    },
}

/// Error raised by the `derive_builder` generated builders.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// A required field was not set.
    #[error("{0}")]
    UninitializedField(String),

    /// Custom validation failed.
    #[error("{0}")]
    Validation(String),
}

impl From<derive_builder::UninitializedFieldError> for BuilderError {
    fn from(ufe: derive_builder::UninitializedFieldError) -> BuilderError {
        BuilderError::UninitializedField(ufe.to_string())
    }
}

impl From<String> for BuilderError {
    fn from(s: String) -> Self {
        Self::Validation(s)
    }
}
