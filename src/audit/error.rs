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
//! Audit provider errors.
use thiserror::Error;

use crate::resilience::Transient;

/// Audit provider error.
#[derive(Error, Debug)]
pub enum AuditProviderError {
    /// The event stream could not be reached or did not acknowledge.
    #[error("audit event publishing failed: {0}")]
    PublishFailed(String),

    /// The event stream refused the event.
    #[error("audit event rejected: {0}")]
    Rejected(String),

    /// Http client setup error.
    #[error(transparent)]
    HttpClient {
        /// The source of the error.
        #[from]
        source: reqwest::Error,
    },

    /// Unsupported driver.
    #[error("unsupported driver `{0}` for the audit provider")]
    UnsupportedDriver(String),

    /// Url parsing error
    #[error(transparent)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },
}

impl Transient for AuditProviderError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::PublishFailed(_))
    }
}
