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
//! Directory provider errors.
use thiserror::Error;

use crate::error::BuilderError;
use crate::resilience::Transient;

/// Directory provider error.
#[derive(Error, Debug)]
pub enum DirectoryProviderError {
    /// The directory rejected the credentials, with the explanation it
    /// gave, if any.
    #[error("invalid credentials")]
    InvalidCredentials(Option<String>),

    /// The directory could not be reached or did not complete the operation.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// The directory refused the gateway itself (client registration, realm).
    #[error("directory refused the gateway client: {0}")]
    Misconfigured(String),

    /// The directory answered with something that cannot be interpreted.
    #[error("malformed directory response: {0}")]
    MalformedResponse(String),

    /// Unsupported driver.
    #[error("unsupported driver `{0}` for the directory provider")]
    UnsupportedDriver(String),

    /// Structures builder error.
    #[error(transparent)]
    Builder {
        /// The source of the error.
        #[from]
        source: BuilderError,
    },

    /// Http client setup error.
    #[error(transparent)]
    HttpClient {
        /// The source of the error.
        #[from]
        source: reqwest::Error,
    },

    /// Url parsing error
    #[error(transparent)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },
}

impl DirectoryProviderError {
    /// Explanation of a credentials rejection given by the directory.
    pub fn rejection_detail(&self) -> Option<&str> {
        match self {
            Self::InvalidCredentials(detail) => detail.as_deref(),
            _ => None,
        }
    }
}

impl Transient for DirectoryProviderError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
