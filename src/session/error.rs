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
//! Session cache provider errors.
use thiserror::Error;

use crate::resilience::Transient;

/// Session cache provider error.
#[derive(Error, Debug)]
pub enum SessionCacheProviderError {
    /// The cache could not be reached or did not complete the operation.
    #[error("session cache unavailable: {0}")]
    Unavailable(String),

    /// Expiration calculation overflowed.
    #[error("session expiry calculation failed")]
    ExpiryCalculation,

    /// Session (de)serialization error.
    #[error("session serialization error: {}", source)]
    Serde {
        /// The source of the error.
        #[from]
        source: serde_json::Error,
    },

    /// Unsupported driver.
    #[error("unsupported driver `{0}` for the session cache provider")]
    UnsupportedDriver(String),
}

impl Transient for SessionCacheProviderError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
