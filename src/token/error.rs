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
//! Token provider errors.
use thiserror::Error;

/// Token provider error.
#[derive(Error, Debug)]
pub enum TokenProviderError {
    /// The token expired.
    #[error("token expired")]
    Expired,

    /// Expiration calculation overflowed.
    #[error("token expiry calculation failed")]
    ExpiryCalculation,

    /// The token cannot be decoded.
    #[error("malformed token")]
    Malformed,

    /// The token was not signed by this gateway.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Key material is missing or unusable.
    #[error("signing key unavailable: {0}")]
    SigningKeyUnavailable(String),

    /// Key file cannot be read.
    #[error("cannot read key file {path}: {source}")]
    KeyFile {
        path: String,
        source: std::io::Error,
    },
}
