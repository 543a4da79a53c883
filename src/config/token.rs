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
//! # Token configuration
use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

/// Token signing.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenSection {
    /// Signature algorithm.
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
    /// Shared secret for the `HS*` algorithms.
    #[serde(default)]
    pub signing_key: Option<SecretString>,
    /// PEM encoded private key for the asymmetric algorithms.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,
    /// PEM encoded public key for the asymmetric algorithms.
    #[serde(default)]
    pub public_key_file: Option<PathBuf>,
    /// Value of the `iss` claim. Tokens from other issuers are rejected.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// The amount of time that a token should remain valid (in seconds).
    /// Tokens are bearer tokens, so a shorter duration reduces the impact of
    /// a leaked token.
    #[serde(default = "default_token_expiration")]
    pub expiration: u64,
}

fn default_algorithm() -> Algorithm {
    Algorithm::HS256
}

fn default_issuer() -> String {
    "identity-gateway".into()
}

fn default_token_expiration() -> u64 {
    900
}

impl Default for TokenSection {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            signing_key: None,
            private_key_file: None,
            public_key_file: None,
            issuer: default_issuer(),
            expiration: default_token_expiration(),
        }
    }
}
