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
//! Token provider types.
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::Principal;
use crate::token::error::TokenProviderError;

/// Claims carried by a gateway token.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claims {
    /// Subject of the principal.
    #[serde(rename = "sub")]
    pub subject_id: String,
    /// Session the token proves.
    #[serde(rename = "sid")]
    pub session_id: String,
    /// Roles of the principal at issuance.
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "iss")]
    pub issuer: String,
    /// Unique id of the token.
    #[serde(rename = "jti")]
    pub token_id: String,
}

impl Claims {
    /// Whether the token is past its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at.timestamp() < Utc::now().timestamp()
    }
}

/// Signed token.
#[derive(Clone, PartialEq)]
pub struct Token {
    serialized: String,
    claims: Claims,
}

impl Token {
    pub(super) fn new(serialized: String, claims: Claims) -> Self {
        Self { serialized, claims }
    }

    /// Compact serialization handed to the client.
    pub fn serialized(&self) -> &str {
        &self.serialized
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Signature segment of the serialized form.
    pub fn signature(&self) -> &str {
        self.serialized.rsplit('.').next().unwrap_or_default()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

/// Token service interface.
pub trait TokenApi: Send + Sync + Clone {
    /// Mint a token for the principal bound to the session.
    fn issue(
        &self,
        principal: &Principal,
        session_id: &str,
        ttl: Duration,
    ) -> Result<Token, TokenProviderError>;

    /// Verify and decode a presented token.
    fn validate(&self, serialized: &str) -> Result<Claims, TokenProviderError>;

    /// Configured token lifetime.
    fn ttl(&self) -> Duration;
}
