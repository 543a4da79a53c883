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
//! Session cache types.
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::directory::Principal;
use crate::session::error::SessionCacheProviderError;

/// Server side record binding a session id to a principal.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Session {
    /// Opaque, unguessable identifier.
    pub session_id: String,
    pub principal: Principal,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// New session with a freshly generated id.
    pub fn new(
        principal: Principal,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, SessionCacheProviderError> {
        // Whole seconds, as stored and as stamped into the token.
        let issued_at = DateTime::from_timestamp(issued_at.timestamp(), 0)
            .ok_or(SessionCacheProviderError::ExpiryCalculation)?;
        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or(SessionCacheProviderError::ExpiryCalculation)?;
        Ok(Self {
            session_id: generate_session_id(),
            principal,
            issued_at,
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Remaining lifetime, `None` once expired.
    pub fn time_to_live(&self) -> Option<Duration> {
        (self.expires_at - Utc::now())
            .to_std()
            .ok()
            .filter(|ttl| !ttl.is_zero())
    }
}

/// 256 random bits, url safe base64 encoded.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Session cache interface.
#[async_trait]
pub trait SessionCacheApi: Send + Sync + Clone {
    /// Look the session up. `None` is a miss (never stored, expired or
    /// invalidated).
    async fn get(&self, session_id: &str) -> Result<Option<Session>, SessionCacheProviderError>;

    /// Store the session for `ttl`.
    async fn put(&self, session: &Session, ttl: Duration) -> Result<(), SessionCacheProviderError>;

    /// Drop the session.
    async fn invalidate(&self, session_id: &str) -> Result<(), SessionCacheProviderError>;

    /// Evict expired entries, returning their number.
    async fn purge_expired(&self) -> Result<usize, SessionCacheProviderError>;
}
