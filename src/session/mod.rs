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
//! # Session cache provider
//!
//! Maps session ids to the cached [Session] records. The cache is an
//! optimization and a revocation signal, never a source of truth: misses and
//! failures are handled by the caller and never turn into authentication
//! failures on their own.
//!
//! Sessions are stored under `session:<session_id>` as JSON. The TTL handed
//! to the backend is the remaining session lifetime at write time.
//!
//! Default backend is the [backend::memory] driver.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::config::Config;
use crate::plugin_manager::PluginManager;
use backend::{SessionCacheBackend, memory::MemoryBackend};

pub use error::SessionCacheProviderError;
#[cfg(test)]
pub use mock::MockSessionCacheProvider;
pub use types::*;

/// Cache key of the session.
pub fn cache_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

/// Session cache provider.
#[derive(Clone)]
pub struct SessionCacheProvider {
    /// Backend driver.
    backend_driver: Arc<dyn SessionCacheBackend>,
}

impl SessionCacheProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, SessionCacheProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_session_cache_backend(config.session.driver.clone())
        {
            driver.clone()
        } else {
            match config.session.driver.as_str() {
                "memory" => Arc::new(MemoryBackend::default()),
                _ => {
                    return Err(SessionCacheProviderError::UnsupportedDriver(
                        config.session.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl SessionCacheApi for SessionCacheProvider {
    /// Fetch the session.
    ///
    /// Unreadable entries and sessions past their expiry are reported as a
    /// miss.
    #[tracing::instrument(level = "debug", skip(self, session_id))]
    async fn get(&self, session_id: &str) -> Result<Option<Session>, SessionCacheProviderError> {
        let Some(raw) = self.backend_driver.get(&cache_key(session_id)).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.session_id == session_id && !session.is_expired() => {
                Ok(Some(session))
            }
            Ok(_) => Ok(None),
            Err(err) => {
                warn!("discarding unreadable cached session: {}", err);
                Ok(None)
            }
        }
    }

    /// Store the session.
    ///
    /// A non positive `ttl` means the session is already over and nothing is
    /// written.
    #[tracing::instrument(level = "debug", skip(self, session), fields(subject = %session.principal.subject_id()))]
    async fn put(&self, session: &Session, ttl: Duration) -> Result<(), SessionCacheProviderError> {
        if ttl.is_zero() {
            return Ok(());
        }
        let raw = serde_json::to_string(session)?;
        self.backend_driver
            .set(&cache_key(&session.session_id), raw, ttl)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self, session_id))]
    async fn invalidate(&self, session_id: &str) -> Result<(), SessionCacheProviderError> {
        self.backend_driver.delete(&cache_key(session_id)).await
    }

    async fn purge_expired(&self) -> Result<usize, SessionCacheProviderError> {
        self.backend_driver.purge_expired().await
    }
}
