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
//! Session cache backends.
//!
//! Backends are plain key/value stores with per entry expiry. The key layout
//! and the serialization are owned by the provider.
use std::time::Duration;

use async_trait::async_trait;

use crate::session::SessionCacheProviderError;

pub mod memory;

/// SessionCacheBackend trait.
///
/// Backend driver interface expected by the session cache provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionCacheBackend: Send + Sync {
    /// Get the value stored under the key unless it expired.
    async fn get(&self, key: &str) -> Result<Option<String>, SessionCacheProviderError>;

    /// Store the value for `ttl`, replacing an existing one.
    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), SessionCacheProviderError>;

    /// Remove the key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), SessionCacheProviderError>;

    /// Evict expired entries. Stores with native expiry return `0`.
    async fn purge_expired(&self) -> Result<usize, SessionCacheProviderError>;
}
