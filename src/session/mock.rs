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
//! Internal mock structures for the [SessionCacheProvider](super::SessionCacheProvider).
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;

use crate::config::Config;
use crate::plugin_manager::PluginManager;
use crate::session::{Session, SessionCacheApi, SessionCacheProviderError};

mock! {
    pub SessionCacheProvider {
        pub fn new(cfg: &Config, plugin_manager: &PluginManager) -> Result<Self, SessionCacheProviderError>;
    }

    #[async_trait]
    impl SessionCacheApi for SessionCacheProvider {
        async fn get(&self, session_id: &str) -> Result<Option<Session>, SessionCacheProviderError>;

        async fn put(&self, session: &Session, ttl: Duration) -> Result<(), SessionCacheProviderError>;

        async fn invalidate(&self, session_id: &str) -> Result<(), SessionCacheProviderError>;

        async fn purge_expired(&self) -> Result<usize, SessionCacheProviderError>;
    }

    impl Clone for SessionCacheProvider {
        fn clone(&self) -> Self;
    }
}
