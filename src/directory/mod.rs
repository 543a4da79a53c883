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
//! # Directory provider
//!
//! Verifies credential pairs against the directory service holding the user
//! accounts. The provider performs exactly one backend round trip per call
//! and never retries on its own: retries, timeouts and circuit breaking are
//! applied by the caller through [crate::resilience].
//!
//! Failures are split into stable rejections
//! ([DirectoryProviderError::InvalidCredentials]) and transient failures
//! ([DirectoryProviderError::Unavailable]) which may succeed when repeated.
//!
//! Default backend is the [backend::keycloak] driver.
use std::sync::Arc;

use async_trait::async_trait;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::config::Config;
use crate::plugin_manager::PluginManager;
use backend::{DirectoryBackend, keycloak::KeycloakBackend};

pub use error::DirectoryProviderError;
#[cfg(test)]
pub use mock::MockDirectoryProvider;
pub use types::*;

/// Directory provider.
#[derive(Clone)]
pub struct DirectoryProvider {
    /// Backend driver.
    backend_driver: Arc<dyn DirectoryBackend>,
}

impl DirectoryProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, DirectoryProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_directory_backend(config.directory.driver.clone())
        {
            driver.clone()
        } else {
            match config.directory.driver.as_str() {
                "keycloak" => Arc::new(KeycloakBackend::new(&config.keycloak)?),
                _ => {
                    return Err(DirectoryProviderError::UnsupportedDriver(
                        config.directory.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl DirectoryApi for DirectoryProvider {
    /// Verify the credentials.
    ///
    /// Blank identifiers or secrets are rejected without contacting the
    /// directory.
    #[tracing::instrument(level = "info", skip(self, credentials))]
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, DirectoryProviderError> {
        if credentials.is_blank() {
            return Err(DirectoryProviderError::InvalidCredentials(None));
        }
        self.backend_driver.authenticate(credentials).await
    }
}
