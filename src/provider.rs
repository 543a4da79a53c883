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
//! # Provider manager
//!
//! Provider manager provides access to the individual service providers. This
//! gives an easy interact for passing overall manager down to the pipeline
//! while also allowing an easy injection of mocked providers.
use derive_builder::Builder;
use mockall_double::double;

use crate::audit::AuditApi;
#[double]
use crate::audit::AuditProvider;
use crate::config::Config;
use crate::directory::DirectoryApi;
#[double]
use crate::directory::DirectoryProvider;
use crate::error::{BuilderError, GatewayError};
use crate::plugin_manager::PluginManager;
use crate::session::SessionCacheApi;
#[double]
use crate::session::SessionCacheProvider;
use crate::token::{TokenApi, TokenProvider};

/// Global provider manager.
#[derive(Builder, Clone)]
// It is necessary to use the owned pattern since otherwise builder invokes clone which immediately
// confuses mockall used in tests
#[builder(pattern = "owned", build_fn(error = "BuilderError"))]
pub struct Provider {
    /// Configuration.
    pub config: Config,
    /// Audit provider.
    audit: AuditProvider,
    /// Directory provider.
    directory: DirectoryProvider,
    /// Session cache provider.
    session_cache: SessionCacheProvider,
    /// Token provider.
    token: TokenProvider,
}

impl Provider {
    pub fn new(cfg: Config, plugin_manager: PluginManager) -> Result<Self, GatewayError> {
        let audit_provider = AuditProvider::new(&cfg, &plugin_manager)?;
        let directory_provider = DirectoryProvider::new(&cfg, &plugin_manager)?;
        let session_cache_provider = SessionCacheProvider::new(&cfg, &plugin_manager)?;
        let token_provider = TokenProvider::new(&cfg)?;

        Ok(Self {
            config: cfg,
            audit: audit_provider,
            directory: directory_provider,
            session_cache: session_cache_provider,
            token: token_provider,
        })
    }

    /// Get the audit provider.
    pub fn get_audit_provider(&self) -> &impl AuditApi {
        &self.audit
    }

    /// Get the directory provider.
    pub fn get_directory_provider(&self) -> &impl DirectoryApi {
        &self.directory
    }

    /// Get the session cache provider.
    pub fn get_session_cache_provider(&self) -> &impl SessionCacheApi {
        &self.session_cache
    }

    /// Get the token provider.
    pub fn get_token_provider(&self) -> &impl TokenApi {
        &self.token
    }
}

#[cfg(test)]
impl Provider {
    /// Builder with empty mocks and a real token provider signing with the
    /// test key.
    pub fn mocked_builder() -> ProviderBuilder {
        let config = crate::tests::config();
        let audit_mock = crate::audit::MockAuditProvider::default();
        let directory_mock = crate::directory::MockDirectoryProvider::default();
        let session_cache_mock = crate::session::MockSessionCacheProvider::default();
        let token_provider = TokenProvider::new(&config).expect("test signing key");

        ProviderBuilder::default()
            .config(config)
            .audit(audit_mock)
            .directory(directory_mock)
            .session_cache(session_cache_mock)
            .token(token_provider)
    }
}
