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
//! # Plugin manager
//!
//! A driver, also known as a backend, is an abstraction around the data access
//! needed by a particular provider. Drivers shipped with the gateway are
//! selected by name from the configuration; additional drivers implementing
//! the backend trait can be registered under a custom name before the service
//! starts and are then selected the same way.
//!
//! The [PluginManager] is responsible for picking the proper backend driver for
//! the provider.
use std::collections::HashMap;
use std::sync::Arc;

use crate::audit::backend::AuditBackend;
use crate::directory::backend::DirectoryBackend;
use crate::session::backend::SessionCacheBackend;

/// Plugin manager allowing to pass custom backend plugins implementing required
/// trait during the service start.
#[derive(Clone, Default)]
pub struct PluginManager {
    /// Audit backend plugins.
    audit_backends: HashMap<String, Arc<dyn AuditBackend>>,
    /// Directory backend plugins.
    directory_backends: HashMap<String, Arc<dyn DirectoryBackend>>,
    /// Session cache backend plugins.
    session_cache_backends: HashMap<String, Arc<dyn SessionCacheBackend>>,
}

impl PluginManager {
    /// Register audit backend.
    pub fn register_audit_backend<S: AsRef<str>>(
        &mut self,
        name: S,
        plugin: Arc<dyn AuditBackend>,
    ) {
        self.audit_backends.insert(name.as_ref().to_string(), plugin);
    }

    /// Register directory backend.
    pub fn register_directory_backend<S: AsRef<str>>(
        &mut self,
        name: S,
        plugin: Arc<dyn DirectoryBackend>,
    ) {
        self.directory_backends
            .insert(name.as_ref().to_string(), plugin);
    }

    /// Register session cache backend.
    pub fn register_session_cache_backend<S: AsRef<str>>(
        &mut self,
        name: S,
        plugin: Arc<dyn SessionCacheBackend>,
    ) {
        self.session_cache_backends
            .insert(name.as_ref().to_string(), plugin);
    }

    /// Get registered audit backend.
    pub fn get_audit_backend<S: AsRef<str>>(&self, name: S) -> Option<&Arc<dyn AuditBackend>> {
        self.audit_backends.get(name.as_ref())
    }

    /// Get registered directory backend.
    pub fn get_directory_backend<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Option<&Arc<dyn DirectoryBackend>> {
        self.directory_backends.get(name.as_ref())
    }

    /// Get registered session cache backend.
    pub fn get_session_cache_backend<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Option<&Arc<dyn SessionCacheBackend>> {
        self.session_cache_backends.get(name.as_ref())
    }
}
