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
//! Shared test fixtures.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use secrecy::SecretString;

use crate::audit::{AuditEvent, MockAuditProvider};
use crate::config::Config;
use crate::gateway::{Service, ServiceState};
use crate::provider::Provider;
use crate::session::{MockSessionCacheProvider, Session};

/// HMAC key used by the test configuration.
pub(crate) static SIGNING_KEY: &str = "test-signing-key-0123456789abcdef";

/// Default configuration with a usable signing key.
pub(crate) fn config() -> Config {
    let mut config = Config::default();
    config.token.signing_key = Some(SecretString::from(SIGNING_KEY));
    config
}

pub(crate) fn state(provider: Provider) -> ServiceState {
    Arc::new(Service::new(provider.config.clone(), provider))
}

/// Session cache mock keeping the sessions in memory.
pub(crate) fn session_cache() -> (MockSessionCacheProvider, Arc<Mutex<HashMap<String, Session>>>) {
    let store: Arc<Mutex<HashMap<String, Session>>> = Arc::default();
    let mut mock = MockSessionCacheProvider::default();
    let sessions = store.clone();
    mock.expect_put().returning(move |session, _| {
        sessions
            .lock()
            .unwrap()
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    });
    let sessions = store.clone();
    mock.expect_get()
        .returning(move |id| Ok(sessions.lock().unwrap().get(id).cloned()));
    let sessions = store.clone();
    mock.expect_invalidate().returning(move |id| {
        sessions.lock().unwrap().remove(id);
        Ok(())
    });
    (mock, store)
}

/// Audit mock recording the published events.
pub(crate) fn audit() -> (MockAuditProvider, Arc<Mutex<Vec<AuditEvent>>>) {
    let events: Arc<Mutex<Vec<AuditEvent>>> = Arc::default();
    let mut mock = MockAuditProvider::default();
    let published = events.clone();
    mock.expect_publish().returning(move |event| {
        published.lock().unwrap().push(event.clone());
        Ok(())
    });
    (mock, events)
}
