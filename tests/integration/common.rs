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
//! Shared fixtures of the integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use httpmock::{Mock, MockServer};
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::SecretString;
use serde_json::json;

use identity_gateway::audit::backend::AuditBackend;
use identity_gateway::audit::{AuditEvent, AuditEventType, AuditProviderError};
use identity_gateway::config::Config;
use identity_gateway::gateway::Service;
use identity_gateway::pipeline::AuthenticationPipeline;
use identity_gateway::plugin_manager::PluginManager;
use identity_gateway::provider::Provider;
use identity_gateway::session::SessionCacheProviderError;
use identity_gateway::session::backend::SessionCacheBackend;

pub static TOKEN_PATH: &str = "/realms/corp/protocol/openid-connect/token";

/// Configuration pointing the directory at the mock server.
pub fn config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.token.signing_key = Some(SecretString::from("integration-signing-key"));
    config.keycloak.server_url = server.base_url();
    config.keycloak.realm = "corp".into();
    config.keycloak.client_id = "gateway".into();
    config.keycloak.client_secret = Some(SecretString::from("client-secret"));
    config.directory_resilience.retry_backoff_base_ms = 10;
    config.cache_resilience.retry_backoff_base_ms = 10;
    config
}

/// Access token the mocked realm hands out for alice.
pub fn access_token() -> String {
    let claims = json!({
        "sub": "alice",
        "preferred_username": "alice",
        "email": "alice@example.com",
        "realm_access": {"roles": ["user"]},
        "groups": ["/corp/APP_REPORTS"],
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret("realm-private".as_ref()),
    )
    .unwrap()
}

/// Realm accepting alice with the password `wonderland` and refusing the
/// password `wrong`.
pub async fn realm(server: &MockServer) -> (Mock<'_>, Mock<'_>) {
    let accepted = server
        .mock_async(|when, then| {
            when.method("POST")
                .path(TOKEN_PATH)
                .form_urlencoded_tuple("grant_type", "password")
                .form_urlencoded_tuple("username", "alice")
                .form_urlencoded_tuple("password", "wonderland");
            then.status(200)
                .json_body(json!({"access_token": access_token(), "token_type": "Bearer"}));
        })
        .await;
    let rejected = server
        .mock_async(|when, then| {
            when.method("POST")
                .path(TOKEN_PATH)
                .form_urlencoded_tuple("grant_type", "password")
                .form_urlencoded_tuple("password", "wrong");
            then.status(401).json_body(
                json!({"error": "invalid_grant", "error_description": "Invalid user credentials"}),
            );
        })
        .await;
    (accepted, rejected)
}

/// Audit backend recording the published events.
#[derive(Clone, Default)]
pub struct RecordingAudit(pub Arc<Mutex<Vec<AuditEvent>>>);

impl RecordingAudit {
    pub fn event_types(&self) -> Vec<AuditEventType> {
        self.0.lock().unwrap().iter().map(|e| e.event_type).collect()
    }
}

#[async_trait]
impl AuditBackend for RecordingAudit {
    async fn publish(&self, event: &AuditEvent) -> Result<(), AuditProviderError> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Session cache that is never reachable.
pub struct UnreachableCache;

#[async_trait]
impl SessionCacheBackend for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, SessionCacheProviderError> {
        Err(SessionCacheProviderError::Unavailable("connection refused".into()))
    }

    async fn set(
        &self,
        _key: &str,
        _value: String,
        _ttl: Duration,
    ) -> Result<(), SessionCacheProviderError> {
        Err(SessionCacheProviderError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), SessionCacheProviderError> {
        Err(SessionCacheProviderError::Unavailable("connection refused".into()))
    }

    async fn purge_expired(&self) -> Result<usize, SessionCacheProviderError> {
        Ok(0)
    }
}

/// Pipeline over the given configuration with the recording audit driver.
pub fn pipeline(
    mut config: Config,
    mut plugin_manager: PluginManager,
) -> (AuthenticationPipeline, RecordingAudit) {
    let audit = RecordingAudit::default();
    plugin_manager.register_audit_backend("recording", Arc::new(audit.clone()));
    config.audit.driver = "recording".into();
    let provider = Provider::new(config.clone(), plugin_manager).unwrap();
    let state = Arc::new(Service::new(config, provider));
    (AuthenticationPipeline::new(state), audit)
}
