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
//! End to end authentication flows.

use std::sync::Arc;

use httpmock::MockServer;
use serde_json::json;

use identity_gateway::audit::AuditEventType;
use identity_gateway::config::RevocationPolicy;
use identity_gateway::context::RequestContext;
use identity_gateway::directory::Credentials;
use identity_gateway::pipeline::PipelineError;
use identity_gateway::plugin_manager::PluginManager;

use crate::common::{self, TOKEN_PATH, UnreachableCache};

#[tokio::test]
async fn test_login_validate_refresh_sign_out() {
    let server = MockServer::start_async().await;
    let (accepted, _rejected) = common::realm(&server).await;
    let (pipeline, audit) = common::pipeline(common::config(&server), PluginManager::default());
    let ctx = RequestContext::default();

    let token = pipeline
        .verify_credentials(&ctx, &Credentials::new("alice", "wonderland"))
        .await
        .unwrap();
    accepted.assert();
    assert_eq!("alice", token.claims().subject_id);
    assert!(token.claims().roles.contains("user"));
    assert!(token.claims().roles.contains("ROLE_REPORTS"));

    let principal = pipeline.validate_token(&ctx, token.serialized()).await.unwrap();
    assert_eq!("alice", principal.subject_id());
    assert_eq!(
        Some("alice@example.com"),
        principal.display_attributes().get("email").map(String::as_str)
    );

    let refreshed = pipeline.refresh_token(&ctx, token.serialized()).await.unwrap();
    assert!(matches!(
        pipeline.validate_token(&ctx, token.serialized()).await,
        Err(PipelineError::SessionRevoked)
    ));

    pipeline.revoke_session(&ctx, refreshed.serialized()).await.unwrap();
    let err = pipeline
        .validate_token(&ctx, refreshed.serialized())
        .await
        .unwrap_err();
    assert_eq!("TKN-302", err.code());

    pipeline.state().terminate().await;
    assert_eq!(0, pipeline.state().pending_audit_tasks());
    let types = audit.event_types();
    assert_eq!(
        vec![AuditEventType::AuthSuccess, AuditEventType::TokenIssued],
        types[..2].to_vec()
    );
    assert!(types.contains(&AuditEventType::SessionRevoked));
    assert_eq!(
        2,
        types
            .iter()
            .filter(|t| **t == AuditEventType::TokenRejected)
            .count()
    );
}

#[tokio::test]
async fn test_wrong_password() {
    let server = MockServer::start_async().await;
    let (_accepted, rejected) = common::realm(&server).await;
    let (pipeline, audit) = common::pipeline(common::config(&server), PluginManager::default());

    let err = pipeline
        .verify_credentials(
            &RequestContext::default(),
            &Credentials::new("alice", "wrong"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidCredentials));
    // Stable rejections are never retried.
    rejected.assert_hits(1);

    pipeline.state().terminate().await;
    assert_eq!(vec![AuditEventType::AuthFailure], audit.event_types());
    assert_eq!(
        Some("invalid credentials: Invalid user credentials"),
        audit.0.lock().unwrap()[0].reason.as_deref()
    );
}

#[tokio::test]
async fn test_directory_outage_opens_circuit() {
    let server = MockServer::start_async().await;
    let outage = server
        .mock_async(|when, then| {
            when.method("POST").path(TOKEN_PATH);
            then.status(503).json_body(json!({"error": "unavailable"}));
        })
        .await;
    let mut config = common::config(&server);
    config.directory_resilience.retry_attempts = 1;
    config.directory_resilience.circuit_window_size = 4;
    config.directory_resilience.circuit_minimum_calls = 4;
    let (pipeline, _audit) = common::pipeline(config, PluginManager::default());
    let credentials = Credentials::new("alice", "wonderland");

    for _ in 0..4 {
        let err = pipeline
            .verify_credentials(&RequestContext::default(), &credentials)
            .await
            .unwrap_err();
        assert_eq!("AUTH-104", err.code());
    }
    let err = pipeline
        .verify_credentials(&RequestContext::default(), &credentials)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::DependencyCircuitOpen { .. }));
    outage.assert_hits(4);

    let health = pipeline.state().health();
    assert_eq!(
        json!("OPEN"),
        serde_json::to_value(&health["directory"]).unwrap()["state"]
    );
}

#[tokio::test]
async fn test_cache_outage() {
    let server = MockServer::start_async().await;
    let _realm = common::realm(&server).await;
    let mut plugin_manager = PluginManager::default();
    plugin_manager.register_session_cache_backend("unreachable", Arc::new(UnreachableCache));
    let mut config = common::config(&server);
    config.session.driver = "unreachable".into();

    // Logins keep working and tokens are accepted on their signature.
    let (pipeline, _audit) = common::pipeline(config.clone(), plugin_manager.clone());
    let ctx = RequestContext::default();
    let token = pipeline
        .verify_credentials(&ctx, &Credentials::new("alice", "wonderland"))
        .await
        .unwrap();
    let principal = pipeline.validate_token(&ctx, token.serialized()).await.unwrap();
    assert_eq!("alice", principal.subject_id());
    assert!(matches!(
        pipeline.revoke_session(&ctx, token.serialized()).await,
        Err(PipelineError::ServiceUnavailable { .. })
    ));

    // Strict deployments refuse tokens whose session cannot be confirmed.
    config.session.revocation_policy = RevocationPolicy::RequireConfirmation;
    let (strict, _audit) = common::pipeline(config, plugin_manager);
    assert!(matches!(
        strict.validate_token(&ctx, token.serialized()).await,
        Err(PipelineError::ServiceUnavailable { .. })
    ));
}
