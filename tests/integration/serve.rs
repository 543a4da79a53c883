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
//! Long-running line protocol over the built-in drivers.

use httpmock::MockServer;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use identity_gateway::audit::AuditEventType;
use identity_gateway::plugin_manager::PluginManager;
use identity_gateway::serve::serve;

use crate::common;

#[tokio::test]
async fn test_sessions_outlive_requests() {
    let server = MockServer::start_async().await;
    let (accepted, _rejected) = common::realm(&server).await;
    let (pipeline, audit) = common::pipeline(common::config(&server), PluginManager::default());

    let verify = json!({"op": "verify", "user": "alice", "secret": "wonderland", "correlation_id": "req-1"});
    let mut output = Vec::new();
    serve(
        &pipeline,
        format!("{verify}\n").as_bytes(),
        &mut output,
        CancellationToken::new(),
    )
    .await
    .unwrap();
    let issued: Value = serde_json::from_slice(&output).unwrap();
    let token = issued["result"]["token"].as_str().unwrap().to_string();
    accepted.assert();

    // A later batch of lines sees the session opened above.
    let input = [
        json!({"op": "validate", "token": token}),
        json!({"op": "revoke", "token": token}),
        json!({"op": "validate", "token": token}),
    ]
    .iter()
    .map(|line| format!("{line}\n"))
    .collect::<String>();
    let mut output = Vec::new();
    serve(&pipeline, input.as_bytes(), &mut output, CancellationToken::new())
        .await
        .unwrap();
    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(3, responses.len());
    assert_eq!("alice", responses[0]["result"]["principal"]["subject_id"]);
    assert_eq!(Some(true), responses[1]["result"]["revoked"].as_bool());
    assert_eq!("TKN-302", responses[2]["error"]["code"]);

    pipeline.state().terminate().await;
    let types = audit.event_types();
    assert!(types.contains(&AuditEventType::TokenIssued));
    assert!(types.contains(&AuditEventType::SessionRevoked));
    assert!(types.contains(&AuditEventType::TokenRejected));
}
