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
//! # Line protocol
//!
//! Long running front end of the binary. Every input line carries one JSON
//! request and produces one JSON response line. All requests are served
//! against the same [ServiceState](crate::gateway::ServiceState), so the
//! sessions opened by `verify` are there for the later `validate`,
//! `refresh` and `revoke` requests.
//!
//! ```text
//! {"op":"verify","user":"alice","secret":"...","correlation_id":"req-1"}
//! {"op":"validate","token":"eyJ...","deadline_ms":500}
//! {"op":"refresh","token":"eyJ..."}
//! {"op":"revoke","token":"eyJ..."}
//! {"op":"health"}
//! ```
//!
//! Responses echo the correlation id and hold either a `result` or an
//! `error` with the stable code of the failure.
use std::io;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::context::{RequestContext, RequestContextBuilder};
use crate::directory::Credentials;
use crate::pipeline::{AuthenticationPipeline, PipelineError};

/// Code of a request line that cannot be understood.
pub const MALFORMED_REQUEST: &str = "GEN-901";

/// Pipeline operation requested by a line.
#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Verify { user: String, secret: String },
    Validate { token: String },
    Revoke { token: String },
    Refresh { token: String },
    Health,
}

/// One request line.
#[derive(Deserialize)]
pub struct Request {
    /// Correlation id, generated when not given.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Deadline of the request in milliseconds from its arrival.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    #[serde(flatten)]
    pub operation: Operation,
}

impl Request {
    fn context(&self, cancellation: &CancellationToken) -> Result<RequestContext, String> {
        let mut ctx = RequestContextBuilder::default();
        ctx.cancellation(cancellation.child_token());
        if let Some(correlation_id) = &self.correlation_id {
            ctx.correlation_id(correlation_id.clone());
        }
        if let Some(deadline) = self.deadline_ms {
            ctx.timeout(Duration::from_millis(deadline));
        }
        ctx.build().map_err(|err| err.to_string())
    }
}

/// Run one operation and render its outcome.
pub async fn dispatch(
    pipeline: &AuthenticationPipeline,
    ctx: &RequestContext,
    operation: Operation,
) -> Result<Value, PipelineError> {
    match operation {
        Operation::Verify { user, secret } => {
            let token = pipeline
                .verify_credentials(ctx, &Credentials::new(user, secret))
                .await?;
            Ok(json!({"token": token.serialized(), "claims": token.claims()}))
        }
        Operation::Validate { token } => {
            let principal = pipeline.validate_token(ctx, &token).await?;
            Ok(json!({"principal": principal}))
        }
        Operation::Revoke { token } => {
            pipeline.revoke_session(ctx, &token).await?;
            Ok(json!({"revoked": true}))
        }
        Operation::Refresh { token } => {
            let token = pipeline.refresh_token(ctx, &token).await?;
            Ok(json!({"token": token.serialized(), "claims": token.claims()}))
        }
        Operation::Health => Ok(json!({"dependencies": pipeline.state().health()})),
    }
}

/// Response to a single request line.
pub async fn handle_line(
    pipeline: &AuthenticationPipeline,
    line: &str,
    cancellation: &CancellationToken,
) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            // The serde message may quote parts of the line.
            debug!(line = err.line(), column = err.column(), "malformed request");
            return json!({"error": {"code": MALFORMED_REQUEST, "message": err.to_string()}});
        }
    };
    let ctx = match request.context(cancellation) {
        Ok(ctx) => ctx,
        Err(message) => {
            return json!({"error": {"code": MALFORMED_REQUEST, "message": message}});
        }
    };
    match dispatch(pipeline, &ctx, request.operation).await {
        Ok(result) => json!({"correlation_id": ctx.correlation_id(), "result": result}),
        Err(err) => json!({
            "correlation_id": ctx.correlation_id(),
            "error": {"code": err.code(), "message": err.to_string()},
        }),
    }
}

/// Serve request lines from `input` until it ends or `cancellation` fires.
///
/// A request in flight at cancellation completes with `GEN-905`.
pub async fn serve<R, W>(
    pipeline: &AuthenticationPipeline,
    input: R,
    mut output: W,
    cancellation: CancellationToken,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Serving requests");
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            biased;
            () = cancellation.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(pipeline, &line, &cancellation).await;
        let mut buf = serde_json::to_vec(&response)?;
        buf.push(b'\n');
        output.write_all(&buf).await?;
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{MockDirectoryProvider, Principal, PrincipalBuilder};
    use crate::provider::Provider;
    use crate::tests;

    fn alice() -> Principal {
        PrincipalBuilder::default()
            .subject_id("alice")
            .role("user")
            .build()
            .unwrap()
    }

    fn pipeline() -> AuthenticationPipeline {
        let mut directory = MockDirectoryProvider::default();
        directory
            .expect_authenticate()
            .withf(|credentials: &Credentials| credentials.principal_identifier() == "alice")
            .returning(|_| Ok(alice()));
        let (cache, _sessions) = tests::session_cache();
        let (audit, _events) = tests::audit();
        let provider = Provider::mocked_builder()
            .directory(directory)
            .session_cache(cache)
            .audit(audit)
            .build()
            .unwrap();
        AuthenticationPipeline::new(tests::state(provider))
    }

    async fn respond(pipeline: &AuthenticationPipeline, line: Value) -> Value {
        handle_line(pipeline, &line.to_string(), &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn test_session_spans_requests() {
        let pipeline = pipeline();

        let issued = respond(
            &pipeline,
            json!({"op": "verify", "user": "alice", "secret": "pass", "correlation_id": "req-1"}),
        )
        .await;
        assert_eq!("req-1", issued["correlation_id"]);
        let token = issued["result"]["token"].as_str().unwrap().to_string();

        let validated = respond(&pipeline, json!({"op": "validate", "token": token})).await;
        assert_eq!("alice", validated["result"]["principal"]["subject_id"]);

        let refreshed = respond(&pipeline, json!({"op": "refresh", "token": token})).await;
        let rotated = refreshed["result"]["token"].as_str().unwrap().to_string();
        let stale = respond(&pipeline, json!({"op": "validate", "token": token})).await;
        assert_eq!("TKN-302", stale["error"]["code"]);

        let revoked = respond(&pipeline, json!({"op": "revoke", "token": rotated})).await;
        assert_eq!(Some(true), revoked["result"]["revoked"].as_bool());
        let gone = respond(&pipeline, json!({"op": "validate", "token": rotated})).await;
        assert_eq!("TKN-302", gone["error"]["code"]);
        pipeline.state().drain_audit().await;
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let pipeline = pipeline();
        for line in [
            "not json",
            r#"{"op": "impersonate", "user": "alice"}"#,
            r#"{"op": "verify", "user": "alice"}"#,
        ] {
            let response = handle_line(&pipeline, line, &CancellationToken::new()).await;
            assert_eq!(MALFORMED_REQUEST, response["error"]["code"], "{line}");
        }
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let pipeline = pipeline();
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let response = handle_line(
            &pipeline,
            r#"{"op": "verify", "user": "alice", "secret": "pass"}"#,
            &cancellation,
        )
        .await;
        assert_eq!("GEN-905", response["error"]["code"]);
    }

    #[tokio::test]
    async fn test_serve_answers_every_line() {
        let pipeline = pipeline();
        let input = concat!(
            r#"{"op":"verify","user":"alice","secret":"pass","correlation_id":"req-1"}"#,
            "\n\n",
            r#"{"op":"health"}"#,
            "\n",
            "garbage\n",
        );
        let mut output = Vec::new();
        serve(&pipeline, input.as_bytes(), &mut output, CancellationToken::new())
            .await
            .unwrap();
        pipeline.state().drain_audit().await;

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(3, responses.len());
        assert_eq!("req-1", responses[0]["correlation_id"]);
        assert!(responses[0]["result"]["token"].is_string());
        assert!(responses[1]["result"]["dependencies"].is_object());
        assert_eq!(MALFORMED_REQUEST, responses[2]["error"]["code"]);
    }
}
