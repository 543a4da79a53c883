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
//! # Authentication pipeline
//!
//! Composes the providers into the public authentication operations:
//!
//! - [AuthenticationPipeline::verify_credentials] verifies a credential
//!   pair with the directory and issues a signed token bound to a new
//!   session,
//! - [AuthenticationPipeline::validate_token] verifies a token locally and
//!   confirms its session with the session cache,
//! - [AuthenticationPipeline::revoke_session] signs the session out,
//! - [AuthenticationPipeline::refresh_token] rotates a session.
//!
//! Every remote call goes through the orchestrator of its dependency. The
//! session cache and the audit stream never decide an authentication
//! outcome on their own: a failed cache write is logged and the token is
//! still handed out, audit events are published from detached tasks after
//! the outcome is known.
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod error;

use crate::audit::{AuditApi, AuditEvent, AuditEventType};
use crate::config::RevocationPolicy;
use crate::context::RequestContext;
use crate::directory::{Credentials, DirectoryApi, Principal, PrincipalBuilder};
use crate::gateway::ServiceState;
use crate::resilience::ResilienceError;
use crate::session::{Session, SessionCacheApi};
use crate::token::{Claims, Token, TokenApi, TokenProviderError};

pub use error::PipelineError;

/// Authentication pipeline.
#[derive(Clone)]
pub struct AuthenticationPipeline {
    state: ServiceState,
}

impl AuthenticationPipeline {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    /// Verify the credential pair and issue a token.
    ///
    /// Emits `AUTH_SUCCESS` and `TOKEN_ISSUED` on success and exactly one
    /// `AUTH_FAILURE` when the directory refuses or cannot be consulted.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(correlation_id = %ctx.correlation_id(), principal = %credentials.principal_identifier())
    )]
    pub async fn verify_credentials(
        &self,
        ctx: &RequestContext,
        credentials: &Credentials,
    ) -> Result<Token, PipelineError> {
        ctx.guard(self.authenticate(ctx, credentials)).await
    }

    /// Validate the token and return the principal it proves.
    #[tracing::instrument(level = "info", skip_all, fields(correlation_id = %ctx.correlation_id()))]
    pub async fn validate_token(
        &self,
        ctx: &RequestContext,
        serialized: &str,
    ) -> Result<Principal, PipelineError> {
        let result = ctx.guard(self.confirm(serialized)).await;
        if let Err(err) = &result {
            self.reject(ctx, err);
        }
        result
    }

    /// Sign out: invalidate the session proved by the token.
    ///
    /// A token that already expired is accepted without touching the cache.
    #[tracing::instrument(level = "info", skip_all, fields(correlation_id = %ctx.correlation_id()))]
    pub async fn revoke_session(
        &self,
        ctx: &RequestContext,
        serialized: &str,
    ) -> Result<(), PipelineError> {
        let result = ctx.guard(self.revoke(ctx, serialized)).await;
        if let Err(err) = &result {
            self.reject(ctx, err);
        }
        result
    }

    /// Issue a new token for a confirmed session and retire the old one.
    #[tracing::instrument(level = "info", skip_all, fields(correlation_id = %ctx.correlation_id()))]
    pub async fn refresh_token(
        &self,
        ctx: &RequestContext,
        serialized: &str,
    ) -> Result<Token, PipelineError> {
        let result = ctx.guard(self.rotate(ctx, serialized)).await;
        if let Err(err) = &result {
            self.reject(ctx, err);
        }
        result
    }

    async fn authenticate(
        &self,
        ctx: &RequestContext,
        credentials: &Credentials,
    ) -> Result<Token, PipelineError> {
        let directory = self.state.provider.get_directory_provider();
        let principal = match self
            .state
            .resilience
            .directory
            .call(|| directory.authenticate(credentials))
            .await
        {
            Ok(principal) => principal,
            Err(err) => {
                let detail = match &err {
                    ResilienceError::Operation(err) => err.rejection_detail().map(str::to_string),
                    _ => None,
                };
                let err = PipelineError::from(err);
                debug!("credentials not verified: {}", err);
                let reason = match detail {
                    Some(detail) => format!("{err}: {detail}"),
                    None => err.to_string(),
                };
                self.publish(vec![event(
                    ctx,
                    AuditEventType::AuthFailure,
                    Some(credentials.principal_identifier()),
                    Some(reason),
                )]);
                return Err(err);
            }
        };

        let (session, token) = self.open_session(principal)?;
        self.store_session(&session).await;

        self.publish(vec![
            event(ctx, AuditEventType::AuthSuccess, Some(&token.claims().subject_id), None),
            event(ctx, AuditEventType::TokenIssued, Some(&token.claims().subject_id), None),
        ]);
        Ok(token)
    }

    async fn confirm(&self, serialized: &str) -> Result<Principal, PipelineError> {
        let claims = self.state.provider.get_token_provider().validate(serialized)?;
        let cache = self.state.provider.get_session_cache_provider();
        match self
            .state
            .resilience
            .cache
            .call(|| cache.get(&claims.session_id))
            .await
        {
            Ok(Some(session)) if session.principal.subject_id() == claims.subject_id => {
                Ok(session.principal)
            }
            Ok(_) => Err(PipelineError::SessionRevoked),
            Err(err) => match self.state.config.session.revocation_policy {
                RevocationPolicy::FavorAvailability => {
                    warn!("session cannot be confirmed, accepting token: {}", err);
                    principal_from_claims(&claims)
                }
                RevocationPolicy::RequireConfirmation => Err(PipelineError::from(err)),
            },
        }
    }

    async fn revoke(&self, ctx: &RequestContext, serialized: &str) -> Result<(), PipelineError> {
        let claims = match self.state.provider.get_token_provider().validate(serialized) {
            Ok(claims) => claims,
            Err(TokenProviderError::Expired) => {
                debug!("token already expired, nothing to revoke");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let cache = self.state.provider.get_session_cache_provider();
        self.state
            .resilience
            .cache
            .call(|| cache.invalidate(&claims.session_id))
            .await
            .map_err(|err| PipelineError::unavailable(crate::resilience::CACHE, err))?;

        self.publish(vec![event(
            ctx,
            AuditEventType::SessionRevoked,
            Some(&claims.subject_id),
            None,
        )]);
        Ok(())
    }

    async fn rotate(&self, ctx: &RequestContext, serialized: &str) -> Result<Token, PipelineError> {
        if !self.state.config.session.allow_refresh {
            return Err(PipelineError::RefreshDisabled);
        }
        let claims = self.state.provider.get_token_provider().validate(serialized)?;
        let cache = self.state.provider.get_session_cache_provider();
        let current = match self
            .state
            .resilience
            .cache
            .call(|| cache.get(&claims.session_id))
            .await?
        {
            Some(session) if session.principal.subject_id() == claims.subject_id => session,
            _ => return Err(PipelineError::SessionRevoked),
        };

        let (session, token) = self.open_session(current.principal)?;
        let ttl = session.time_to_live().unwrap_or_default();
        self.state
            .resilience
            .cache
            .call(|| cache.put(&session, ttl))
            .await?;
        if let Err(err) = self
            .state
            .resilience
            .cache
            .call(|| cache.invalidate(&current.session_id))
            .await
        {
            warn!("previous session not invalidated after refresh: {}", err);
        }

        self.publish(vec![event(
            ctx,
            AuditEventType::TokenIssued,
            Some(&token.claims().subject_id),
            None,
        )]);
        Ok(token)
    }

    /// New session and the token proving it.
    fn open_session(&self, principal: Principal) -> Result<(Session, Token), PipelineError> {
        let token_provider = self.state.provider.get_token_provider();
        let session = Session::new(
            principal,
            Utc::now(),
            std::time::Duration::from_secs(self.state.config.session.expiration),
        )
        .map_err(|err| PipelineError::unavailable(crate::resilience::CACHE, err))?;
        let token = token_provider.issue(
            &session.principal,
            &session.session_id,
            token_provider.ttl(),
        )?;
        Ok((session, token))
    }

    /// Best effort cache write.
    async fn store_session(&self, session: &Session) {
        let cache = self.state.provider.get_session_cache_provider();
        let ttl = session.time_to_live().unwrap_or_default();
        if let Err(err) = self
            .state
            .resilience
            .cache
            .call(|| cache.put(session, ttl))
            .await
        {
            warn!("session not cached, token issued anyway: {}", err);
        }
    }

    fn reject(&self, ctx: &RequestContext, err: &PipelineError) {
        if err.is_rejection() {
            self.publish(vec![event(
                ctx,
                AuditEventType::TokenRejected,
                None,
                Some(err.to_string()),
            )]);
        }
    }

    /// Publish the events in order from a single detached task.
    fn publish(&self, events: Vec<AuditEvent>) {
        let state = self.state.clone();
        self.state.spawn_audit(async move {
            let audit = state.provider.get_audit_provider();
            for event in events {
                if let Err(err) = state.resilience.audit.call(|| audit.publish(&event)).await {
                    warn!(
                        event_id = %event.event_id,
                        event_type = ?event.event_type,
                        "audit event dropped: {}", err
                    );
                }
            }
        });
    }
}

fn event(
    ctx: &RequestContext,
    event_type: AuditEventType,
    subject_id: Option<&str>,
    reason: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4(),
        event_type,
        subject_id: subject_id.map(Into::into),
        timestamp: Utc::now(),
        correlation_id: ctx.correlation_id().to_string(),
        reason,
    }
}

/// Principal as recorded in the token, used when the session cannot be
/// consulted.
fn principal_from_claims(claims: &Claims) -> Result<Principal, PipelineError> {
    PrincipalBuilder::default()
        .subject_id(claims.subject_id.clone())
        .roles(claims.roles.clone())
        .build()
        .map_err(|_| PipelineError::TokenMalformed)
}
