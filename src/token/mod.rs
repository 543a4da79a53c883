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
//! # Token provider
//!
//! Issues and validates the signed, self-contained bearer tokens handed out
//! by the gateway. Tokens are JWTs carrying the subject, session id and roles
//! of the principal. The algorithm and key material come from the `[token]`
//! configuration section.
//!
//! Validation never touches the network so tokens can still be verified
//! while every remote dependency is degraded. Expiry is checked before the
//! signature: an expired token is reported as
//! [TokenProviderError::Expired] even if it was never signed by the gateway.
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::dangerous::insecure_decode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

pub mod error;
mod keys;
pub mod types;

use crate::config::Config;
use crate::directory::Principal;
use keys::TokenKeys;

pub use error::TokenProviderError;
pub use types::*;

/// Token provider.
#[derive(Clone)]
pub struct TokenProvider {
    keys: Arc<TokenKeys>,
    algorithm: Algorithm,
    issuer: String,
    ttl: Duration,
    validation: Validation,
}

impl TokenProvider {
    /// Load the key material. Missing keys are a fatal configuration error.
    pub fn new(config: &Config) -> Result<Self, TokenProviderError> {
        let keys = TokenKeys::load(&config.token)?;
        let mut validation = Validation::new(config.token.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_issuer(&[&config.token.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        Ok(Self {
            keys: Arc::new(keys),
            algorithm: config.token.algorithm,
            issuer: config.token.issuer.clone(),
            ttl: Duration::from_secs(config.token.expiration),
            validation,
        })
    }
}

fn validation_error(err: jsonwebtoken::errors::Error) -> TokenProviderError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenProviderError::Expired,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => TokenProviderError::Malformed,
        _ => TokenProviderError::SignatureInvalid,
    }
}

impl TokenApi for TokenProvider {
    /// Mint a token.
    ///
    /// Timestamps have second precision and `expires_at` is exactly
    /// `issued_at + ttl`.
    #[tracing::instrument(level = "debug", skip(self, principal), fields(subject = %principal.subject_id()))]
    fn issue(
        &self,
        principal: &Principal,
        session_id: &str,
        ttl: Duration,
    ) -> Result<Token, TokenProviderError> {
        let issued_at = DateTime::from_timestamp(Utc::now().timestamp(), 0)
            .ok_or(TokenProviderError::ExpiryCalculation)?;
        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or(TokenProviderError::ExpiryCalculation)?;

        let claims = Claims {
            subject_id: principal.subject_id().to_string(),
            session_id: session_id.to_string(),
            roles: principal.roles().clone(),
            issued_at,
            expires_at,
            issuer: self.issuer.clone(),
            token_id: Uuid::new_v4().simple().to_string(),
        };
        let serialized = encode(&Header::new(self.algorithm), &claims, &self.keys.encoding)
            .map_err(|err| TokenProviderError::Signing(err.to_string()))?;
        Ok(Token::new(serialized, claims))
    }

    /// Validate a token.
    fn validate(&self, serialized: &str) -> Result<Claims, TokenProviderError> {
        let unverified = insecure_decode::<Claims>(serialized)
            .map_err(|_| TokenProviderError::Malformed)?
            .claims;
        if unverified.is_expired() {
            return Err(TokenProviderError::Expired);
        }
        let verified = decode::<Claims>(serialized, &self.keys.decoding, &self.validation)
            .map_err(|err| {
                debug!("token rejected: {}", err);
                validation_error(err)
            })?;
        Ok(verified.claims)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
