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
//! Signing key material.
use std::path::Path;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use secrecy::ExposeSecret;

use crate::config::TokenSection;
use crate::token::error::TokenProviderError;

/// Encoding and decoding keys for the configured algorithm.
#[derive(Clone)]
pub(super) struct TokenKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

fn family(algorithm: Algorithm) -> KeyFamily {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => KeyFamily::Hmac,
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => KeyFamily::Rsa,
        Algorithm::ES256 | Algorithm::ES384 => KeyFamily::Ec,
        Algorithm::EdDSA => KeyFamily::Ed,
    }
}

fn read_pem(path: Option<&Path>, name: &str) -> Result<Vec<u8>, TokenProviderError> {
    let path = path.ok_or_else(|| {
        TokenProviderError::SigningKeyUnavailable(format!("`{name}` is not set"))
    })?;
    std::fs::read(path).map_err(|source| TokenProviderError::KeyFile {
        path: path.display().to_string(),
        source,
    })
}

fn unusable(err: jsonwebtoken::errors::Error) -> TokenProviderError {
    TokenProviderError::SigningKeyUnavailable(err.to_string())
}

fn read_pair(config: &TokenSection) -> Result<(Vec<u8>, Vec<u8>), TokenProviderError> {
    Ok((
        read_pem(config.private_key_file.as_deref(), "private_key_file")?,
        read_pem(config.public_key_file.as_deref(), "public_key_file")?,
    ))
}

impl TokenKeys {
    /// Load the key material referenced by the configuration.
    pub fn load(config: &TokenSection) -> Result<Self, TokenProviderError> {
        let (encoding, decoding) = match family(config.algorithm) {
            KeyFamily::Hmac => {
                let secret = config
                    .signing_key
                    .as_ref()
                    .map(|key| key.expose_secret().as_bytes())
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| {
                        TokenProviderError::SigningKeyUnavailable(
                            "`signing_key` is not set".into(),
                        )
                    })?;
                (
                    EncodingKey::from_secret(secret),
                    DecodingKey::from_secret(secret),
                )
            }
            KeyFamily::Rsa => {
                let (private, public) = read_pair(config)?;
                (
                    EncodingKey::from_rsa_pem(&private).map_err(unusable)?,
                    DecodingKey::from_rsa_pem(&public).map_err(unusable)?,
                )
            }
            KeyFamily::Ec => {
                let (private, public) = read_pair(config)?;
                (
                    EncodingKey::from_ec_pem(&private).map_err(unusable)?,
                    DecodingKey::from_ec_pem(&public).map_err(unusable)?,
                )
            }
            KeyFamily::Ed => {
                let (private, public) = read_pair(config)?;
                (
                    EncodingKey::from_ed_pem(&private).map_err(unusable)?,
                    DecodingKey::from_ed_pem(&public).map_err(unusable)?,
                )
            }
        };
        Ok(Self { encoding, decoding })
    }
}
