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
//! Directory provider types.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;
use derive_builder::Builder;
use secrecy::{ExposeSecret, SecretSlice};
use serde::{Deserialize, Serialize};

use crate::directory::error::DirectoryProviderError;
use crate::error::BuilderError;

/// Credential pair presented for verification.
///
/// The secret is wiped from memory when the credentials are dropped and is
/// never part of the `Debug` output.
pub struct Credentials {
    principal_identifier: String,
    secret: SecretSlice<u8>,
}

impl Credentials {
    pub fn new<I: Into<String>, S: Into<Vec<u8>>>(principal_identifier: I, secret: S) -> Self {
        Self {
            principal_identifier: principal_identifier.into(),
            secret: SecretSlice::from(secret.into()),
        }
    }

    /// User name (or any other identifier the directory resolves).
    pub fn principal_identifier(&self) -> &str {
        &self.principal_identifier
    }

    pub fn secret(&self) -> &SecretSlice<u8> {
        &self.secret
    }

    /// Whether the pair can be sent to the directory at all.
    pub fn is_blank(&self) -> bool {
        self.principal_identifier.trim().is_empty() || self.secret.expose_secret().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("principal_identifier", &self.principal_identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Authenticated identity with its authorization attributes.
#[derive(Builder, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError", validate = "Self::validate"))]
#[builder(setter(into))]
pub struct Principal {
    /// Unique, stable identifier of the subject.
    subject_id: String,
    /// Human readable attributes (user name, email, ...).
    #[builder(default, setter(each(name = "display_attribute", into)))]
    display_attributes: BTreeMap<String, String>,
    /// Roles granted to the subject.
    #[builder(default, setter(each(name = "role", into)))]
    roles: BTreeSet<String>,
}

impl PrincipalBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.subject_id {
            Some(id) if id.trim().is_empty() => Err("subject_id must not be empty".into()),
            _ => Ok(()),
        }
    }
}

impl Principal {
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn display_attributes(&self) -> &BTreeMap<String, String> {
        &self.display_attributes
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }
}

/// Directory client interface.
#[async_trait]
pub trait DirectoryApi: Send + Sync + Clone {
    /// Verify the credentials with exactly one directory round trip.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, DirectoryProviderError>;
}
