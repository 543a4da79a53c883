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
//! # Directory configuration
use secrecy::SecretString;
use serde::Deserialize;

/// Directory client.
#[derive(Debug, Deserialize, Clone)]
pub struct DirectorySection {
    /// Directory backend driver.
    #[serde(default = "default_directory_driver")]
    pub driver: String,
}

fn default_directory_driver() -> String {
    "keycloak".into()
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            driver: default_directory_driver(),
        }
    }
}

/// Keycloak realm the `keycloak` directory driver authenticates against.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KeycloakSection {
    /// Base url of the Keycloak server.
    pub server_url: String,
    /// Realm holding the users.
    pub realm: String,
    /// Confidential client permitted to use the password grant.
    pub client_id: String,
    /// Secret of the client.
    pub client_secret: Option<SecretString>,
    /// Scope requested with the password grant.
    pub scope: String,
}

impl Default for KeycloakSection {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            realm: "master".into(),
            client_id: "identity-gateway".into(),
            client_secret: None,
            scope: "openid".into(),
        }
    }
}
