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
//! # Keycloak directory driver
//!
//! Verifies credentials with a single OAuth2 resource owner password grant
//! against the realm token endpoint. The principal is mapped from the claims
//! of the returned access token; the token itself is discarded.
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::dangerous::insecure_decode;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::KeycloakSection;
use crate::directory::backend::DirectoryBackend;
use crate::directory::{DirectoryProviderError, types::*};

/// Keycloak backed directory.
#[derive(Clone, Debug)]
pub struct KeycloakBackend {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: Option<SecretString>,
    scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Default, Deserialize)]
struct OAuthErrorResponse {
    #[serde(default)]
    error: String,
    error_description: Option<String>,
}

#[derive(Default, Deserialize)]
struct RoleSet {
    #[serde(default)]
    roles: Vec<String>,
}

/// Subset of the Keycloak access token claims.
#[derive(Deserialize)]
struct KeycloakClaims {
    sub: Option<String>,
    preferred_username: Option<String>,
    email: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    name: Option<String>,
    #[serde(default)]
    realm_access: RoleSet,
    #[serde(default)]
    resource_access: HashMap<String, RoleSet>,
    #[serde(default)]
    groups: Vec<String>,
}

impl KeycloakBackend {
    pub fn new(config: &KeycloakSection) -> Result<Self, DirectoryProviderError> {
        let mut base = Url::parse(&config.server_url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let token_url = base.join(&format!(
            "realms/{}/protocol/openid-connect/token",
            config.realm
        ))?;
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self {
            client,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
        })
    }

    async fn rejection(&self, response: Response) -> DirectoryProviderError {
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                let body: OAuthErrorResponse = response.json().await.unwrap_or_default();
                // Only a refused grant is about the user; `invalid_client`,
                // `unauthorized_client` and friends are about the gateway.
                if body.error == "invalid_grant" {
                    DirectoryProviderError::InvalidCredentials(body.error_description)
                } else {
                    DirectoryProviderError::Misconfigured(format!("{status}: {}", body.error))
                }
            }
            StatusCode::TOO_MANY_REQUESTS => {
                DirectoryProviderError::Unavailable(format!("directory throttled: {status}"))
            }
            _ if status.is_server_error() => {
                DirectoryProviderError::Unavailable(format!("directory returned {status}"))
            }
            _ => DirectoryProviderError::Misconfigured(format!("unexpected status {status}")),
        }
    }
}

#[async_trait]
impl DirectoryBackend for KeycloakBackend {
    #[tracing::instrument(level = "debug", skip(self, credentials), fields(user = %credentials.principal_identifier()))]
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, DirectoryProviderError> {
        // Keycloak only accepts textual passwords.
        let password = std::str::from_utf8(credentials.secret().expose_secret())
            .map_err(|_| DirectoryProviderError::InvalidCredentials(None))?;

        let mut form = vec![
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", credentials.principal_identifier()),
            ("password", password),
            ("scope", self.scope.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.expose_secret()));
        }

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|err| {
                let err = err.without_url();
                warn!("directory request failed: {}", err);
                DirectoryProviderError::Unavailable(err.to_string())
            })?;

        if !response.status().is_success() {
            let err = self.rejection(response).await;
            debug!("directory rejected the request: {}", err);
            return Err(err);
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| DirectoryProviderError::MalformedResponse(err.to_string()))?;
        principal_from_access_token(&body.access_token, &self.client_id)
    }
}

/// Group name of either a Keycloak group path (`/org/APP_ADMIN`) or a
/// LDAP distinguished name (`CN=APP_ADMIN,OU=Groups,DC=example,DC=com`).
fn group_name(group: &str) -> &str {
    if let Some(rest) = group
        .strip_prefix("CN=")
        .or_else(|| group.strip_prefix("cn="))
    {
        return rest.split(',').next().unwrap_or(rest);
    }
    group.rsplit('/').next().unwrap_or(group)
}

/// `APP_` groups grant the matching `ROLE_`; `ROLE_` groups are taken as is.
fn group_role(group: &str) -> Option<String> {
    let name = group_name(group);
    if let Some(role) = name.strip_prefix("APP_") {
        Some(format!("ROLE_{role}"))
    } else if name.starts_with("ROLE_") {
        Some(name.to_string())
    } else {
        None
    }
}

fn principal_from_access_token(
    access_token: &str,
    client_id: &str,
) -> Result<Principal, DirectoryProviderError> {
    let claims = insecure_decode::<KeycloakClaims>(access_token)
        .map_err(|err| DirectoryProviderError::MalformedResponse(err.to_string()))?
        .claims;

    let subject_id = claims
        .sub
        .clone()
        .or_else(|| claims.preferred_username.clone())
        .ok_or_else(|| DirectoryProviderError::MalformedResponse("no subject in token".into()))?;

    let display_attributes: BTreeMap<String, String> = [
        ("username", claims.preferred_username),
        ("email", claims.email),
        ("given_name", claims.given_name),
        ("family_name", claims.family_name),
        ("name", claims.name),
    ]
    .into_iter()
    .filter_map(|(key, val)| val.map(|val| (key.to_string(), val)))
    .collect();

    let mut builder = PrincipalBuilder::default();
    builder
        .subject_id(subject_id)
        .display_attributes(display_attributes);
    for role in claims.realm_access.roles {
        builder.role(role);
    }
    if let Some(client_roles) = claims.resource_access.get(client_id) {
        for role in &client_roles.roles {
            builder.role(role.clone());
        }
    }
    for group in &claims.groups {
        if let Some(role) = group_role(group) {
            builder.role(role);
        }
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;
    use crate::resilience::Transient;

    fn access_token(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("keycloak_side_secret".as_ref()),
        )
        .unwrap()
    }

    fn backend(server: &MockServer) -> KeycloakBackend {
        KeycloakBackend::new(&KeycloakSection {
            server_url: server.base_url(),
            realm: "corp".into(),
            client_id: "gateway".into(),
            client_secret: Some("client-secret".into()),
            scope: "openid".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_token_url() {
        let backend = KeycloakBackend::new(&KeycloakSection {
            server_url: "https://idp.example.com/auth".into(),
            realm: "corp".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            "https://idp.example.com/auth/realms/corp/protocol/openid-connect/token",
            backend.token_url.as_str()
        );
    }

    #[test]
    fn test_group_roles() {
        assert_eq!(Some("ROLE_ADMIN".into()), group_role("/org/APP_ADMIN"));
        assert_eq!(Some("ROLE_USER".into()), group_role("ROLE_USER"));
        assert_eq!(
            Some("ROLE_OPS".into()),
            group_role("CN=APP_OPS,OU=Groups,DC=example,DC=com")
        );
        assert_eq!(None, group_role("/org/engineering"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let server = MockServer::start_async().await;
        let token = access_token(json!({
            "sub": "f3b1c3d2",
            "preferred_username": "alice",
            "email": "alice@example.com",
            "realm_access": {"roles": ["user"]},
            "resource_access": {"gateway": {"roles": ["reader"]}, "other": {"roles": ["ignored"]}},
            "groups": ["/APP_ADMIN", "/staff"],
        }));
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/realms/corp/protocol/openid-connect/token")
                    .body_includes("grant_type=password")
                    .body_includes("username=alice")
                    .body_includes("client_secret=client-secret");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": token, "token_type": "Bearer"}));
            })
            .await;

        let principal = backend(&server)
            .authenticate(&Credentials::new("alice", "pass"))
            .await
            .unwrap();
        mock.assert();
        assert_eq!("f3b1c3d2", principal.subject_id());
        assert_eq!(
            vec!["ROLE_ADMIN", "reader", "user"],
            principal.roles().iter().map(String::as_str).collect::<Vec<_>>()
        );
        assert_eq!(
            Some(&"alice".to_string()),
            principal.display_attributes().get("username")
        );
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start_async().await;
        let unauthorized = server
            .mock_async(|when, then| {
                when.method("POST").body_includes("username=alice");
                then.status(401)
                    .json_body(json!({"error": "invalid_grant", "error_description": "Invalid user credentials"}));
            })
            .await;
        let disabled = server
            .mock_async(|when, then| {
                when.method("POST").body_includes("username=bob");
                then.status(400)
                    .json_body(json!({"error": "invalid_grant", "error_description": "Account disabled"}));
            })
            .await;

        let backend = backend(&server);
        let err = backend
            .authenticate(&Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryProviderError::InvalidCredentials(_)));
        assert_eq!(Some("Invalid user credentials"), err.rejection_detail());
        let err = backend
            .authenticate(&Credentials::new("bob", "pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryProviderError::InvalidCredentials(_)));
        assert_eq!(Some("Account disabled"), err.rejection_detail());
        unauthorized.assert();
        disabled.assert();
    }

    #[tokio::test]
    async fn test_unavailable_and_misconfigured() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").body_includes("username=alice");
                then.status(503);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("POST").body_includes("username=bob");
                then.status(400).json_body(json!({"error": "unauthorized_client"}));
            })
            .await;

        let backend = backend(&server);
        let err = backend
            .authenticate(&Credentials::new("alice", "pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryProviderError::Unavailable(_)));
        let err = backend
            .authenticate(&Credentials::new("bob", "pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryProviderError::Misconfigured(_)));
    }

    #[tokio::test]
    async fn test_client_authentication_refused() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").body_includes("username=alice");
                then.status(401).json_body(json!({
                    "error": "unauthorized_client",
                    "error_description": "Invalid client or Invalid client credentials"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("POST").body_includes("username=bob");
                then.status(401).json_body(json!({"error": "invalid_client"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("POST").body_includes("username=carol");
                then.status(401);
            })
            .await;

        let backend = backend(&server);
        for user in ["alice", "bob", "carol"] {
            let err = backend
                .authenticate(&Credentials::new(user, "pass"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, DirectoryProviderError::Misconfigured(_)),
                "{user}: {err:?}"
            );
            assert!(!err.is_transient());
        }
    }

    #[tokio::test]
    async fn test_unreachable() {
        let backend = KeycloakBackend::new(&KeycloakSection {
            server_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            backend.authenticate(&Credentials::new("alice", "pass")).await,
            Err(DirectoryProviderError::Unavailable(_))
        ));
    }
}
