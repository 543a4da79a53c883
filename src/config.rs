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
//! # Gateway configuration
//!
//! Parsing of the INI configuration file. Every section has sane defaults so
//! that an empty file (or no file at all) yields a working development setup,
//! except for the token signing key which must always be provided.
use config::{File, FileFormat};
use eyre::{Report, WrapErr};
use serde::Deserialize;
use std::path::PathBuf;

mod audit;
mod directory;
mod resilience;
mod session;
mod token;

pub use audit::{AuditSection, KafkaRestSection};
pub use directory::{DirectorySection, KeycloakSection};
pub use resilience::ResilienceSection;
pub use session::{RevocationPolicy, SessionSection};
pub use token::TokenSection;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Global configuration options
    #[serde(rename = "DEFAULT")]
    pub default: Option<DefaultSection>,

    /// Audit publisher configuration.
    #[serde(default)]
    pub audit: AuditSection,

    /// Resilience policies applied to the audit publisher.
    #[serde(default = "ResilienceSection::audit")]
    pub audit_resilience: ResilienceSection,

    /// Resilience policies applied to the session cache.
    #[serde(default = "ResilienceSection::cache")]
    pub cache_resilience: ResilienceSection,

    /// Directory client configuration.
    #[serde(default)]
    pub directory: DirectorySection,

    /// Resilience policies applied to the directory client.
    #[serde(default)]
    pub directory_resilience: ResilienceSection,

    /// Kafka REST proxy used by the `kafka_rest` audit driver.
    #[serde(default)]
    pub kafka_rest: KafkaRestSection,

    /// Keycloak server used by the `keycloak` directory driver.
    #[serde(default)]
    pub keycloak: KeycloakSection,

    /// Session cache configuration.
    #[serde(default)]
    pub session: SessionSection,

    /// Token signing configuration.
    #[serde(default)]
    pub token: TokenSection,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct DefaultSection {
    /// Debug logging
    pub debug: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default: None,
            audit: AuditSection::default(),
            audit_resilience: ResilienceSection::audit(),
            cache_resilience: ResilienceSection::cache(),
            directory: DirectorySection::default(),
            directory_resilience: ResilienceSection::default(),
            kafka_rest: KafkaRestSection::default(),
            keycloak: KeycloakSection::default(),
            session: SessionSection::default(),
            token: TokenSection::default(),
        }
    }
}

impl Config {
    pub fn new(path: PathBuf) -> Result<Self, Report> {
        let mut builder = config::Config::builder();

        if std::path::Path::new(&path).is_file() {
            builder = builder.add_source(File::from(path).format(FileFormat::Ini));
        }

        builder.try_into()
    }
}

impl TryFrom<config::ConfigBuilder<config::builder::DefaultState>> for Config {
    type Error = Report;
    fn try_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, Self::Error> {
        let mut builder = builder;
        builder = builder
            .set_default("directory.driver", "keycloak")?
            .set_default("session.driver", "memory")?
            .set_default("audit.driver", "log")?
            .set_default("token.expiration", "900")?
            .set_default("session.expiration", "900")?
            .set_default("audit_resilience.retry_attempts", "5")?
            .set_default("audit_resilience.rate_limit_requests", "0")?
            .set_default("cache_resilience.timeout_ms", "250")?
            .set_default("cache_resilience.retry_attempts", "2")?;

        builder
            .build()
            .wrap_err("Failed to read configuration file")?
            .try_deserialize()
            .wrap_err("Failed to parse configuration file")
    }
}
