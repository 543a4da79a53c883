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
//! Directory backends.
use async_trait::async_trait;

use crate::directory::{DirectoryProviderError, types::*};

pub mod keycloak;

/// DirectoryBackend trait.
///
/// Backend driver interface expected by the directory provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryBackend: Send + Sync {
    /// Verify the credentials against the directory.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, DirectoryProviderError>;
}
