// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Public file storage API
//!
//! [`FileStore`] loads the configuration on every call, builds the provider for the
//! configured driver and delegates to it. Nothing is cached between calls, so a changed
//! configuration applies to the next operation.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use tracing::debug;

use super::config::ConfigSource;
use super::error::{ErrorKind, Operation, StorageError, StorageResult};
use super::factory::{not_configured_message_id, StorageProviderFactory};
use super::object::{ClientFactory, S3ClientFactory};
use super::provider::StorageProvider;

/// File storage over the configured backend
#[derive(Clone)]
pub struct FileStore {
    config: Arc<dyn ConfigSource>,
    clients: Arc<dyn ClientFactory>,
}

impl FileStore {
    /// Create a store that builds S3 clients for the object driver.
    ///
    /// # Arguments
    ///
    /// * `config` - Consulted at the start of every operation
    pub fn new(config: impl ConfigSource + 'static) -> Self {
        Self::with_client_factory(config, Arc::new(S3ClientFactory))
    }

    /// Create a store with a custom object client factory.
    pub fn with_client_factory(
        config: impl ConfigSource + 'static,
        clients: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            clients,
        }
    }

    async fn provider(&self, operation: Operation) -> StorageResult<Box<dyn StorageProvider>> {
        let config = self.config.load().await.map_err(|e| {
            StorageError::new(
                ErrorKind::DriverNotConfigured,
                operation,
                not_configured_message_id(operation),
                "unable to load the storage configuration",
            )
            .with_source(e)
        })?;

        let provider =
            StorageProviderFactory::from_config(&config, self.clients.as_ref(), operation)?;
        debug!("Running {} on {:?}", operation, provider);
        Ok(provider)
    }

    /// Check that the configured backend is usable.
    ///
    /// Creates the bucket when the object driver points at a missing one.
    pub async fn test_connection(&self) -> StorageResult<()> {
        self.provider(Operation::TestConnection).await?
            .test_connection()
            .await
    }

    /// Read a whole file.
    pub async fn read_file(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.provider(Operation::ReadFile).await?.read_file(path).await
    }

    /// Create or replace a file with `data`.
    pub async fn write_file(&self, data: &[u8], path: &str) -> StorageResult<()> {
        self.provider(Operation::WriteFile).await?
            .write_file(data, path)
            .await
    }

    /// Move a file. On the object driver a `PartialMoveError` leaves both paths in place.
    pub async fn move_file(&self, old_path: &str, new_path: &str) -> StorageResult<()> {
        self.provider(Operation::MoveFile).await?
            .move_file(old_path, new_path)
            .await
    }

    pub async fn remove_file(&self, path: &str) -> StorageResult<()> {
        self.provider(Operation::RemoveFile).await?.remove_file(path).await
    }

    /// List the entries directly below `path`, relative to the storage root.
    pub async fn list_directory(&self, path: &str) -> StorageResult<Vec<String>> {
        self.provider(Operation::ListDirectory).await?
            .list_directory(path)
            .await
    }

    /// Remove `path` and everything below it.
    pub async fn remove_directory(&self, path: &str) -> StorageResult<()> {
        self.provider(Operation::RemoveDirectory).await?
            .remove_directory(path)
            .await
    }
}

impl Debug for FileStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("FileStore")
    }
}
