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

use super::config::{Driver, StorageConfig};
use super::error::{Operation, StorageError, StorageResult};
use super::local::LocalBackend;
use super::object::{ClientFactory, ObjectBackend};
use super::provider::StorageProvider;

/// Factory for creating storage providers
pub struct StorageProviderFactory;

impl StorageProviderFactory {
    /// Create the storage provider selected by a configuration.
    ///
    /// Providers are cheap and built for a single operation; object clients are not cached.
    ///
    /// # Arguments
    ///
    /// * `config` - The storage configuration, driver included
    /// * `clients` - Builds the object client when the object driver is selected
    /// * `operation` - Operation the provider is created for, used to tag errors
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Box<dyn StorageProvider>)` - The local or object provider
    /// * `Err(StorageError)` - If no provider can be created
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The driver name is empty or unknown (`DriverNotConfigured`)
    /// * The object client cannot be constructed (`ConnectionError`)
    pub fn from_config(
        config: &StorageConfig,
        clients: &dyn ClientFactory,
        operation: Operation,
    ) -> StorageResult<Box<dyn StorageProvider>> {
        match config.driver() {
            Some(Driver::Local) => Ok(Box::new(LocalBackend::new(config.directory.clone()))),
            Some(Driver::Object) => {
                let client = clients.connect(&config.object, operation)?;
                Ok(Box::new(ObjectBackend::new(client, config.encrypt())))
            }
            None => Err(StorageError::not_configured(
                operation,
                not_configured_message_id(operation),
            )),
        }
    }
}

/// Message id reported when `operation` runs without a usable driver.
pub(crate) fn not_configured_message_id(operation: Operation) -> &'static str {
    match operation {
        Operation::TestConnection => "storage.test_connection.not_configured",
        Operation::ReadFile => "storage.read_file.not_configured",
        Operation::WriteFile => "storage.write_file.not_configured",
        Operation::MoveFile => "storage.move_file.not_configured",
        Operation::RemoveFile => "storage.remove_file.not_configured",
        Operation::ListDirectory => "storage.list_directory.not_configured",
        Operation::RemoveDirectory => "storage.remove_directory.not_configured",
    }
}
