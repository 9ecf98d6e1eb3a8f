// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use super::config::Driver;
use super::error::StorageResult;

/// Backend behind the file storage API
///
/// This trait provides a unified interface over a local directory tree and an
/// S3-compatible bucket. Paths are logical, slash-separated and relative to the
/// provider's base path.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Driver implemented by this provider.
    fn driver(&self) -> Driver;

    /// Get the base path of this provider.
    ///
    /// # Returns
    ///
    /// The root directory for the local backend, the bucket name for the object backend.
    fn base_path(&self) -> &str;

    /// Validate that the backend is usable.
    ///
    /// The local backend writes, reads back and removes a probe file under its root. The
    /// object backend checks that the bucket exists and creates it when it does not.
    ///
    /// # Returns
    ///
    /// A `Result` indicating:
    /// * `Ok(())` - The backend is reachable and writable
    /// * `Err(StorageError)` - Validation failed
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The root directory is not writable or the probe does not read back identically
    /// * The bucket cannot be checked or created
    async fn test_connection(&self) -> StorageResult<()>;

    /// Read the contents of a file.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the file (relative to base_path)
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Vec<u8>)` - The file contents as bytes
    /// * `Err(StorageError)` - If the file cannot be read
    ///
    /// # Errors
    ///
    /// Returns a `ReadError` if the file does not exist, access is denied or the
    /// backend fails. `is_not_found()` is true for missing files.
    async fn read_file(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Create or replace a file.
    ///
    /// # Arguments
    ///
    /// * `data` - Full contents of the file
    /// * `path` - The path to the file (relative to base_path)
    ///
    /// # Errors
    ///
    /// Returns a `WriteError` if parent directories cannot be created or the data cannot
    /// be stored.
    async fn write_file(&self, data: &[u8], path: &str) -> StorageResult<()>;

    /// Move a file to a new path.
    ///
    /// # Arguments
    ///
    /// * `old_path` - Existing file
    /// * `new_path` - Destination, replaced if it exists
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The source cannot be moved or copied (`MoveError`)
    /// * The object backend copied the file but could not delete the source
    ///   (`PartialMoveError`, both paths then exist)
    async fn move_file(&self, old_path: &str, new_path: &str) -> StorageResult<()>;

    /// Remove a single file.
    ///
    /// # Errors
    ///
    /// Returns a `RemoveError` if the file cannot be deleted.
    async fn remove_file(&self, path: &str) -> StorageResult<()>;

    /// List the entries directly below a directory.
    ///
    /// # Arguments
    ///
    /// * `path` - The directory to list (relative to base_path)
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Vec<String>)` - Entry paths relative to base_path, without trailing slashes
    /// * `Err(StorageError)` - If listing fails
    ///
    /// # Errors
    ///
    /// Returns a `ListError` if the directory cannot be read.
    async fn list_directory(&self, path: &str) -> StorageResult<Vec<String>>;

    /// Recursively remove a directory and everything below it.
    ///
    /// A directory that does not exist is removed successfully.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The local tree cannot be deleted or the object listing fails (`RemoveError`)
    /// * An object could not be deleted (`BulkDeletePartialFailure`); objects deleted
    ///   before the failure stay deleted
    async fn remove_directory(&self, path: &str) -> StorageResult<()>;
}

impl Debug for dyn StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "StorageProvider(driver={}, base_path={})",
            self.driver().as_str(),
            self.base_path()
        )
    }
}
