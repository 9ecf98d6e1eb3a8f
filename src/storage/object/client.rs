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

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use thiserror::Error;

use crate::storage::config::ObjectSettings;
use crate::storage::error::{Operation, StorageResult};
use crate::storage::metadata::ObjectMetadata;

/// Errors reported by an [`ObjectClient`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Object (or bucket) does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The service answered with an error code
    #[error("Request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Transport, signing or response handling failure
    #[error("Object storage error: {0}")]
    Service(String),

    /// The client cannot perform this operation
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// A key the bulk delete could not remove.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to remove '{key}': {source}")]
pub struct RemoveObjectError {
    pub key: String,
    #[source]
    pub source: ClientError,
}

/// Object storage operations needed by the object backend.
///
/// A client is bound to a single bucket. Keys are plain object keys with no leading slash.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Bucket this client operates on.
    fn bucket(&self) -> &str;

    async fn bucket_exists(&self) -> Result<bool, ClientError>;

    /// Create the bucket, in the configured region when one is set.
    async fn make_bucket(&self) -> Result<(), ClientError>;

    /// Fetch a whole object.
    async fn get_object(&self, key: &str) -> Result<Bytes, ClientError>;

    /// Upload an object in one request.
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), ClientError>;

    /// Server-side copy of `src` to `dst`.
    async fn copy_object(
        &self,
        src: &str,
        dst: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), ClientError>;

    async fn remove_object(&self, key: &str) -> Result<(), ClientError>;

    /// Lazily list keys under `prefix`.
    ///
    /// With `recursive` set every key below the prefix is returned. Otherwise a `/` delimiter
    /// is applied and only the immediate level is returned: object keys plus common prefixes,
    /// the latter ending in `/`.
    fn list_objects(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> BoxStream<'static, Result<String, ClientError>>;

    /// Delete every key read from `keys`.
    ///
    /// Only failures are reported. Keys are consumed lazily, so dropping the returned stream
    /// stops further deletions.
    fn remove_objects(
        &self,
        keys: BoxStream<'static, String>,
    ) -> BoxStream<'static, RemoveObjectError>;
}

impl Debug for dyn ObjectClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ObjectClient(bucket={})", self.bucket())
    }
}

/// Builds object clients from connection settings. Called once per storage operation.
pub trait ClientFactory: Send + Sync {
    /// Create a client bound to `settings.bucket`.
    ///
    /// # Arguments
    ///
    /// * `settings` - Endpoint, credentials and bucket to bind to
    /// * `operation` - Storage operation the client is built for, used to tag errors
    ///
    /// # Errors
    ///
    /// Returns a `ConnectionError` when the client cannot be constructed, e.g. for a
    /// malformed endpoint or an unsupported signature version.
    fn connect(
        &self,
        settings: &ObjectSettings,
        operation: Operation,
    ) -> StorageResult<Arc<dyn ObjectClient>>;
}
