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

//! Object storage backend
//!
//! [`ObjectBackend`] maps the file operations onto a bucket through an [`ObjectClient`].
//! Keys are the logical paths with leading and trailing slashes removed; directories are
//! key prefixes ending in a single `/`.

pub mod client;
pub mod memory;
pub mod s3;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientError, ClientFactory, ObjectClient, RemoveObjectError};
pub use memory::ObjectStoreClient;
pub use s3::{S3Client, S3ClientFactory};

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use futures::SinkExt;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::config::Driver;
use super::error::{ErrorKind, Operation, StorageError, StorageResult};
use super::metadata::{build_copy_metadata, build_write_metadata, content_type_for_path};
use super::provider::StorageProvider;

/// Keys buffered between the listing producer and the bulk delete.
pub const DELETE_QUEUE_DEPTH: usize = 8;

/// Storage provider over a single bucket
pub struct ObjectBackend {
    client: Arc<dyn ObjectClient>,
    encrypt: bool,
}

impl ObjectBackend {
    /// # Arguments
    ///
    /// * `client` - Client bound to the target bucket
    /// * `encrypt` - Request server-side encryption on writes
    pub fn new(client: Arc<dyn ObjectClient>, encrypt: bool) -> Self {
        Self { client, encrypt }
    }

    pub fn client(&self) -> &Arc<dyn ObjectClient> {
        &self.client
    }

    pub fn encrypt(&self) -> bool {
        self.encrypt
    }
}

impl Debug for ObjectBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "ObjectBackend(bucket={}, encrypt={})",
            self.client.bucket(),
            self.encrypt
        )
    }
}

fn object_key(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Key prefix of a directory: the trimmed path plus one `/`, empty for the bucket root.
fn directory_prefix(path: &str) -> String {
    let key = object_key(path);
    if key.is_empty() {
        key
    } else {
        format!("{}/", key)
    }
}

/// Push listed keys into `sink` until the listing ends, fails, or `done` resolves.
///
/// Returns the number of keys handed to the sink.
async fn produce_keys(
    mut keys: BoxStream<'static, Result<String, ClientError>>,
    mut sink: mpsc::Sender<String>,
    mut done: oneshot::Receiver<()>,
) -> Result<usize, ClientError> {
    let mut produced = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut done => break,
            next = keys.next() => next,
        };

        let key = match next {
            Some(Ok(key)) => key,
            Some(Err(e)) => return Err(e),
            None => break,
        };

        tokio::select! {
            biased;
            _ = &mut done => break,
            sent = sink.send(key) => {
                if sent.is_err() {
                    break;
                }
            }
        }
        produced += 1;
    }

    Ok(produced)
}

#[async_trait]
impl StorageProvider for ObjectBackend {
    fn driver(&self) -> Driver {
        Driver::Object
    }

    fn base_path(&self) -> &str {
        self.client.bucket()
    }

    async fn test_connection(&self) -> StorageResult<()> {
        let bucket = self.client.bucket();

        let exists = self.client.bucket_exists().await.map_err(|e| {
            error!("Unable to check bucket={}: {}", bucket, e);
            StorageError::new(
                ErrorKind::ConnectionError,
                Operation::TestConnection,
                "storage.test_connection.object",
                format!("unable to check bucket {}", bucket),
            )
            .with_source(e)
        })?;

        if !exists {
            warn!("Bucket={} not found, attempting to create it", bucket);
            self.client.make_bucket().await.map_err(|e| {
                error!("Unable to create bucket={}: {}", bucket, e);
                StorageError::new(
                    ErrorKind::ConnectionError,
                    Operation::TestConnection,
                    "storage.test_connection.object.create_bucket",
                    format!("unable to create bucket {}", bucket),
                )
                .with_source(e)
            })?;
        }

        info!("Connection to bucket={} verified", bucket);
        Ok(())
    }

    async fn read_file(&self, path: &str) -> StorageResult<Vec<u8>> {
        let key = object_key(path);
        let data = self.client.get_object(&key).await.map_err(|e| {
            StorageError::new(
                ErrorKind::ReadError,
                Operation::ReadFile,
                "storage.read_file.object",
                format!("unable to read {}", key),
            )
            .with_source(e)
        })?;
        Ok(data.to_vec())
    }

    async fn write_file(&self, data: &[u8], path: &str) -> StorageResult<()> {
        let key = object_key(path);
        let metadata = build_write_metadata(self.encrypt, &content_type_for_path(&key));

        self.client
            .put_object(&key, Bytes::copy_from_slice(data), &metadata)
            .await
            .map_err(|e| {
                StorageError::new(
                    ErrorKind::WriteError,
                    Operation::WriteFile,
                    "storage.write_file.object",
                    format!("unable to write {}", key),
                )
                .with_source(e)
            })?;

        debug!("Wrote key={}, size={} bytes", key, data.len());
        Ok(())
    }

    async fn move_file(&self, old_path: &str, new_path: &str) -> StorageResult<()> {
        let src = object_key(old_path);
        let dst = object_key(new_path);

        self.client
            .copy_object(&src, &dst, &build_copy_metadata(self.encrypt))
            .await
            .map_err(|e| {
                StorageError::new(
                    ErrorKind::MoveError,
                    Operation::MoveFile,
                    "storage.move_file.object.copy",
                    format!("unable to copy {} to {}", src, dst),
                )
                .with_source(e)
            })?;

        self.client.remove_object(&src).await.map_err(|e| {
            warn!("Copied {} to {} but could not delete the source", src, dst);
            StorageError::new(
                ErrorKind::PartialMoveError,
                Operation::MoveFile,
                "storage.move_file.object.delete",
                format!("copied {} to {} but could not delete the source", src, dst),
            )
            .with_source(e)
        })
    }

    async fn remove_file(&self, path: &str) -> StorageResult<()> {
        let key = object_key(path);
        self.client.remove_object(&key).await.map_err(|e| {
            StorageError::new(
                ErrorKind::RemoveError,
                Operation::RemoveFile,
                "storage.remove_file.object",
                format!("unable to remove {}", key),
            )
            .with_source(e)
        })
    }

    async fn list_directory(&self, path: &str) -> StorageResult<Vec<String>> {
        let prefix = directory_prefix(path);
        let mut listing = self.client.list_objects(&prefix, false);
        let mut paths = Vec::new();

        while let Some(entry) = listing.next().await {
            let key = entry.map_err(|e| {
                StorageError::new(
                    ErrorKind::ListError,
                    Operation::ListDirectory,
                    "storage.list_directory.object",
                    format!("unable to list {}", prefix),
                )
                .with_source(e)
            })?;
            if key == prefix {
                continue;
            }
            paths.push(key.trim_matches('/').to_string());
        }

        paths.sort();
        info!("Listed prefix={}, found count={} entries", prefix, paths.len());
        Ok(paths)
    }

    async fn remove_directory(&self, path: &str) -> StorageResult<()> {
        let prefix = directory_prefix(path);
        let (sink, queue) = mpsc::channel::<String>(DELETE_QUEUE_DEPTH);
        let (done_tx, done_rx) = oneshot::channel::<()>();

        let producer = tokio::spawn(produce_keys(
            self.client.list_objects(&prefix, true),
            sink,
            done_rx,
        ));

        let mut failures = self.client.remove_objects(queue.boxed());
        let first_failure = failures.next().await;
        drop(failures);
        drop(done_tx);

        let produced = producer.await.map_err(|e| {
            StorageError::new(
                ErrorKind::RemoveError,
                Operation::RemoveDirectory,
                "storage.remove_directory.object",
                format!("listing of {} was aborted", prefix),
            )
            .with_source(e)
        })?;

        if let Some(failure) = first_failure {
            error!(
                "Bulk delete under prefix={} stopped at key={}",
                prefix, failure.key
            );
            return Err(StorageError::new(
                ErrorKind::BulkDeletePartialFailure,
                Operation::RemoveDirectory,
                "storage.remove_directory.object",
                format!("unable to remove {}", failure.key),
            )
            .with_source(failure));
        }

        let count = produced.map_err(|e| {
            StorageError::new(
                ErrorKind::RemoveError,
                Operation::RemoveDirectory,
                "storage.remove_directory.object",
                format!("unable to list {}", prefix),
            )
            .with_source(e)
        })?;

        info!("Removed prefix={}, deleted count={} objects", prefix, count);
        Ok(())
    }
}
