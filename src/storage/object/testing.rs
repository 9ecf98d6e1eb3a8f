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

//! Fault-injecting object client used by the backend and facade tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::client::{ClientError, ClientFactory, ObjectClient, RemoveObjectError};
use super::memory::ObjectStoreClient;
use crate::storage::config::ObjectSettings;
use crate::storage::error::{Operation, StorageResult};
use crate::storage::metadata::ObjectMetadata;

/// In-memory bucket with switchable failures.
#[derive(Debug)]
pub(crate) struct FaultyClient {
    inner: ObjectStoreClient,
    bucket_present: AtomicBool,
    fail_create: AtomicBool,
    fail_list: AtomicBool,
    fail_copy: AtomicBool,
    failing_removes: Mutex<HashSet<String>>,
    buckets_created: AtomicUsize,
    listed: Arc<AtomicUsize>,
    last_put: Mutex<Option<ObjectMetadata>>,
    last_copy: Mutex<Option<ObjectMetadata>>,
}

impl FaultyClient {
    pub(crate) fn new(bucket: &str) -> Self {
        Self {
            inner: ObjectStoreClient::in_memory(bucket),
            bucket_present: AtomicBool::new(true),
            fail_create: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            fail_copy: AtomicBool::new(false),
            failing_removes: Mutex::new(HashSet::new()),
            buckets_created: AtomicUsize::new(0),
            listed: Arc::new(AtomicUsize::new(0)),
            last_put: Mutex::new(None),
            last_copy: Mutex::new(None),
        }
    }

    pub(crate) fn without_bucket(self) -> Self {
        self.bucket_present.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_bucket_creation(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_list(self) -> Self {
        self.fail_list.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_copy(self) -> Self {
        self.fail_copy.store(true, Ordering::SeqCst);
        self
    }

    /// Deleting `key` fails, individually and in bulk.
    pub(crate) fn failing_remove(self, key: &str) -> Self {
        self.failing_removes.lock().insert(key.to_string());
        self
    }

    pub(crate) fn buckets_created(&self) -> usize {
        self.buckets_created.load(Ordering::SeqCst)
    }

    /// Keys handed out by recursive and non-recursive listings so far.
    pub(crate) fn keys_listed(&self) -> usize {
        self.listed.load(Ordering::SeqCst)
    }

    pub(crate) fn last_put_metadata(&self) -> Option<ObjectMetadata> {
        self.last_put.lock().clone()
    }

    pub(crate) fn last_copy_metadata(&self) -> Option<ObjectMetadata> {
        self.last_copy.lock().clone()
    }

    /// Store `count` one-byte objects named `{prefix}/{index:05}`.
    pub(crate) async fn seed(&self, prefix: &str, count: usize) {
        for index in 0..count {
            let key = format!("{}/{:05}", prefix, index);
            self.inner
                .put_object(&key, Bytes::from_static(b"x"), &ObjectMetadata::new())
                .await
                .expect("seeding the in-memory bucket");
        }
    }

    fn rejected(&self, key: &str) -> Option<ClientError> {
        self.failing_removes.lock().contains(key).then(|| ClientError::Rejected {
            code: "AccessDenied".to_string(),
            message: format!("delete of {} denied", key),
        })
    }
}

#[async_trait]
impl ObjectClient for FaultyClient {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    async fn bucket_exists(&self) -> Result<bool, ClientError> {
        Ok(self.bucket_present.load(Ordering::SeqCst))
    }

    async fn make_bucket(&self) -> Result<(), ClientError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected {
                code: "BucketAlreadyOwnedByYou".to_string(),
                message: "bucket creation refused".to_string(),
            });
        }
        self.buckets_created.fetch_add(1, Ordering::SeqCst);
        self.bucket_present.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, ClientError> {
        self.inner.get_object(key).await
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), ClientError> {
        *self.last_put.lock() = Some(metadata.clone());
        self.inner.put_object(key, data, metadata).await
    }

    async fn copy_object(
        &self,
        src: &str,
        dst: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), ClientError> {
        *self.last_copy.lock() = Some(metadata.clone());
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(ClientError::Service("copy interrupted".to_string()));
        }
        self.inner.copy_object(src, dst, metadata).await
    }

    async fn remove_object(&self, key: &str) -> Result<(), ClientError> {
        match self.rejected(key) {
            Some(error) => Err(error),
            None => self.inner.remove_object(key).await,
        }
    }

    fn list_objects(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> BoxStream<'static, Result<String, ClientError>> {
        if self.fail_list.load(Ordering::SeqCst) {
            let error = ClientError::Service("listing unavailable".to_string());
            return stream::iter(vec![Err(error)]).boxed();
        }
        let listed = Arc::clone(&self.listed);
        self.inner
            .list_objects(prefix, recursive)
            .inspect(move |_| {
                listed.fetch_add(1, Ordering::SeqCst);
            })
            .boxed()
    }

    fn remove_objects(
        &self,
        keys: BoxStream<'static, String>,
    ) -> BoxStream<'static, RemoveObjectError> {
        let store = self.inner.clone();
        let failing = self.failing_removes.lock().clone();
        keys.then(move |key| {
            let store = store.clone();
            let denied = failing.contains(&key);
            async move {
                if denied {
                    return Some(RemoveObjectError {
                        source: ClientError::Rejected {
                            code: "AccessDenied".to_string(),
                            message: format!("delete of {} denied", key),
                        },
                        key,
                    });
                }
                let result = store.remove_object(&key).await;
                result.err().map(|source| RemoveObjectError { key, source })
            }
        })
        .filter_map(future::ready)
        .boxed()
    }
}

/// Hands out the same client for every connection.
pub(crate) struct FixedClientFactory {
    client: Arc<dyn ObjectClient>,
    connects: AtomicUsize,
}

impl FixedClientFactory {
    pub(crate) fn new(client: Arc<dyn ObjectClient>) -> Self {
        Self {
            client,
            connects: AtomicUsize::new(0),
        }
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ClientFactory for FixedClientFactory {
    fn connect(
        &self,
        _settings: &ObjectSettings,
        _operation: Operation,
    ) -> StorageResult<Arc<dyn ObjectClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.client))
    }
}
