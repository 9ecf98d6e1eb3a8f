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

//! [`ObjectClient`] over any `object_store` backend.
//!
//! Used with `object_store::memory::InMemory` as an in-process bucket, and to plug other
//! `object_store` implementations behind the object driver.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use super::client::{ClientError, ObjectClient, RemoveObjectError};
use crate::storage::metadata::{ObjectMetadata, CONTENT_TYPE};

/// Object client backed by an `object_store::ObjectStore`
#[derive(Clone)]
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStoreClient {
    /// Wrap a store. `bucket` is only used for reporting; the store is already bound to one.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Client over a fresh in-memory store.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket)
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

impl Debug for ObjectStoreClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ObjectStoreClient(bucket={}, store={})", self.bucket, self.store)
    }
}

fn to_client_error(key: &str, err: object_store::Error) -> ClientError {
    match err {
        object_store::Error::NotFound { .. } => ClientError::NotFound(key.to_string()),
        object_store::Error::NotImplemented => {
            ClientError::Unsupported("object_store operation")
        }
        other => ClientError::Service(other.to_string()),
    }
}

fn to_attributes(metadata: &ObjectMetadata) -> Attributes {
    let mut attributes = Attributes::new();
    for (key, value) in metadata {
        let attribute = if key == CONTENT_TYPE {
            Attribute::ContentType
        } else {
            Attribute::Metadata(key.clone().into())
        };
        attributes.insert(attribute, value.clone().into());
    }
    attributes
}

#[async_trait]
impl ObjectClient for ObjectStoreClient {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn bucket_exists(&self) -> Result<bool, ClientError> {
        match self.store.list_with_delimiter(None).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(to_client_error(&self.bucket, e)),
        }
    }

    async fn make_bucket(&self) -> Result<(), ClientError> {
        Err(ClientError::Unsupported("make_bucket"))
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, ClientError> {
        let location = ObjectPath::from(key);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| to_client_error(key, e))?;
        result.bytes().await.map_err(|e| to_client_error(key, e))
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), ClientError> {
        let options = PutOptions {
            attributes: to_attributes(metadata),
            ..Default::default()
        };
        self.store
            .put_opts(&ObjectPath::from(key), PutPayload::from(data), options)
            .await
            .map_err(|e| to_client_error(key, e))?;
        Ok(())
    }

    async fn copy_object(
        &self,
        src: &str,
        dst: &str,
        _metadata: &ObjectMetadata,
    ) -> Result<(), ClientError> {
        self.store
            .copy(&ObjectPath::from(src), &ObjectPath::from(dst))
            .await
            .map_err(|e| to_client_error(src, e))
    }

    async fn remove_object(&self, key: &str) -> Result<(), ClientError> {
        self.store
            .delete(&ObjectPath::from(key))
            .await
            .map_err(|e| to_client_error(key, e))
    }

    fn list_objects(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> BoxStream<'static, Result<String, ClientError>> {
        let store = Arc::clone(&self.store);
        let prefix = prefix.trim_matches('/').to_string();
        let location = (!prefix.is_empty()).then(|| ObjectPath::from(prefix.as_str()));

        if recursive {
            return store
                .list(location.as_ref())
                .map_ok(|meta| meta.location.to_string())
                .map_err(move |e| to_client_error(&prefix, e))
                .boxed();
        }

        stream::once(async move {
            let listing = store.list_with_delimiter(location.as_ref()).await?;
            let mut keys: Vec<String> = listing
                .common_prefixes
                .iter()
                .map(|p| format!("{}/", p))
                .collect();
            keys.extend(listing.objects.into_iter().map(|m| m.location.to_string()));
            Ok(keys)
        })
        .flat_map(move |result| {
            let items: Vec<Result<String, ClientError>> = match result {
                Ok(keys) => keys.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(to_client_error(&prefix, e))],
            };
            stream::iter(items)
        })
        .boxed()
    }

    fn remove_objects(
        &self,
        keys: BoxStream<'static, String>,
    ) -> BoxStream<'static, RemoveObjectError> {
        let store = Arc::clone(&self.store);
        keys.then(move |key| {
            let store = Arc::clone(&store);
            async move {
                let location = ObjectPath::from(key.as_str());
                let result = store.delete(&location).await;
                match result {
                    Ok(()) => None,
                    Err(e) => Some(RemoveObjectError {
                        source: to_client_error(&key, e),
                        key,
                    }),
                }
            }
        })
        .filter_map(future::ready)
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::metadata::build_write_metadata;
    use object_store::{
        GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, PutMultipartOpts,
        PutResult,
    };
    use std::fmt::Display;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store that counts the entries its listings have yielded.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: InMemory,
        listed: Arc<AtomicUsize>,
    }

    impl CountingStore {
        fn listed(&self) -> usize {
            self.listed.load(Ordering::SeqCst)
        }
    }

    impl Display for CountingStore {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            write!(f, "CountingStore({})", self.inner)
        }
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn put_opts(
            &self,
            location: &ObjectPath,
            payload: PutPayload,
            opts: PutOptions,
        ) -> object_store::Result<PutResult> {
            self.inner.put_opts(location, payload, opts).await
        }

        async fn put_multipart_opts(
            &self,
            location: &ObjectPath,
            opts: PutMultipartOpts,
        ) -> object_store::Result<Box<dyn MultipartUpload>> {
            self.inner.put_multipart_opts(location, opts).await
        }

        async fn get_opts(
            &self,
            location: &ObjectPath,
            options: GetOptions,
        ) -> object_store::Result<GetResult> {
            self.inner.get_opts(location, options).await
        }

        async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
            self.inner.delete(location).await
        }

        fn list(
            &self,
            prefix: Option<&ObjectPath>,
        ) -> BoxStream<'static, object_store::Result<ObjectMeta>> {
            let listed = Arc::clone(&self.listed);
            self.inner
                .list(prefix)
                .inspect(move |_| {
                    listed.fetch_add(1, Ordering::SeqCst);
                })
                .boxed()
        }

        async fn list_with_delimiter(
            &self,
            prefix: Option<&ObjectPath>,
        ) -> object_store::Result<ListResult> {
            self.inner.list_with_delimiter(prefix).await
        }

        async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
            self.inner.copy(from, to).await
        }

        async fn copy_if_not_exists(
            &self,
            from: &ObjectPath,
            to: &ObjectPath,
        ) -> object_store::Result<()> {
            self.inner.copy_if_not_exists(from, to).await
        }
    }

    async fn seed(client: &ObjectStoreClient, keys: &[&str]) {
        for key in keys {
            client
                .put_object(key, Bytes::from_static(b"x"), &ObjectMetadata::new())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let client = ObjectStoreClient::in_memory("files");
        let metadata = build_write_metadata(true, "image/png");

        client
            .put_object("a/logo.png", Bytes::from_static(b"png"), &metadata)
            .await
            .unwrap();

        let data = client.get_object("a/logo.png").await.unwrap();
        assert_eq!(data.as_ref(), b"png");
    }

    #[tokio::test]
    async fn test_put_stores_attributes() {
        let client = ObjectStoreClient::in_memory("files");
        let metadata = build_write_metadata(true, "image/png");
        client
            .put_object("logo.png", Bytes::from_static(b"png"), &metadata)
            .await
            .unwrap();

        let result = client
            .store()
            .get(&ObjectPath::from("logo.png"))
            .await
            .unwrap();
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| AsRef::<str>::as_ref(v).to_string());
        assert_eq!(content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let client = ObjectStoreClient::in_memory("files");
        let err = client.get_object("missing.txt").await.unwrap_err();
        assert_eq!(err, ClientError::NotFound("missing.txt".to_string()));
    }

    #[tokio::test]
    async fn test_bucket_exists_and_make_bucket() {
        let client = ObjectStoreClient::in_memory("files");
        assert!(client.bucket_exists().await.unwrap());
        assert_eq!(
            client.make_bucket().await.unwrap_err(),
            ClientError::Unsupported("make_bucket")
        );
    }

    #[tokio::test]
    async fn test_list_non_recursive() {
        let client = ObjectStoreClient::in_memory("files");
        seed(&client, &["a/b/1.txt", "a/c/2.txt", "a/top.txt", "other/3.txt"]).await;

        let mut keys: Vec<String> =
            client.list_objects("a/", false).try_collect().await.unwrap();
        keys.sort();

        assert_eq!(keys, vec!["a/b/", "a/c/", "a/top.txt"]);
    }

    #[tokio::test]
    async fn test_list_recursive() {
        let client = ObjectStoreClient::in_memory("files");
        seed(&client, &["a/b/1.txt", "a/c/2.txt", "a/top.txt", "ab/4.txt"]).await;

        let mut keys: Vec<String> =
            client.list_objects("a", true).try_collect().await.unwrap();
        keys.sort();

        assert_eq!(keys, vec!["a/b/1.txt", "a/c/2.txt", "a/top.txt"]);
    }

    #[tokio::test]
    async fn test_copy_and_remove() {
        let client = ObjectStoreClient::in_memory("files");
        seed(&client, &["src.txt"]).await;

        client
            .copy_object("src.txt", "dst.txt", &ObjectMetadata::new())
            .await
            .unwrap();
        client.remove_object("src.txt").await.unwrap();

        assert!(client.get_object("dst.txt").await.is_ok());
        assert!(client.get_object("src.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_remove_objects() {
        let client = ObjectStoreClient::in_memory("files");
        seed(&client, &["d/1", "d/2", "d/3"]).await;

        let keys = stream::iter(vec!["d/1".to_string(), "d/2".to_string(), "d/3".to_string()]);
        let failures: Vec<RemoveObjectError> =
            client.remove_objects(keys.boxed()).collect().await;

        assert!(failures.is_empty());
        let remaining: Vec<String> =
            client.list_objects("d", true).try_collect().await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_recursive_list_streams_keys() {
        let store = Arc::new(CountingStore::default());
        let client = ObjectStoreClient::new(store.clone(), "files");
        let keys: Vec<String> = (0..50).map(|i| format!("d/{:03}", i)).collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        seed(&client, &keys).await;

        let first: Vec<String> = client
            .list_objects("d", true)
            .take(3)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(first.len(), 3);
        // Only the entries handed to the caller were pulled from the store.
        assert_eq!(store.listed(), 3);
    }
}
