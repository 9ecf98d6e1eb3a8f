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

//! S3 and S3-compatible object client built on `aws-sdk-s3`.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::interceptors::{
    BeforeDeserializationInterceptorContextRef, BeforeTransmitInterceptorContextRef,
};
use aws_sdk_s3::config::{
    BehaviorVersion, Builder as S3ConfigBuilder, ConfigBag, Credentials, Intercept, Region,
    RuntimeComponents,
};
use aws_sdk_s3::error::{
    BoxError as SdkBoxError, DisplayErrorContext, ProvideErrorMetadata, SdkError,
};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
    ServerSideEncryption,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use super::client::{ClientError, ClientFactory, ObjectClient, RemoveObjectError};
use crate::storage::config::ObjectSettings;
use crate::storage::error::{ErrorKind, Operation, StorageError, StorageResult};
use crate::storage::metadata::{ObjectMetadata, CONTENT_TYPE, SERVER_SIDE_ENCRYPTION};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Maximum number of keys per `DeleteObjects` request
pub const DELETE_BATCH_SIZE: usize = 1000;

const WIRE_TARGET: &str = "filestore::wire";
const BUCKET_REGION_HEADER: &str = "x-amz-bucket-region";
const CONNECT_MESSAGE_ID: &str = "storage.object.connect";

// Characters kept verbatim in the `x-amz-copy-source` header.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Default [`ClientFactory`]: one `aws-sdk-s3` client per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3ClientFactory;

impl ClientFactory for S3ClientFactory {
    fn connect(
        &self,
        settings: &ObjectSettings,
        operation: Operation,
    ) -> StorageResult<Arc<dyn ObjectClient>> {
        Ok(Arc::new(S3Client::new(settings, operation)?))
    }
}

/// Object client bound to one bucket of an S3-compatible service.
///
/// Without a configured region the bucket's region is looked up once, before the first
/// request, and every later request is signed for it.
#[derive(Clone)]
pub struct S3Client {
    base: Client,
    bucket: String,
    resolved: Arc<OnceCell<RegionClient>>,
}

struct RegionClient {
    client: Client,
    region: String,
}

impl S3Client {
    /// Build a client from connection settings.
    ///
    /// # Arguments
    ///
    /// * `settings` - Endpoint, credentials, region and bucket
    /// * `operation` - Operation reported if construction fails
    ///
    /// # Errors
    ///
    /// Returns a `ConnectionError` if signature v2 is requested or the endpoint is not a
    /// valid `host[:port]`.
    pub fn new(settings: &ObjectSettings, operation: Operation) -> StorageResult<Self> {
        if settings.sign_v2 {
            return Err(StorageError::new(
                ErrorKind::ConnectionError,
                operation,
                CONNECT_MESSAGE_ID,
                "signature v2 is not supported, only v4 signing is available; \
                 set `sign_v2` to false in the object storage settings",
            ));
        }

        let endpoint = endpoint_url(settings).map_err(|e| {
            StorageError::new(
                ErrorKind::ConnectionError,
                operation,
                CONNECT_MESSAGE_ID,
                format!("invalid object storage endpoint '{}'", settings.endpoint),
            )
            .with_source(e)
        })?;

        let region = match settings.region.as_str() {
            "" => DEFAULT_REGION,
            region => region,
        };

        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "filestore",
        );

        let mut builder = S3ConfigBuilder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true);

        if let Some(endpoint) = &endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if settings.trace {
            builder = builder.interceptor(WireTrace);
        }

        debug!(
            "Created S3 client for bucket={}, region={}, endpoint={}",
            settings.bucket,
            if settings.region.is_empty() { "auto" } else { region },
            endpoint.as_deref().unwrap_or("default")
        );

        let base = Client::from_conf(builder.build());
        let resolved = if settings.region.is_empty() {
            OnceCell::new()
        } else {
            OnceCell::from(RegionClient {
                client: base.clone(),
                region: region.to_string(),
            })
        };

        Ok(Self {
            base,
            bucket: settings.bucket.clone(),
            resolved: Arc::new(resolved),
        })
    }

    /// Region requests are signed for, once known.
    ///
    /// `None` until the first request of a client without a configured region.
    pub fn region(&self) -> Option<&str> {
        self.resolved.get().map(|bound| bound.region.as_str())
    }

    async fn bound(&self) -> &RegionClient {
        self.resolved.get_or_init(|| self.discover_region()).await
    }

    async fn client(&self) -> &Client {
        &self.bound().await.client
    }

    /// Ask the service which region holds the bucket.
    ///
    /// `HeadBucket` reports the region in `x-amz-bucket-region`, both on success and on
    /// the redirect returned when the request was signed for another region.
    async fn discover_region(&self) -> RegionClient {
        let discovered = match self.base.head_bucket().bucket(&self.bucket).send().await {
            Ok(output) => bucket_region(output.bucket_region()),
            Err(e) => bucket_region(
                e.raw_response()
                    .and_then(|response| response.headers().get(BUCKET_REGION_HEADER)),
            ),
        };

        let region = match discovered {
            Some(region) => {
                debug!("Discovered region={} for bucket={}", region, self.bucket);
                region
            }
            None => {
                debug!(
                    "No region reported for bucket={}, using region={}",
                    self.bucket, DEFAULT_REGION
                );
                DEFAULT_REGION.to_string()
            }
        };

        let client = if region == DEFAULT_REGION {
            self.base.clone()
        } else {
            let config = self
                .base
                .config()
                .to_builder()
                .region(Region::new(region.clone()))
                .build();
            Client::from_conf(config)
        };
        RegionClient { client, region }
    }
}

impl Debug for S3Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "S3Client(bucket={}, region={})",
            self.bucket,
            self.region().unwrap_or("auto")
        )
    }
}

/// Region named by a bucket region header or field, if any.
fn bucket_region(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .map(str::to_string)
}

/// `http[s]://endpoint` for a non-empty endpoint, `None` to use the SDK's resolution.
fn endpoint_url(settings: &ObjectSettings) -> Result<Option<String>, url::ParseError> {
    if settings.endpoint.is_empty() {
        return Ok(None);
    }
    let scheme = if settings.ssl { "https" } else { "http" };
    let url = Url::parse(&format!("{}://{}", scheme, settings.endpoint))?;
    Ok(Some(url.as_str().trim_end_matches('/').to_string()))
}

/// Value of the `x-amz-copy-source` header for `key` in `bucket`.
fn copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, utf8_percent_encode(key, COPY_SOURCE))
}

fn to_client_error<E>(key: &str, err: SdkError<E, HttpResponse>) -> ClientError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
{
    if let SdkError::ServiceError(context) = &err {
        let code = context.err().code();
        if context.raw().status().as_u16() == 404
            || matches!(code, Some("NoSuchKey" | "NoSuchBucket" | "NotFound"))
        {
            return ClientError::NotFound(key.to_string());
        }
        if let Some(code) = code {
            return ClientError::Rejected {
                code: code.to_string(),
                message: context.err().message().unwrap_or_default().to_string(),
            };
        }
    }
    ClientError::Service(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl ObjectClient for S3Client {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn bucket_exists(&self) -> Result<bool, ClientError> {
        let client = self.client().await;
        match client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match to_client_error(&self.bucket, e) {
                ClientError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn make_bucket(&self) -> Result<(), ClientError> {
        let bound = self.bound().await;
        let mut request = bound.client.create_bucket().bucket(&self.bucket);
        if bound.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(bound.region.as_str()))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| to_client_error(&self.bucket, e))?;

        info!("Created bucket={} in region={}", self.bucket, bound.region);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, ClientError> {
        let output = self
            .client()
            .await
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| to_client_error(key, e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| ClientError::Service(e.to_string()))?
            .into_bytes();

        debug!("Fetched object key={}, size={} bytes", key, data.len());
        Ok(data)
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), ClientError> {
        let size = data.len();
        let mut request = self
            .client()
            .await
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        for (name, value) in metadata {
            request = match name.as_str() {
                CONTENT_TYPE => request.content_type(value),
                SERVER_SIDE_ENCRYPTION => {
                    request.server_side_encryption(ServerSideEncryption::from(value.as_str()))
                }
                _ => request.metadata(name, value),
            };
        }

        request.send().await.map_err(|e| to_client_error(key, e))?;

        debug!("Stored object key={}, size={} bytes", key, size);
        Ok(())
    }

    async fn copy_object(
        &self,
        src: &str,
        dst: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), ClientError> {
        let mut request = self
            .client()
            .await
            .copy_object()
            .bucket(&self.bucket)
            .key(dst)
            .copy_source(copy_source(&self.bucket, src));

        if let Some(algorithm) = metadata.server_side_encryption() {
            request = request.server_side_encryption(ServerSideEncryption::from(algorithm));
        }

        request.send().await.map_err(|e| to_client_error(src, e))?;

        debug!("Copied object {} -> {}", src, dst);
        Ok(())
    }

    async fn remove_object(&self, key: &str) -> Result<(), ClientError> {
        self.client()
            .await
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| to_client_error(key, e))?;
        Ok(())
    }

    fn list_objects(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> BoxStream<'static, Result<String, ClientError>> {
        let this = self.clone();
        let prefix = prefix.to_string();

        stream::once(async move {
            let client = this.client().await.clone();
            list_keys(client, this.bucket, prefix, recursive)
        })
        .flatten()
        .boxed()
    }

    fn remove_objects(
        &self,
        keys: BoxStream<'static, String>,
    ) -> BoxStream<'static, RemoveObjectError> {
        let this = self.clone();

        keys.ready_chunks(DELETE_BATCH_SIZE)
            .then(move |batch| {
                let this = this.clone();
                async move {
                    let client = this.client().await.clone();
                    delete_batch(client, this.bucket, batch).await
                }
            })
            .flat_map(stream::iter)
            .boxed()
    }
}

/// Stream every key (and common prefix, when not recursive) under `prefix`.
fn list_keys(
    client: Client,
    bucket: String,
    prefix: String,
    recursive: bool,
) -> BoxStream<'static, Result<String, ClientError>> {
    let mut request = client.list_objects_v2().bucket(bucket).prefix(&prefix);
    if !recursive {
        request = request.delimiter("/");
    }
    let pages = request.into_paginator().send();

    stream::unfold(
        (pages, VecDeque::<String>::new(), false),
        move |(mut pages, mut pending, mut failed)| {
            let prefix = prefix.clone();
            async move {
                loop {
                    if let Some(key) = pending.pop_front() {
                        return Some((Ok(key), (pages, pending, failed)));
                    }
                    if failed {
                        return None;
                    }
                    match pages.next().await {
                        Some(Ok(page)) => {
                            pending.extend(
                                page.common_prefixes()
                                    .iter()
                                    .filter_map(|p| p.prefix().map(str::to_string)),
                            );
                            pending.extend(
                                page.contents()
                                    .iter()
                                    .filter_map(|o| o.key().map(str::to_string)),
                            );
                        }
                        Some(Err(e)) => {
                            failed = true;
                            let error = to_client_error(&prefix, e);
                            return Some((Err(error), (pages, pending, failed)));
                        }
                        None => return None,
                    }
                }
            }
        },
    )
    .boxed()
}

/// Delete up to [`DELETE_BATCH_SIZE`] keys in one quiet `DeleteObjects` request.
async fn delete_batch(
    client: Client,
    bucket: String,
    keys: Vec<String>,
) -> Vec<RemoveObjectError> {
    let fail_all = |keys: Vec<String>, source: ClientError| -> Vec<RemoveObjectError> {
        keys.into_iter()
            .map(|key| RemoveObjectError {
                key,
                source: source.clone(),
            })
            .collect()
    };

    let identifiers: Result<Vec<ObjectIdentifier>, _> = keys
        .iter()
        .map(|key| ObjectIdentifier::builder().key(key).build())
        .collect();
    let delete = identifiers.and_then(|objects| {
        Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
    });
    let delete = match delete {
        Ok(delete) => delete,
        Err(e) => return fail_all(keys, ClientError::Service(e.to_string())),
    };

    match client
        .delete_objects()
        .bucket(&bucket)
        .delete(delete)
        .send()
        .await
    {
        Ok(output) => {
            debug!(
                "Deleted batch of count={} keys, errors={}",
                keys.len(),
                output.errors().len()
            );
            output
                .errors()
                .iter()
                .map(|e| RemoveObjectError {
                    key: e.key().unwrap_or_default().to_string(),
                    source: ClientError::Rejected {
                        code: e.code().unwrap_or("Unknown").to_string(),
                        message: e.message().unwrap_or_default().to_string(),
                    },
                })
                .collect()
        }
        Err(e) => {
            let source = to_client_error(&bucket, e);
            fail_all(keys, source)
        }
    }
}

/// Logs request lines and response status to the `filestore::wire` target.
#[derive(Debug)]
struct WireTrace;

impl Intercept for WireTrace {
    fn name(&self) -> &'static str {
        "WireTrace"
    }

    fn read_before_transmit(
        &self,
        context: &BeforeTransmitInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), SdkBoxError> {
        let request = context.request();
        info!(target: WIRE_TARGET, "{} {}", request.method(), request.uri());
        Ok(())
    }

    fn read_before_deserialization(
        &self,
        context: &BeforeDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), SdkBoxError> {
        let response = context.response();
        let headers: Vec<String> = response
            .headers()
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        info!(
            target: WIRE_TARGET,
            "status={} headers=[{}]",
            response.status().as_u16(),
            headers.join(", ")
        );
        Ok(())
    }
}
