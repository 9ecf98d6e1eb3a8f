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
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::error::BoxError;

/// Driver name selecting the local filesystem backend
pub const DRIVER_LOCAL: &str = "local";

/// Driver name selecting the S3 / object storage backend
pub const DRIVER_OBJECT: &str = "amazons3";

/// Storage backend selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// Rooted local directory tree
    Local,
    /// S3 or S3-compatible bucket
    Object,
}

impl Driver {
    /// Canonical driver name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Local => DRIVER_LOCAL,
            Driver::Object => DRIVER_OBJECT,
        }
    }
}

impl FromStr for Driver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Driver::Local),
            "amazons3" | "s3" | "object" => Ok(Driver::Object),
            _ => Err(format!("Unknown file driver: '{}'", s)),
        }
    }
}

/// Connection settings for the object storage driver.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectSettings {
    /// Host and optional port, without scheme (e.g. "s3.amazonaws.com", "localhost:9000")
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Use https when true, http otherwise
    pub ssl: bool,
    /// Request legacy signature v2 signing
    pub sign_v2: bool,
    /// Fixed region; empty looks up the bucket region on first use
    pub region: String,
    pub bucket: String,
    /// Request server-side encryption on upload (also needs the compliance license)
    pub sse: bool,
    /// Log request/response wire traffic
    pub trace: bool,
}

impl ObjectSettings {
    /// Create settings for an endpoint and bucket, with TLS enabled.
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            ssl: true,
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret_access_key.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    pub fn with_signature_v2(mut self, sign_v2: bool) -> Self {
        self.sign_v2 = sign_v2;
        self
    }

    pub fn with_sse(mut self, sse: bool) -> Self {
        self.sse = sse;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

impl Debug for ObjectSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ObjectSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("ssl", &self.ssl)
            .field("sign_v2", &self.sign_v2)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("sse", &self.sse)
            .field("trace", &self.trace)
            .finish()
    }
}

/// File storage configuration.
///
/// A fresh copy is loaded from a [`ConfigSource`] for every storage call, so changes made by
/// the embedding application apply to the next call.
///
/// # Examples
///
/// ## Local filesystem
/// ```
/// use filestore::StorageConfig;
///
/// let config = StorageConfig::local("/var/lib/files");
/// assert!(config.driver().is_some());
/// ```
///
/// ## S3
/// ```
/// use filestore::{ObjectSettings, StorageConfig};
///
/// let config = StorageConfig::object(
///     ObjectSettings::new("s3.amazonaws.com", "my-bucket")
///         .with_credentials("ACCESS_KEY", "SECRET_KEY")
///         .with_region("eu-west-1")
///         .with_sse(true),
/// )
/// .with_compliance_license(true);
/// assert!(config.encrypt());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Active driver name ("local" or "amazons3"); empty when unconfigured
    pub driver_name: String,

    /// Root directory for the local driver
    pub directory: String,

    /// Settings for the object storage driver
    pub object: ObjectSettings,

    /// Whether the deployment is licensed for compliance features (gates encryption)
    pub compliance_licensed: bool,
}

impl StorageConfig {
    /// Create a local filesystem configuration rooted at `directory`.
    pub fn local(directory: impl Into<String>) -> Self {
        Self {
            driver_name: DRIVER_LOCAL.to_string(),
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Create an object storage configuration.
    pub fn object(settings: ObjectSettings) -> Self {
        Self {
            driver_name: DRIVER_OBJECT.to_string(),
            object: settings,
            ..Self::default()
        }
    }

    /// Set the driver name verbatim.
    pub fn with_driver_name(mut self, driver_name: impl Into<String>) -> Self {
        self.driver_name = driver_name.into();
        self
    }

    pub fn with_compliance_license(mut self, licensed: bool) -> Self {
        self.compliance_licensed = licensed;
        self
    }

    /// Parse the configured driver.
    ///
    /// # Returns
    ///
    /// `Some(Driver)` for a recognized driver name, `None` when the name is empty or unknown.
    pub fn driver(&self) -> Option<Driver> {
        self.driver_name.parse().ok()
    }

    /// Whether uploads should request server-side encryption.
    ///
    /// Encryption is only applied when it is enabled in the object settings and the
    /// deployment holds the compliance license.
    pub fn encrypt(&self) -> bool {
        self.object.sse && self.compliance_licensed
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Source of the storage configuration, consulted once per storage call.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Load the configuration for one call.
    async fn load(&self) -> Result<StorageConfig, BoxError>;
}

#[async_trait]
impl ConfigSource for StorageConfig {
    async fn load(&self) -> Result<StorageConfig, BoxError> {
        Ok(self.clone())
    }
}

/// Configuration shared with the embedding application, which may replace it at runtime.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<StorageConfig>>,
}

impl SharedConfig {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Replace the whole configuration.
    pub fn replace(&self, config: StorageConfig) {
        *self.inner.write() = config;
    }

    /// Modify the configuration in place.
    pub fn update(&self, f: impl FnOnce(&mut StorageConfig)) {
        let mut guard = self.inner.write();
        f(&mut *guard);
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> StorageConfig {
        self.inner.read().clone()
    }
}

#[async_trait]
impl ConfigSource for SharedConfig {
    async fn load(&self) -> Result<StorageConfig, BoxError> {
        Ok(self.snapshot())
    }
}

/// JSON configuration file, re-read on every call with `tokio::fs`.
#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for JsonConfigFile {
    async fn load(&self) -> Result<StorageConfig, BoxError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            format!(
                "Failed to read config file '{}': {}",
                self.path.display(),
                e
            )
        })?;
        let config = StorageConfig::from_json_str(&raw).map_err(|e| {
            format!(
                "Failed to parse config file '{}': {}",
                self.path.display(),
                e
            )
        })?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_driver_from_str() {
        assert_eq!("local".parse::<Driver>().unwrap(), Driver::Local);
        assert_eq!("LOCAL".parse::<Driver>().unwrap(), Driver::Local);
        assert_eq!("amazons3".parse::<Driver>().unwrap(), Driver::Object);
        assert_eq!("s3".parse::<Driver>().unwrap(), Driver::Object);
        assert_eq!("Object".parse::<Driver>().unwrap(), Driver::Object);

        assert!("".parse::<Driver>().is_err());
        assert!("azure".parse::<Driver>().is_err());
    }

    #[test]
    fn test_driver_as_str() {
        assert_eq!(Driver::Local.as_str(), "local");
        assert_eq!(Driver::Object.as_str(), "amazons3");
    }

    #[test]
    fn test_storage_config_local() {
        let config = StorageConfig::local("/tmp/data");
        assert_eq!(config.driver(), Some(Driver::Local));
        assert_eq!(config.directory, "/tmp/data");
        assert!(!config.encrypt());
    }

    #[test]
    fn test_storage_config_object() {
        let config = StorageConfig::object(
            ObjectSettings::new("localhost:9000", "files").with_region("us-west-2"),
        );
        assert_eq!(config.driver(), Some(Driver::Object));
        assert_eq!(config.object.bucket, "files");
        assert_eq!(config.object.region, "us-west-2");
        assert!(config.object.ssl);
    }

    #[test]
    fn test_unconfigured_driver() {
        assert_eq!(StorageConfig::default().driver(), None);
        assert_eq!(
            StorageConfig::local("/tmp").with_driver_name("ftp").driver(),
            None
        );
    }

    #[test]
    fn test_encrypt_requires_license() {
        let settings = ObjectSettings::new("s3.amazonaws.com", "files").with_sse(true);

        let unlicensed = StorageConfig::object(settings.clone());
        let licensed = StorageConfig::object(settings).with_compliance_license(true);
        let licensed_without_sse =
            StorageConfig::object(ObjectSettings::new("s3.amazonaws.com", "files"))
                .with_compliance_license(true);

        assert!(!unlicensed.encrypt());
        assert!(licensed.encrypt());
        assert!(!licensed_without_sse.encrypt());
    }

    #[test]
    fn test_config_deserialization_with_defaults() {
        let json = r#"{
            "driver_name": "amazons3",
            "object": {"endpoint": "localhost:9000", "bucket": "b"}
        }"#;
        let config = StorageConfig::from_json_str(json).unwrap();

        assert_eq!(config.driver(), Some(Driver::Object));
        assert_eq!(config.object.endpoint, "localhost:9000");
        assert_eq!(config.object.bucket, "b");
        assert!(!config.object.ssl);
        assert!(!config.compliance_licensed);
        assert!(config.directory.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = StorageConfig::local("/data");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"driver_name\":\"local\""));
        assert!(json.contains("\"directory\":\"/data\""));
    }

    #[test]
    fn test_object_settings_debug_redacts_secret() {
        let settings = ObjectSettings::new("localhost:9000", "files")
            .with_credentials("AKIDEXAMPLE", "super-secret-value");
        let debug_str = format!("{:?}", settings);

        assert!(debug_str.contains("AKIDEXAMPLE"));
        assert!(!debug_str.contains("super-secret-value"));
        assert!(debug_str.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_static_config_source() {
        let config = StorageConfig::local("/data");
        assert_eq!(config.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_shared_config_reflects_updates() {
        let shared = SharedConfig::new(StorageConfig::local("/data"));
        assert_eq!(shared.load().await.unwrap().driver(), Some(Driver::Local));

        shared.update(|c| c.driver_name = DRIVER_OBJECT.to_string());
        assert_eq!(shared.load().await.unwrap().driver(), Some(Driver::Object));

        shared.replace(StorageConfig::default());
        assert_eq!(shared.load().await.unwrap().driver(), None);
    }

    #[tokio::test]
    async fn test_json_config_file_is_reread() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("storage.json");
        let source = JsonConfigFile::new(&path);

        fs::write(&path, r#"{"driver_name":"local","directory":"/a"}"#).unwrap();
        assert_eq!(source.load().await.unwrap().directory, "/a");

        fs::write(&path, r#"{"driver_name":"local","directory":"/b"}"#).unwrap();
        assert_eq!(source.load().await.unwrap().directory, "/b");
    }

    #[tokio::test]
    async fn test_json_config_file_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = JsonConfigFile::new(tmp.path().join("missing.json"));
        assert!(missing.load().await.is_err());

        let path = tmp.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let err = JsonConfigFile::new(&path).load().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[tokio::test]
    async fn test_json_config_file_loads_from_spawned_tasks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("storage.json");
        fs::write(&path, r#"{"driver_name":"local","directory":"/shared"}"#).unwrap();
        let source: Arc<dyn ConfigSource> = Arc::new(JsonConfigFile::new(&path));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let source = Arc::clone(&source);
                tokio::spawn(async move { source.load().await.map(|c| c.directory) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "/shared");
        }
    }
}
