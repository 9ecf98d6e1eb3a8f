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

//! File storage abstraction layer
//!
//! This module provides a single file API over two interchangeable backends: a local
//! directory tree and an S3-compatible bucket.
//!
//! The backend is chosen by the configured driver on every call. Each backend translates
//! its native failures into [`StorageError`](error::StorageError), so callers handle one
//! error type whichever medium is active.

pub mod config;
pub mod error;
pub mod facade;
pub mod factory;
pub mod local;
pub mod metadata;
pub mod object;
pub mod provider;

// Public exports
pub use config::{
    ConfigSource, Driver, JsonConfigFile, ObjectSettings, SharedConfig, StorageConfig,
};
pub use error::{ErrorKind, Operation, StorageError, StorageResult};
pub use facade::FileStore;
pub use factory::StorageProviderFactory;
pub use local::LocalBackend;
pub use object::{ObjectBackend, ObjectClient, ObjectStoreClient, S3ClientFactory};
pub use provider::StorageProvider;
