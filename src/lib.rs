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

//! # filestore
//!
//! One file storage API over either a local directory tree or an S3-compatible bucket.
//!
//! The application reads, writes, moves, lists and deletes files by logical path. Which
//! medium actually holds them is decided by configuration, loaded again on every call, so
//! switching drivers takes effect without restarting the process.
//!
//! ## Features
//!
//! - **Two drivers**: local filesystem (rooted directory) and S3 / S3-compatible services
//! - **Uniform errors**: every failure is a [`StorageError`] with an operation tag, a message key
//!   and an HTTP-like status code
//! - **Streaming directory removal**: object prefixes are listed and bulk-deleted through a
//!   bounded pipeline that stops at the first failed key
//! - **Server-side encryption**: applied to uploads when enabled and licensed
//!
//! ## Quick Start
//!
//! ### Local Filesystem Example
//!
//! ```rust,no_run
//! use filestore::{FileStore, StorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let store = FileStore::new(StorageConfig::local("./data/files"));
//!
//! store.write_file(b"hello", "teams/abc/hello.txt").await?;
//! let contents = store.read_file("teams/abc/hello.txt").await?;
//! assert_eq!(contents, b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! ### S3 Example
//!
//! ```rust,no_run
//! use filestore::{FileStore, ObjectSettings, StorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let settings = ObjectSettings::new("localhost:9000", "my-bucket")
//!     .with_credentials("ACCESS_KEY", "SECRET_KEY")
//!     .with_region("us-east-1");
//!
//! let store = FileStore::new(StorageConfig::object(settings));
//! store.test_connection().await?;
//!
//! for dir in store.list_directory("teams/").await? {
//!     println!("{}", dir);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`storage`] - Storage facade, backends and configuration
//! - [`util`] - Local directory copy helpers

pub mod storage;
pub mod util;

// Re-export commonly used types
pub use storage::config::{
    ConfigSource, Driver, JsonConfigFile, ObjectSettings, SharedConfig, StorageConfig,
};
pub use storage::error::{ErrorKind, Operation, StorageError, StorageResult};
pub use storage::facade::FileStore;
