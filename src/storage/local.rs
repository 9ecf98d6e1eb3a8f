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

//! Local filesystem backend rooted at a configured directory.

use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, DirBuilder, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::config::Driver;
use super::error::{ErrorKind, Operation, StorageError, StorageResult};
use super::provider::StorageProvider;

/// Name of the probe file written by `test_connection`, relative to the root.
pub const PROBE_FILE: &str = "testfile";
/// Contents written to and expected back from the probe file.
pub const PROBE_CONTENTS: &[u8] = b"testingwrite";

#[cfg(unix)]
const DIR_MODE: u32 = 0o774;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Storage provider over a local directory tree
pub struct LocalBackend {
    root: PathBuf,
    base_path: String,
}

impl LocalBackend {
    /// # Arguments
    ///
    /// * `root` - Directory every logical path is resolved under
    pub fn new(root: impl Into<String>) -> Self {
        let base_path = root.into();
        Self {
            root: PathBuf::from(&base_path),
            base_path,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical path under the root.
    ///
    /// Leading slashes are ignored and `.` components skipped. A `..` component is rejected
    /// with `kind`, so no path can leave the root.
    fn resolve(
        &self,
        path: &str,
        kind: ErrorKind,
        operation: Operation,
        message_id: &'static str,
    ) -> StorageResult<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(name) => resolved.push(name),
                Component::CurDir | Component::RootDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(StorageError::new(
                        kind,
                        operation,
                        message_id,
                        format!("path '{}' is outside the storage root", path),
                    )
                    .with_source(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "path traversal is not allowed",
                    )));
                }
            }
        }
        Ok(resolved)
    }
}

impl Debug for LocalBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "LocalBackend(root={})", self.root.display())
    }
}

async fn create_parent_dirs(path: &Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(parent).await
}

async fn write_bytes(path: &Path, data: &[u8]) -> io::Result<()> {
    create_parent_dirs(path).await?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.flush().await
}

/// Removes the probe file when dropped, whatever happened to it.
struct ProbeGuard {
    path: PathBuf,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(
                "Ignoring probe cleanup error for path={}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[async_trait]
impl StorageProvider for LocalBackend {
    fn driver(&self) -> Driver {
        Driver::Local
    }

    fn base_path(&self) -> &str {
        &self.base_path
    }

    async fn test_connection(&self) -> StorageResult<()> {
        const MESSAGE_ID: &str = "storage.test_connection.local";

        let probe = self.root.join(PROBE_FILE);
        let _guard = ProbeGuard {
            path: probe.clone(),
        };

        let connection_error = |detail: &str, e: io::Error| {
            StorageError::new(
                ErrorKind::ConnectionError,
                Operation::TestConnection,
                MESSAGE_ID,
                format!("{} {}", detail, self.root.display()),
            )
            .with_source(e)
        };

        write_bytes(&probe, PROBE_CONTENTS)
            .await
            .map_err(|e| connection_error("unable to write to", e))?;

        let read_back = fs::read(&probe)
            .await
            .map_err(|e| connection_error("unable to read back from", e))?;

        if read_back != PROBE_CONTENTS {
            return Err(StorageError::new(
                ErrorKind::ConnectionError,
                Operation::TestConnection,
                MESSAGE_ID,
                format!("probe file under {} did not read back", self.root.display()),
            ));
        }

        info!("Able to write files to root={}", self.root.display());
        Ok(())
    }

    async fn read_file(&self, path: &str) -> StorageResult<Vec<u8>> {
        const MESSAGE_ID: &str = "storage.read_file.local";

        let file = self.resolve(path, ErrorKind::ReadError, Operation::ReadFile, MESSAGE_ID)?;
        fs::read(&file).await.map_err(|e| {
            StorageError::new(
                ErrorKind::ReadError,
                Operation::ReadFile,
                MESSAGE_ID,
                format!("unable to read {}", path),
            )
            .with_source(e)
        })
    }

    async fn write_file(&self, data: &[u8], path: &str) -> StorageResult<()> {
        const MESSAGE_ID: &str = "storage.write_file.local";

        let file = self.resolve(path, ErrorKind::WriteError, Operation::WriteFile, MESSAGE_ID)?;
        write_bytes(&file, data).await.map_err(|e| {
            StorageError::new(
                ErrorKind::WriteError,
                Operation::WriteFile,
                MESSAGE_ID,
                format!("unable to write {}", path),
            )
            .with_source(e)
        })?;

        debug!("Wrote path={}, size={} bytes", file.display(), data.len());
        Ok(())
    }

    async fn move_file(&self, old_path: &str, new_path: &str) -> StorageResult<()> {
        const MESSAGE_ID: &str = "storage.move_file.local";

        let src = self.resolve(old_path, ErrorKind::MoveError, Operation::MoveFile, MESSAGE_ID)?;
        let dst = self.resolve(new_path, ErrorKind::MoveError, Operation::MoveFile, MESSAGE_ID)?;

        let move_error = |e: io::Error| {
            StorageError::new(
                ErrorKind::MoveError,
                Operation::MoveFile,
                MESSAGE_ID,
                format!("unable to move {} to {}", old_path, new_path),
            )
            .with_source(e)
        };

        create_parent_dirs(&dst).await.map_err(move_error)?;
        fs::rename(&src, &dst).await.map_err(move_error)
    }

    async fn remove_file(&self, path: &str) -> StorageResult<()> {
        const MESSAGE_ID: &str = "storage.remove_file.local";

        let file = self.resolve(
            path,
            ErrorKind::RemoveError,
            Operation::RemoveFile,
            MESSAGE_ID,
        )?;
        fs::remove_file(&file).await.map_err(|e| {
            StorageError::new(
                ErrorKind::RemoveError,
                Operation::RemoveFile,
                MESSAGE_ID,
                format!("unable to remove {}", path),
            )
            .with_source(e)
        })
    }

    async fn list_directory(&self, path: &str) -> StorageResult<Vec<String>> {
        const MESSAGE_ID: &str = "storage.list_directory.local";

        let dir = self.resolve(
            path,
            ErrorKind::ListError,
            Operation::ListDirectory,
            MESSAGE_ID,
        )?;
        let list_error = |e: io::Error| {
            StorageError::new(
                ErrorKind::ListError,
                Operation::ListDirectory,
                MESSAGE_ID,
                format!("unable to list {}", path),
            )
            .with_source(e)
        };

        let prefix = path.trim_matches('/');
        let mut entries = fs::read_dir(&dir).await.map_err(list_error)?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            if !entry.file_type().await.map_err(list_error)?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if prefix.is_empty() {
                paths.push(name);
            } else {
                paths.push(format!("{}/{}", prefix, name));
            }
        }

        paths.sort();
        info!("Listed path={}, found count={} directories", dir.display(), paths.len());
        Ok(paths)
    }

    async fn remove_directory(&self, path: &str) -> StorageResult<()> {
        const MESSAGE_ID: &str = "storage.remove_directory.local";

        let dir = self.resolve(
            path,
            ErrorKind::RemoveError,
            Operation::RemoveDirectory,
            MESSAGE_ID,
        )?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(
                ErrorKind::RemoveError,
                Operation::RemoveDirectory,
                MESSAGE_ID,
                format!("unable to remove {}", path),
            )
            .with_source(e)),
        }
    }
}
