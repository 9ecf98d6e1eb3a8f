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

use futures::future::BoxFuture;
use std::io;
use std::path::Path;
use tokio::fs::{self, File};
use tracing::debug;

/// Copy a single file, replacing `dst` if it exists.
///
/// The data is synced to disk and the permissions of `src` are applied to `dst`.
///
/// # Returns
///
/// The number of bytes copied.
///
/// # Errors
///
/// Any I/O error opening, copying, syncing or re-permissioning the files.
pub async fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<u64> {
    let (src, dst) = (src.as_ref(), dst.as_ref());

    let mut input = File::open(src).await?;
    let mut output = File::create(dst).await?;
    let copied = tokio::io::copy(&mut input, &mut output).await?;
    output.sync_all().await?;

    let permissions = fs::metadata(src).await?.permissions();
    fs::set_permissions(dst, permissions).await?;

    Ok(copied)
}

/// Recursively copy the directory `src` to `dst`.
///
/// `src` must be a directory and `dst` must not exist. Permissions are preserved and
/// symbolic links are skipped.
///
/// # Errors
///
/// * `InvalidInput` - `src` is not a directory
/// * `AlreadyExists` - `dst` already exists
/// * Any I/O error while reading `src` or writing `dst`; a partial copy is left in place
pub fn copy_dir<'a>(src: &'a Path, dst: &'a Path) -> BoxFuture<'a, io::Result<()>> {
    Box::pin(async move {
        let src_meta = fs::metadata(src).await?;
        if !src_meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("source must be a directory: {}", src.display()),
            ));
        }

        match fs::symlink_metadata(dst).await {
            Ok(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("destination already exists: {}", dst.display()),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        fs::create_dir_all(dst).await?;

        let mut entries = fs::read_dir(src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());

            if file_type.is_dir() {
                copy_dir(&src_path, &dst_path).await?;
            } else if file_type.is_symlink() {
                debug!("Skipping symlink path={}", src_path.display());
            } else {
                copy_file(&src_path, &dst_path).await?;
            }
        }

        // Applied last so a read-only source does not block filling the copy.
        fs::set_permissions(dst, src_meta.permissions()).await?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_tree(root: &Path) {
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("top.txt"), b"top").unwrap();
        std::fs::write(root.join("a/one.txt"), b"one").unwrap();
        std::fs::write(root.join("a/b/two.txt"), b"two").unwrap();
    }

    #[tokio::test]
    async fn test_copy_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("dst.txt");
        std::fs::write(&src, b"payload").unwrap();
        std::fs::write(&dst, b"old contents that are longer").unwrap();

        let copied = copy_file(&src, &dst).await.unwrap();

        assert_eq!(copied, 7);
        assert_eq!(std::fs::read(&dst).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_copy_dir_nested_tree() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        build_tree(&src);

        copy_dir(&src, &dst).await.unwrap();

        assert_eq!(std::fs::read(dst.join("top.txt")).unwrap(), b"top");
        assert_eq!(std::fs::read(dst.join("a/one.txt")).unwrap(), b"one");
        assert_eq!(std::fs::read(dst.join("a/b/two.txt")).unwrap(), b"two");
        assert!(dst.join("empty").is_dir());
        assert!(src.join("a/b/two.txt").is_file());
    }

    #[tokio::test]
    async fn test_copy_dir_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        build_tree(&src);
        std::fs::create_dir_all(&dst).unwrap();

        let err = copy_dir(&src, &dst).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(!dst.join("top.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_dir_requires_directory_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("file.txt");
        std::fs::write(&src, b"x").unwrap();

        let err = copy_dir(&src, &dir.path().join("dst")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err = copy_dir(&dir.path().join("missing"), &dir.path().join("dst2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_dir_skips_symlinks_and_keeps_permissions() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        build_tree(&src);
        symlink(src.join("top.txt"), src.join("link.txt")).unwrap();
        std::fs::set_permissions(src.join("a/one.txt"), std::fs::Permissions::from_mode(0o600))
            .unwrap();

        copy_dir(&src, &dst).await.unwrap();

        assert!(std::fs::symlink_metadata(dst.join("link.txt")).is_err());
        let mode = std::fs::metadata(dst.join("a/one.txt"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
