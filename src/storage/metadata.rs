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

//! Per-object metadata attached to uploads and copies.

use mime_guess::mime;
use std::collections::btree_map::Iter;
use std::collections::BTreeMap;
use std::path::Path;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const SERVER_SIDE_ENCRYPTION: &str = "x-amz-server-side-encryption";
pub const SSE_ALGORITHM: &str = "AES256";
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

/// Metadata entries handed to the object client on write and copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    entries: BTreeMap<String, String>,
}

impl ObjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    /// Requested server-side encryption algorithm, if any.
    pub fn server_side_encryption(&self) -> Option<&str> {
        self.get(SERVER_SIDE_ENCRYPTION)
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ObjectMetadata {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build the metadata for an upload.
///
/// # Arguments
///
/// * `encrypt` - Request server-side encryption
/// * `content_type` - MIME type of the object; ignored when empty
pub fn build_write_metadata(encrypt: bool, content_type: &str) -> ObjectMetadata {
    let mut metadata = ObjectMetadata::new();
    if !content_type.is_empty() {
        metadata.insert(CONTENT_TYPE, content_type);
    }
    if encrypt {
        metadata.insert(SERVER_SIDE_ENCRYPTION, SSE_ALGORITHM);
    }
    metadata
}

/// Build the metadata for a server-side copy.
///
/// The encryption marker is always set, whatever `encrypt` says. Unlike
/// [`build_write_metadata`], copies therefore always request encryption; callers relying
/// on unencrypted copies must not use this builder.
pub fn build_copy_metadata(_encrypt: bool) -> ObjectMetadata {
    let mut metadata = ObjectMetadata::new();
    metadata.insert(SERVER_SIDE_ENCRYPTION, SSE_ALGORITHM);
    metadata
}

/// Content type for an object path.
///
/// Only image extensions map to their MIME type; every other path is stored as
/// [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for_path(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .and_then(|ext| {
            mime_guess::from_ext(&ext)
                .iter()
                .find(|m| m.type_() == mime::IMAGE)
        })
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
