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

use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use thiserror::Error;

use super::object::client::ClientError;

/// Boxed error used as the underlying cause of a [`StorageError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Public operation a [`StorageError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    TestConnection,
    ReadFile,
    WriteFile,
    MoveFile,
    RemoveFile,
    ListDirectory,
    RemoveDirectory,
}

impl Operation {
    /// Stable name of the operation, as reported in errors and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TestConnection => "TestConnection",
            Operation::ReadFile => "ReadFile",
            Operation::WriteFile => "WriteFile",
            Operation::MoveFile => "MoveFile",
            Operation::RemoveFile => "RemoveFile",
            Operation::ListDirectory => "ListDirectory",
            Operation::RemoveDirectory => "RemoveDirectory",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Classification of storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No driver, or an unrecognized one, is configured. Not retryable.
    DriverNotConfigured,
    /// The backend client could not be constructed or reached.
    ConnectionError,
    ReadError,
    WriteError,
    MoveError,
    RemoveError,
    ListError,
    /// Object move copied the data but could not delete the source; both paths exist.
    PartialMoveError,
    /// Directory removal stopped at a failed key; earlier deletions are not rolled back.
    BulkDeletePartialFailure,
}

impl ErrorKind {
    /// HTTP-like status code for callers that map errors onto transport responses.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::DriverNotConfigured => 501,
            _ => 500,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ErrorKind::DriverNotConfigured => "driver not configured",
            ErrorKind::ConnectionError => "connection error",
            ErrorKind::ReadError => "read error",
            ErrorKind::WriteError => "write error",
            ErrorKind::MoveError => "move error",
            ErrorKind::RemoveError => "remove error",
            ErrorKind::ListError => "list error",
            ErrorKind::PartialMoveError => "partial move",
            ErrorKind::BulkDeletePartialFailure => "bulk delete stopped",
        };
        f.write_str(name)
    }
}

/// Errors returned by every storage operation.
///
/// Backend specific failures (`std::io::Error`, object client errors) are wrapped here
/// and kept reachable through [`std::error::Error::source`].
#[derive(Error, Debug)]
#[error("{operation} failed ({kind}): {detail}")]
pub struct StorageError {
    kind: ErrorKind,
    operation: Operation,
    message_id: &'static str,
    detail: String,
    #[source]
    source: Option<BoxError>,
}

impl StorageError {
    /// Create an error without an underlying cause.
    ///
    /// # Arguments
    ///
    /// * `kind` - Failure classification
    /// * `operation` - Public operation that failed
    /// * `message_id` - Machine-readable key used for localization upstream
    /// * `detail` - Human-readable description
    pub fn new(
        kind: ErrorKind,
        operation: Operation,
        message_id: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operation,
            message_id,
            detail: detail.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Error returned when no usable driver is configured.
    pub fn not_configured(operation: Operation, message_id: &'static str) -> Self {
        Self::new(
            ErrorKind::DriverNotConfigured,
            operation,
            message_id,
            "no file driver selected",
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn message_id(&self) -> &'static str {
        self.message_id
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Only connection failures may be transient; everything else needs caller attention.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::ConnectionError
    }

    /// Whether the failure was caused by a missing file or object.
    pub fn is_not_found(&self) -> bool {
        let mut current = self
            .source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static));

        while let Some(err) = current {
            if let Some(io_err) = err.downcast_ref::<io::Error>() {
                if io_err.kind() == io::ErrorKind::NotFound {
                    return true;
                }
            }
            if let Some(ClientError::NotFound(_)) = err.downcast_ref::<ClientError>() {
                return true;
            }
            current = err.source();
        }

        false
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
