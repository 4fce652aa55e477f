//! Error types for file channel acquisition and handle operations.

use std::path::PathBuf;

/// Error type for channel acquisition and handle operations.
///
/// Every variant carries the path involved, and variants wrapping a
/// platform failure carry the original `std::io::Error` as their source.
/// Uses `#[non_exhaustive]` for forward compatibility.
///
/// The variants form a small severity ladder:
///
/// - [`FileError::Acquire`] — no handle was produced at all.
/// - [`FileError::Io`] — an operation against an acquired channel failed.
/// - [`FileError::Sync`] — a durability barrier failed; more severe than
///   plain I/O because callers depending on sync for crash consistency
///   must not silently proceed.
/// - [`FileError::Closed`] — a programmer error, not an environmental
///   failure: the handle was used after close. Never retried.
///
/// # Examples
///
/// ```rust
/// use chanfile::FileError;
/// use std::path::PathBuf;
///
/// let err = FileError::Closed {
///     operation: "size",
///     path: PathBuf::from("/data/journal.log"),
/// };
/// assert!(err.to_string().contains("/data/journal.log"));
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The manager could not obtain a channel for a path and mode
    /// (permission, missing parent directory, exhausted OS handles).
    #[error("acquire failed for {path}: {source}")]
    Acquire {
        /// The path that could not be acquired.
        path: PathBuf,
        /// The underlying platform error.
        #[source]
        source: std::io::Error,
    },

    /// A size or truncate operation failed against an already-acquired
    /// channel (device error, storage removed underneath the handle).
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying platform error.
        #[source]
        source: std::io::Error,
    },

    /// A durability barrier could not be honored.
    ///
    /// Kept distinct from [`FileError::Io`] so callers can decide whether
    /// to retry or abort durability-dependent work (e.g., marking a
    /// write-ahead log segment unverified).
    #[error("sync failed for {path}: {source}")]
    Sync {
        /// The path whose data could not be forced to storage.
        path: PathBuf,
        /// The underlying platform error.
        #[source]
        source: std::io::Error,
    },

    /// An operation other than `close` was invoked on a closed handle.
    #[error("{operation}: handle already closed: {path}")]
    Closed {
        /// The operation that was attempted.
        operation: &'static str,
        /// The path of the closed handle.
        path: PathBuf,
    },
}

impl FileError {
    /// The path the failing operation was addressed to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileError::Acquire { path, .. }
            | FileError::Io { path, .. }
            | FileError::Sync { path, .. }
            | FileError::Closed { path, .. } => path,
        }
    }
}
