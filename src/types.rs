//! Core types for channel acquisition and handle diagnostics.

use std::fs::OpenOptions;
use std::sync::atomic::{AtomicU64, Ordering};

/// Access mode for an acquired channel.
///
/// Read-write is the default and the mode storage engines use in practice;
/// read-only is a configuration option for consumers that only inspect
/// existing files, not a separate behavioral branch in the handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Read and write access. The file is created if it does not exist.
    #[default]
    ReadWrite,
    /// Read-only access. The file must already exist.
    ReadOnly,
}

impl Mode {
    /// Returns `true` if this mode permits writing.
    #[inline]
    pub const fn is_writable(self) -> bool {
        matches!(self, Mode::ReadWrite)
    }

    pub(crate) fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            Mode::ReadWrite => {
                options.read(true).write(true).create(true);
            }
            Mode::ReadOnly => {
                options.read(true);
            }
        }
        options
    }
}

/// Injectable counter for diagnostic handle identifiers.
///
/// Handles carry an id only for log correlation; it has no bearing on
/// correctness. Rather than a hidden process-wide counter, consumers that
/// want per-handle ids own one of these and tag handles explicitly:
///
/// ```rust,no_run
/// use chanfile::{FileHandle, InstanceCounter, Mode, StdChannelManager};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), chanfile::FileError> {
/// let ids = InstanceCounter::new();
/// let manager = Arc::new(StdChannelManager::new());
/// let handle = FileHandle::open(manager, "/tmp/a.dat", Mode::ReadWrite)?
///     .with_id(ids.next());
/// assert_eq!(handle.id(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InstanceCounter(AtomicU64);

impl InstanceCounter {
    /// Create a counter whose first [`next`](InstanceCounter::next) is 1.
    ///
    /// Id 0 is reserved to mean "untagged".
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Return the next id, monotonically increasing per counter.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for InstanceCounter {
    fn default() -> Self {
        Self::new()
    }
}
