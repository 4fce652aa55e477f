//! The acquire/release seam between handles and the OS resource.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Channel, FileError, Mode};

/// Acquisition and release of shared channels, keyed by path.
///
/// This trait is the one seam where cross-handle sharing happens. Two
/// handles opened for the same path must end up referencing the same
/// [`Channel`], because some platforms tie advisory locks and memory maps
/// to process-wide descriptor identity; independent opens of one path from
/// different components can silently invalidate each other's state.
///
/// Implementations must tolerate concurrent acquisition and release from
/// many handles — this is the only shared mutable state in the design.
///
/// # Contract
///
/// - `acquire` increments a per-path share count and returns a reference
///   to the (possibly already open) channel.
/// - `release` decrements the share count; the underlying OS resource is
///   closed only when the count for the path reaches zero. Safe to call
///   with the last outstanding reference.
/// - Every successful `acquire` must be matched by exactly one `release`.
///   [`FileHandle`](crate::FileHandle) performs the release in `close`.
///
/// # Object Safety
///
/// This trait is object-safe; handles hold `Arc<dyn ChannelManager>`.
pub trait ChannelManager: Send + Sync {
    /// Obtain a reference to a shared channel for `path` opened in `mode`.
    ///
    /// If the path is already open, the existing channel is returned and
    /// its share count incremented; the mode of the first acquisition
    /// wins for the lifetime of the entry.
    ///
    /// # Errors
    ///
    /// - [`FileError::Acquire`] if the platform open fails (permission,
    ///   missing parent directory, exhausted OS handles).
    fn acquire(&self, path: &Path, mode: Mode) -> Result<Arc<Channel>, FileError>;

    /// Return one reference for the channel's path.
    ///
    /// When the last reference is returned the manager forgets the entry
    /// and the OS resource is closed as the final `Arc<Channel>` drops.
    /// Close-time platform errors are best-effort: the caller wanting
    /// durability must sync before releasing.
    fn release(&self, channel: &Arc<Channel>);
}

/// Reference-counting [`ChannelManager`] over `std::fs`.
///
/// Keeps a mutex-guarded map from path to open channel and share count.
/// Paths are compared as given; callers sharing a file must address it by
/// a consistent path (canonicalize first if in doubt).
#[derive(Debug, Default)]
pub struct StdChannelManager {
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

#[derive(Debug)]
struct Entry {
    channel: Arc<Channel>,
    refs: usize,
}

impl StdChannelManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding acquisitions for `path`; 0 once the path is
    /// fully released (or was never acquired).
    pub fn open_count(&self, path: &Path) -> usize {
        self.lock_entries().get(path).map_or(0, |entry| entry.refs)
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChannelManager for StdChannelManager {
    fn acquire(&self, path: &Path, mode: Mode) -> Result<Arc<Channel>, FileError> {
        let mut entries = self.lock_entries();
        if let Some(entry) = entries.get_mut(path) {
            entry.refs += 1;
            log_event!("acquire (shared, refs={}): {}", entry.refs, path.display());
            return Ok(Arc::clone(&entry.channel));
        }

        let channel = Channel::open(path, mode).map_err(|source| FileError::Acquire {
            path: path.to_path_buf(),
            source,
        })?;
        let channel = Arc::new(channel);
        entries.insert(
            path.to_path_buf(),
            Entry {
                channel: Arc::clone(&channel),
                refs: 1,
            },
        );
        log_event!("acquire (opened): {}", path.display());
        Ok(channel)
    }

    fn release(&self, channel: &Arc<Channel>) {
        let mut entries = self.lock_entries();
        let Some(entry) = entries.get_mut(channel.path()) else {
            // Unmanaged channel or path already fully released.
            log_event!("release of untracked channel: {}", channel.path().display());
            return;
        };
        entry.refs -= 1;
        log_event!("release (refs={}): {}", entry.refs, channel.path().display());
        if entry.refs == 0 {
            // The OS resource closes once the caller drops its reference.
            entries.remove(channel.path());
        }
    }
}
