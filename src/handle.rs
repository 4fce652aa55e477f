//! The closeable file handle.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{Channel, ChannelManager, FileError, Mode};

/// Who returns the channel reference when the handle closes.
enum Lifecycle {
    /// Acquired through a manager; close calls its `release`.
    Managed(Arc<dyn ChannelManager>),
    /// Built around a channel obtained out-of-band; close only drops this
    /// handle's reference.
    Unmanaged,
}

/// A single-owner, closeable handle over one shared channel reference.
///
/// The handle is the single point of truth for "is this file resource
/// usable right now". Every operation against the underlying file is
/// translated into either a successful result or a [`FileError`]; raw
/// `std::io::Error`s never leak to callers without path and operation
/// context.
///
/// # States
///
/// `Open` from construction until [`close`](FileHandle::close), then
/// `Closed` permanently. On a closed handle only `close` (a no-op) and the
/// [`is_open`](FileHandle::is_open)/[`is_closed`](FileHandle::is_closed)
/// queries are permitted; `size`, `truncate`, and `sync` fail with
/// [`FileError::Closed`].
///
/// # Sharing
///
/// The channel reference may be shared with other handles for the same
/// path; that sharing is mediated entirely by the [`ChannelManager`] and
/// is opaque here. Closing this handle never invalidates another handle's
/// channel.
///
/// # Durability
///
/// [`close`](FileHandle::close) does not sync. Callers needing written
/// data to survive a crash must call [`sync`](FileHandle::sync) first.
///
/// # Thread Safety
///
/// A `FileHandle` is meant to have one logical owner. It provides no
/// internal locking over its own open/closed transition; coordinate
/// externally before sharing one instance across threads.
pub struct FileHandle {
    path: PathBuf,
    channel: Option<Arc<Channel>>,
    lifecycle: Lifecycle,
    id: u64,
}

impl FileHandle {
    /// Open a handle for `path` in `mode`, acquiring the channel reference
    /// through `manager`.
    ///
    /// # Errors
    ///
    /// - [`FileError::Acquire`] if `path` is empty or the manager cannot
    ///   obtain a channel. No partially constructed handle is observable.
    pub fn open(
        manager: Arc<dyn ChannelManager>,
        path: impl AsRef<Path>,
        mode: Mode,
    ) -> Result<Self, FileError> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(FileError::Acquire {
                path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty path"),
            });
        }
        let channel = manager.acquire(&path, mode)?;
        log_event!("open: {}", path.display());
        Ok(Self {
            path,
            channel: Some(channel),
            lifecycle: Lifecycle::Managed(manager),
            id: 0,
        })
    }

    /// Wrap an already-acquired channel.
    ///
    /// For trusted integration points that obtained the channel
    /// out-of-band. The handle follows the same close protocol but never
    /// calls a manager: close drops this handle's reference, and the OS
    /// resource closes when the last reference anywhere is dropped.
    pub fn open_unmanaged(path: impl AsRef<Path>, channel: Arc<Channel>) -> Self {
        let path = path.as_ref().to_path_buf();
        debug_assert!(!path.as_os_str().is_empty());
        Self {
            path,
            channel: Some(channel),
            lifecycle: Lifecycle::Unmanaged,
            id: 0,
        }
    }

    /// Tag this handle with a diagnostic correlation id.
    ///
    /// See [`InstanceCounter`](crate::InstanceCounter). Ids only appear in
    /// log events; 0 (the default) means untagged.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// The diagnostic correlation id, 0 if untagged.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The path this handle was opened under. Never empty.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The shared channel, or `None` once closed.
    ///
    /// Collaborators that read or write through the same descriptor clone
    /// the `Arc` from here.
    #[inline]
    pub fn channel(&self) -> Option<&Arc<Channel>> {
        self.channel.as_ref()
    }

    /// Current byte length of the underlying file.
    ///
    /// # Errors
    ///
    /// - [`FileError::Closed`] if the handle is closed.
    /// - [`FileError::Io`] if the channel cannot report its size (e.g.,
    ///   underlying storage removed).
    pub fn size(&self) -> Result<u64, FileError> {
        let channel = self.channel_for("size")?;
        channel.size().map_err(|source| FileError::Io {
            operation: "size",
            path: self.path.clone(),
            source,
        })
    }

    /// Set the file length to exactly `new_len`, discarding bytes beyond
    /// it.
    ///
    /// Extending a file this way leaves the new bytes' content
    /// platform-defined; do not rely on truncate for zero-filled growth.
    /// The call always reaches the channel, even when the length is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`FileError::Closed`] if the handle is closed.
    /// - [`FileError::Io`] on platform failure.
    pub fn truncate(&self, new_len: u64) -> Result<(), FileError> {
        let channel = self.channel_for("truncate")?;
        log_event!("truncate [{}] to {}: {}", self.id, new_len, self.path.display());
        channel.truncate(new_len).map_err(|source| FileError::Io {
            operation: "truncate",
            path: self.path.clone(),
            source,
        })
    }

    /// Durability barrier: force all previously written data to stable
    /// storage before returning.
    ///
    /// Data only — metadata durability (timestamps) is not guaranteed.
    ///
    /// # Errors
    ///
    /// - [`FileError::Closed`] if the handle is closed.
    /// - [`FileError::Sync`] if the barrier fails. Callers depending on
    ///   sync for crash consistency must treat this as requiring a
    ///   recovery decision, not as an ordinary I/O error.
    pub fn sync(&self) -> Result<(), FileError> {
        let channel = self.channel_for("sync")?;
        log_event!("sync [{}]: {}", self.id, self.path.display());
        channel.sync().map_err(|source| FileError::Sync {
            path: self.path.clone(),
            source,
        })
    }

    /// `true` once the channel reference has been released.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.channel.is_none()
    }

    /// `true` from construction until [`close`](FileHandle::close).
    #[inline]
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Release this handle's channel reference and mark the handle closed.
    ///
    /// Idempotent: closing an already-closed handle is a safe no-op.
    /// Does not sync. Close-time platform errors are best-effort — the
    /// final OS close happens when the last reference for the path drops,
    /// and any error there is not surfaced.
    pub fn close(&mut self) {
        let Some(channel) = self.channel.take() else {
            return;
        };
        log_event!("close [{}]: {}", self.id, self.path.display());
        if let Lifecycle::Managed(manager) = &self.lifecycle {
            manager.release(&channel);
        }
    }

    fn channel_for(&self, operation: &'static str) -> Result<&Channel, FileError> {
        match &self.channel {
            Some(channel) => Ok(channel),
            None => Err(FileError::Closed {
                operation,
                path: self.path.clone(),
            }),
        }
    }
}

/// Dropping an open handle releases its reference, keeping acquisitions
/// and releases balanced even on early-exit paths.
impl Drop for FileHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake manager that counts acquisitions and releases, backed by real
    /// temp files so handle operations still work.
    struct CountingManager {
        acquires: AtomicUsize,
        releases: AtomicUsize,
    }

    impl CountingManager {
        fn new() -> Self {
            Self {
                acquires: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            }
        }
    }

    impl ChannelManager for CountingManager {
        fn acquire(&self, path: &Path, mode: Mode) -> Result<Arc<Channel>, FileError> {
            let channel = Channel::open(path, mode).map_err(|source| FileError::Acquire {
                path: path.to_path_buf(),
                source,
            })?;
            self.acquires.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(channel))
        }

        fn release(&self, _channel: &Arc<Channel>) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn open_in(
        dir: &tempfile::TempDir,
        name: &str,
        manager: &Arc<CountingManager>,
    ) -> FileHandle {
        let manager: Arc<dyn ChannelManager> = Arc::clone(manager) as Arc<dyn ChannelManager>;
        FileHandle::open(manager, dir.path().join(name), Mode::ReadWrite).unwrap()
    }

    #[test]
    fn open_acquires_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        let handle = open_in(&dir, "a.dat", &manager);
        assert!(handle.is_open());
        assert_eq!(manager.acquires.load(Ordering::SeqCst), 1);
        assert_eq!(manager.releases.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn close_releases_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        let mut handle = open_in(&dir, "a.dat", &manager);

        handle.close();
        assert!(handle.is_closed());
        assert_eq!(manager.releases.load(Ordering::SeqCst), 1);

        // Second close is a no-op, not a second release.
        handle.close();
        assert!(handle.is_closed());
        assert_eq!(manager.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_without_close_still_releases() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        {
            let _handle = open_in(&dir, "a.dat", &manager);
        }
        assert_eq!(manager.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_after_close_does_not_release_again() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        {
            let mut handle = open_in(&dir, "a.dat", &manager);
            handle.close();
        }
        assert_eq!(manager.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_path_is_rejected_before_acquisition() {
        let manager = Arc::new(CountingManager::new());
        let result = FileHandle::open(Arc::clone(&manager) as Arc<dyn ChannelManager>, "", Mode::ReadWrite);
        assert!(matches!(result, Err(FileError::Acquire { .. })));
        assert_eq!(manager.acquires.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_open_produces_no_handle_and_no_release() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        let result = FileHandle::open(
            Arc::clone(&manager) as Arc<dyn ChannelManager>,
            dir.path().join("no/such/dir/f.dat"),
            Mode::ReadWrite,
        );
        assert!(matches!(result, Err(FileError::Acquire { .. })));
        assert_eq!(manager.releases.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn operations_on_closed_handle_fail_with_closed() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        let mut handle = open_in(&dir, "a.dat", &manager);
        handle.close();

        for (result, operation) in [
            (handle.size().map(|_| ()), "size"),
            (handle.truncate(0), "truncate"),
            (handle.sync(), "sync"),
        ] {
            match result {
                Err(FileError::Closed { operation: op, .. }) => assert_eq!(op, operation),
                other => panic!("{operation} on closed handle returned {other:?}"),
            }
        }
    }

    #[test]
    fn unmanaged_close_never_calls_manager() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("u.dat");
        let channel = Arc::new(Channel::open(&path, Mode::ReadWrite).unwrap());

        let mut handle = FileHandle::open_unmanaged(&path, Arc::clone(&channel));
        assert_eq!(handle.size().unwrap(), 0);
        handle.close();
        assert!(handle.is_closed());

        // The out-of-band owner's reference is still valid.
        assert_eq!(channel.size().unwrap(), 0);
    }

    #[test]
    fn with_id_tags_the_handle() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        let handle = open_in(&dir, "a.dat", &manager).with_id(7);
        assert_eq!(handle.id(), 7);
    }

    #[test]
    fn path_is_preserved_across_close() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        let path = dir.path().join("a.dat");
        let mut handle = open_in(&dir, "a.dat", &manager);
        handle.close();
        assert_eq!(handle.path(), path);
    }

    #[test]
    fn debug_reports_state() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(CountingManager::new());
        let mut handle = open_in(&dir, "a.dat", &manager);
        assert!(format!("{handle:?}").contains("open: true"));
        handle.close();
        assert!(format!("{handle:?}").contains("open: false"));
    }
}
