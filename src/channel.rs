//! The shared channel: an open file plus its path.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::Mode;

/// An open file together with the path it was opened under.
///
/// A `Channel` is the unit of sharing: a [`ChannelManager`] hands out
/// `Arc<Channel>` references, and several [`FileHandle`]s for the same path
/// may hold references to the same `Channel`. The underlying file is closed
/// when the last reference is dropped.
///
/// Operations here work at the descriptor level and return plain
/// `io::Result`; translating failures into [`FileError`] with path and
/// operation context is the handle's job.
///
/// [`ChannelManager`]: crate::ChannelManager
/// [`FileHandle`]: crate::FileHandle
/// [`FileError`]: crate::FileError
#[derive(Debug)]
pub struct Channel {
    path: PathBuf,
    file: File,
}

impl Channel {
    /// Open the file at `path` in the given mode.
    ///
    /// Normally called by a [`ChannelManager`](crate::ChannelManager)
    /// implementation, not by consumers directly.
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> io::Result<Self> {
        let path = path.as_ref();
        let file = mode.open_options().open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Wrap an already-open file.
    ///
    /// Used by integration points that obtained the file out-of-band, in
    /// combination with [`FileHandle::open_unmanaged`].
    ///
    /// [`FileHandle::open_unmanaged`]: crate::FileHandle::open_unmanaged
    pub fn from_file(path: impl AsRef<Path>, file: File) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file,
        }
    }

    /// The path this channel was opened under.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying open file.
    ///
    /// Exposed so collaborators sharing the channel (e.g., a block writer)
    /// can issue positioned reads and writes against the same descriptor.
    #[inline]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Current byte length of the file.
    pub fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Set the file length to exactly `new_len`.
    ///
    /// Bytes beyond `new_len` are discarded. If `new_len` exceeds the
    /// current length the file is extended; whether the new bytes read as
    /// zeroes is platform-defined and not masked here.
    pub fn truncate(&self, new_len: u64) -> io::Result<()> {
        self.file.set_len(new_len)
    }

    /// Force previously written data to durable storage.
    ///
    /// Data only: metadata such as the last-modified time is not made
    /// durable (`fdatasync` rather than `fsync`).
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_data()
    }
}
