//! # chanfile
//!
//! Reference-counted file channel sharing and closeable file handles for
//! disk-backed storage engines.
//!
//! This crate provides the lowest layer a storage engine (page files,
//! journals, B+Tree node files) builds on: a uniform, synchronizable,
//! closeable handle over an open file, with the actual opening and sharing
//! of the underlying OS resource delegated to a channel manager.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chanfile::{FileHandle, Mode, StdChannelManager};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), chanfile::FileError> {
//!     let manager = Arc::new(StdChannelManager::new());
//!
//!     let mut handle = FileHandle::open(manager, "/tmp/test.dat", Mode::ReadWrite)?;
//!     assert_eq!(handle.size()?, 0);
//!
//!     handle.truncate(0)?;
//!     handle.sync()?; // durability barrier
//!     handle.close(); // idempotent
//!     assert!(handle.is_closed());
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FileHandle`] | Closeable handle — size, truncate, sync, close |
//! | [`Channel`] | An open file plus its path, shared between owners |
//! | [`ChannelManager`] | Acquire/release seam — path to shared channel |
//! | [`StdChannelManager`] | Reference-counting manager over `std::fs` |
//! | [`FileError`] | Error type with path and cause context |
//! | [`Mode`] | Access mode for acquisition (read-write default) |
//!
//! ---
//!
//! ## Why a manager seam?
//!
//! Some platforms tie advisory locks and memory-mapped regions to
//! process-wide descriptor identity: two components independently opening
//! and closing the same path can silently invalidate each other's state.
//! A [`FileHandle`] therefore never opens or closes the OS resource
//! directly. It acquires a reference to a possibly shared [`Channel`] from
//! a [`ChannelManager`] and returns that reference on close; the manager
//! closes the underlying file only when the last reference for the path is
//! released.
//!
//! ---
//!
//! ## Lifecycle
//!
//! A handle has exactly two states, `Open` and `Closed`, and one
//! transition between them. Once closed, only [`FileHandle::close`] (a
//! no-op) and the [`FileHandle::is_closed`]/[`FileHandle::is_open`]
//! queries are permitted; everything else fails with
//! [`FileError::Closed`]. Dropping an open handle releases its channel
//! reference, but callers needing durability must call
//! [`FileHandle::sync`] first — close never syncs.
//!
//! ---
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, FileError>`. Errors carry the
//! path and the underlying `std::io::Error`:
//!
//! ```rust
//! use chanfile::FileError;
//! use std::path::PathBuf;
//!
//! let err = FileError::Closed {
//!     operation: "truncate",
//!     path: PathBuf::from("/data/pages.dat"),
//! };
//! assert_eq!(err.to_string(), "truncate: handle already closed: /data/pages.dat");
//! ```
//!
//! Sync failures get their own variant, [`FileError::Sync`], because a
//! failed durability barrier is more severe than an ordinary I/O error:
//! callers relying on sync for crash consistency must not silently
//! proceed.
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`ChannelManager`] implementations must be `Send + Sync`; acquisition
//! and release may race from many handles. A single [`FileHandle`] is a
//! single-owner object: it provides no internal locking over its own
//! open/closed transition, and `close` takes `&mut self`.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `log` | Emit open/truncate/sync/close events via the `log` crate |

#[cfg(feature = "log")]
macro_rules! log_event {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_event {
    ($($arg:tt)*) => {};
}

// Private modules
mod channel;
mod error;
mod handle;
mod manager;
mod types;

// Public re-exports - error types
pub use error::FileError;

// Public re-exports - core types
pub use channel::Channel;
pub use handle::FileHandle;
pub use types::{InstanceCounter, Mode};

// Public re-exports - the acquire/release seam
pub use manager::{ChannelManager, StdChannelManager};
