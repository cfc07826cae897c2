//! # Trove Storage
//!
//! Keyed blob storage backends for Trove.
//!
//! This crate provides the lowest-level persistence abstraction for the
//! engine. Backends are **opaque keyed byte stores** - they read, write,
//! and remove whole values by key and do not interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Backends store whole values per key (read, write, remove, keys)
//! - No knowledge of collections, records, or queue entries
//! - Must be `Send + Sync` for shared access from the store and the queue
//! - A write either fully replaces a key's value or fails
//!
//! ## Available Backends
//!
//! - [`MemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - Persistent storage, one file per key in a locked
//!   directory
//!
//! ## Example
//!
//! ```rust
//! use trove_storage::{MemoryBackend, StorageBackend};
//!
//! let backend = MemoryBackend::new();
//! backend.write("items", b"[]").unwrap();
//! assert_eq!(backend.read("items").unwrap(), Some(b"[]".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
