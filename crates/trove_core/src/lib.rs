//! # Trove Core
//!
//! Data model, local store, and offline queue for Trove.
//!
//! This crate provides the durable, local half of the offline-first engine:
//!
//! - The lost-and-found data model ([`Item`], [`Category`], [`User`]) with
//!   per-item [`Origin`] and [`SyncStatus`] tags
//! - [`LocalStore`] - named JSON document collections with write-through
//!   durability, field-level last-write-wins upsert, and case-insensitive
//!   search
//! - [`OfflineQueue`] - a persisted FIFO of pending mutation intents
//! - [`TimeSource`] - an injectable clock so retry gates and timestamps are
//!   deterministic under test
//!
//! ## Key Invariants
//!
//! - Every store operation is durable before it returns (write-through,
//!   no write-behind); a persistence failure surfaces as a fatal error with
//!   no partial write
//! - Every `Pending`/`Failed` item has a corresponding queue entry until a
//!   successful drain transitions it to `Synced`
//! - Queue order is FIFO; requeued entries go to the back
//! - Queue entry ids are strictly increasing, even within one millisecond
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trove_core::{Item, ItemDraft, ItemStatus, LocalStore};
//! use trove_storage::MemoryBackend;
//!
//! let store = LocalStore::open(Arc::new(MemoryBackend::new())).unwrap();
//! let draft = ItemDraft::new("Blue Backpack", "Nylon, 20L", ItemStatus::Found, "Gym", 2);
//! store.put_item(&Item::from_draft(&draft, 1, 1000)).unwrap();
//!
//! let found = store.search_items("backpack").unwrap();
//! assert_eq!(found.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod item;
mod queue;
mod store;
mod time;

pub use error::{CoreError, CoreResult};
pub use item::{
    Category, Item, ItemDraft, ItemPatch, ItemStatus, Origin, RemoteItem, SyncStatus, User,
};
pub use queue::{OfflineQueue, QueueAction, QueueEntry};
pub use store::{Collection, LocalStore, StoreStats};
pub use time::{ManualTime, SystemTimeSource, TimeSource};

/// Identifier for an item (locally- or remotely-assigned).
pub type ItemId = i64;
/// Identifier for a category.
pub type CategoryId = i64;
/// Identifier for a user.
pub type UserId = i64;
/// Milliseconds since the Unix epoch.
pub type TimestampMs = i64;
