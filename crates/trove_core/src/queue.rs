//! Persisted FIFO of pending mutation intents.
//!
//! The queue holds the intent to mutate the remote store while the device
//! is offline (or while the remote call fails). Entries are drained by the
//! sync coordinator in FIFO order and removed only after a confirmed remote
//! success; failures requeue to the back so a persistently-failing entry
//! cannot block newer ones.

use crate::error::CoreResult;
use crate::item::{ItemDraft, ItemPatch};
use crate::{ItemId, TimestampMs};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;
use trove_storage::StorageBackend;

const QUEUE_KEY: &str = "offline_queue";

/// A pending mutation intent.
///
/// Serialized adjacently (`"action"` tag plus `"data"` payload), the shape
/// the queue has always been persisted in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "lowercase")]
pub enum QueueAction {
    /// Create a new remote record from a draft. `local_id` is the
    /// optimistic local identity, replaced once the server assigns one.
    Create {
        /// The create payload.
        draft: ItemDraft,
        /// The locally-assigned id of the optimistic record.
        #[serde(rename = "localId")]
        local_id: ItemId,
    },
    /// Update the remote record with the given id.
    Update {
        /// Target record id.
        id: ItemId,
        /// The fields being changed.
        patch: ItemPatch,
    },
    /// Delete the remote record with the given id.
    Delete {
        /// Target record id.
        id: ItemId,
    },
}

impl QueueAction {
    /// The item id this action concerns (the local id for creates).
    #[must_use]
    pub fn item_id(&self) -> ItemId {
        match self {
            QueueAction::Create { local_id, .. } => *local_id,
            QueueAction::Update { id, .. } | QueueAction::Delete { id } => *id,
        }
    }

    /// Rewrites the target id (after a create's identity reassignment).
    fn retarget(&mut self, old: ItemId, new: ItemId) -> bool {
        match self {
            QueueAction::Update { id, .. } | QueueAction::Delete { id } if *id == old => {
                *id = new;
                true
            }
            _ => false,
        }
    }
}

/// One entry in the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Monotonically increasing entry id, assigned at enqueue.
    pub id: i64,
    /// The mutation intent.
    #[serde(flatten)]
    pub action: QueueAction,
    /// When the entry was enqueued (milliseconds since epoch).
    pub enqueued_at: TimestampMs,
    /// How many drain attempts have failed so far.
    pub retry_count: u32,
    /// Backoff gate: a drain pass defers this entry until the given time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<TimestampMs>,
}

impl QueueEntry {
    /// Returns true if the entry is eligible for a drain attempt at `now`.
    #[must_use]
    pub fn is_due(&self, now: TimestampMs) -> bool {
        self.not_before.is_none_or(|gate| gate <= now)
    }
}

/// Ordered log of pending mutation intents awaiting remote application.
///
/// # Invariants
///
/// - FIFO by queue position; [`snapshot`](Self::snapshot) returns entries
///   in that order and drains nothing itself
/// - An entry is removed only by [`remove`](Self::remove) (confirmed remote
///   success or retry-budget exhaustion); failures go back in via
///   [`requeue`](Self::requeue), at the back
/// - Entry ids are strictly increasing, even for same-millisecond enqueues
/// - Every mutation is persisted before it returns
/// - Length is unbounded (no backpressure) - a documented limitation
pub struct OfflineQueue {
    backend: Arc<dyn StorageBackend>,
    entries: RwLock<Vec<QueueEntry>>,
    last_id: AtomicI64,
}

impl OfflineQueue {
    /// Opens the queue over the given backend, reloading persisted entries
    /// so a restart resumes where the previous process stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or persisted entries do not
    /// parse.
    pub fn open(backend: Arc<dyn StorageBackend>) -> CoreResult<Self> {
        let entries: Vec<QueueEntry> = match backend.read(QUEUE_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };
        let last_id = entries.iter().map(|e| e.id).max().unwrap_or(0);

        Ok(Self {
            backend,
            entries: RwLock::new(entries),
            last_id: AtomicI64::new(last_id),
        })
    }

    fn persist(&self, entries: &[QueueEntry]) -> CoreResult<()> {
        let bytes = serde_json::to_vec(entries)?;
        self.backend.write(QUEUE_KEY, &bytes)?;
        Ok(())
    }

    fn next_id(&self, now: TimestampMs) -> i64 {
        self.last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .map(|last| now.max(last + 1))
            .unwrap_or(now)
    }

    /// Appends a new entry for the given action.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing was
    /// enqueued).
    pub fn enqueue(&self, action: QueueAction, now: TimestampMs) -> CoreResult<QueueEntry> {
        let entry = QueueEntry {
            id: self.next_id(now),
            action,
            enqueued_at: now,
            retry_count: 0,
            not_before: None,
        };

        let mut guard = self.entries.write();
        let mut entries = guard.clone();
        entries.push(entry.clone());
        self.persist(&entries)?;
        *guard = entries;

        debug!(entry_id = entry.id, "enqueued mutation intent");
        Ok(entry)
    }

    /// Returns the current entries in FIFO order without draining them.
    ///
    /// The coordinator borrows this snapshot for one drain pass; the queue
    /// itself is only changed through `remove`/`requeue`.
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.read().clone()
    }

    /// Removes the entry with the given id. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing
    /// changed).
    pub fn remove(&self, entry_id: i64) -> CoreResult<bool> {
        let mut guard = self.entries.write();
        if !guard.iter().any(|e| e.id == entry_id) {
            return Ok(false);
        }

        let entries: Vec<QueueEntry> = guard.iter().filter(|e| e.id != entry_id).cloned().collect();
        self.persist(&entries)?;
        *guard = entries;
        Ok(true)
    }

    /// Requeues a failed entry at the back with an incremented retry
    /// counter and an optional backoff gate.
    ///
    /// The entry keeps its id but loses its original position - requeued
    /// entries go to the back so persistently-failing entries cannot block
    /// newer ones indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing
    /// changed).
    pub fn requeue(
        &self,
        entry: QueueEntry,
        not_before: Option<TimestampMs>,
    ) -> CoreResult<QueueEntry> {
        let requeued = QueueEntry {
            retry_count: entry.retry_count + 1,
            not_before,
            ..entry
        };

        let mut guard = self.entries.write();
        let mut entries: Vec<QueueEntry> = guard
            .iter()
            .filter(|e| e.id != requeued.id)
            .cloned()
            .collect();
        entries.push(requeued.clone());
        self.persist(&entries)?;
        *guard = entries;

        debug!(
            entry_id = requeued.id,
            retry_count = requeued.retry_count,
            "requeued mutation intent"
        );
        Ok(requeued)
    }

    /// Rewrites queued update/delete targets from `old` to `new` after a
    /// create's identity reassignment. Returns how many entries changed.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing
    /// changed).
    pub fn retarget(&self, old: ItemId, new: ItemId) -> CoreResult<usize> {
        let mut guard = self.entries.write();
        let mut entries = guard.clone();

        let mut changed = 0;
        for entry in &mut entries {
            if entry.action.retarget(old, new) {
                changed += 1;
            }
        }
        if changed == 0 {
            return Ok(0);
        }

        self.persist(&entries)?;
        *guard = entries;
        debug!(old, new, changed, "retargeted queue entries");
        Ok(changed)
    }

    /// Number of entries currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no entries are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes all entries (full local-data clear).
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn clear(&self) -> CoreResult<()> {
        self.backend.remove(QUEUE_KEY)?;
        self.entries.write().clear();
        Ok(())
    }
}
