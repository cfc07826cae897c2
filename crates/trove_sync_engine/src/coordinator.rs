//! The sync coordinator state machine.
//!
//! The coordinator owns the engine's write path: every mutation is applied
//! to the local store first (the optimistic apply - the only effect
//! guaranteed to stick under total disconnection), then either confirmed
//! against the remote gateway or queued for a later drain pass.
//!
//! # State machine
//!
//! Per mutation: applied-local, then exactly one of
//!
//! - **synced** - the device was connected and the gateway call succeeded;
//!   the authoritative result is merged (for creates, the server id
//!   replaces the local id)
//! - **pending** - the device was disconnected; the intent is queued
//! - **failed** - the device looked connected but the gateway call failed;
//!   the intent is queued anyway (a transient remote failure is treated
//!   identically to disconnection)
//!
//! A drain pass replays queued intents in FIFO order, isolating per-entry
//! failures. Passes never run concurrently: a second trigger while one is
//! in flight is coalesced, not queued.

use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityMonitor, ConnectivityState};
use crate::error::{GatewayError, SyncError, SyncResult};
use crate::gateway::{ListFilters, RemoteGateway};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trove_core::{
    Collection, Item, ItemDraft, ItemId, ItemPatch, LocalStore, OfflineQueue, QueueAction,
    QueueEntry, SyncStatus, SystemTimeSource, TimeSource,
};

/// A mutation request from a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a new item.
    Create(ItemDraft),
    /// Partially update an existing item.
    Update(ItemId, ItemPatch),
    /// Delete an item.
    Delete(ItemId),
}

/// Outcome of a [`SyncCoordinator::mutate`] call.
///
/// The optimistic local apply always succeeded by the time an outcome is
/// returned; the variants describe how far the remote side got. `item` is
/// `None` for deletes.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Confirmed remotely; local state is authoritative.
    Synced {
        /// The stored item (with its server id, for creates).
        item: Option<Item>,
    },
    /// Device offline; the intent is queued.
    Pending {
        /// The optimistically stored item.
        item: Option<Item>,
        /// The queue entry holding the intent.
        entry_id: i64,
    },
    /// The remote call failed; the intent is queued.
    Failed {
        /// The optimistically stored item.
        item: Option<Item>,
        /// The queue entry holding the intent.
        entry_id: i64,
    },
}

impl MutationOutcome {
    /// The stored item, if the mutation produced one.
    #[must_use]
    pub fn item(&self) -> Option<&Item> {
        match self {
            MutationOutcome::Synced { item }
            | MutationOutcome::Pending { item, .. }
            | MutationOutcome::Failed { item, .. } => item.as_ref(),
        }
    }

    /// Returns true if the intent went into the offline queue.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        !matches!(self, MutationOutcome::Synced { .. })
    }
}

/// Outcome of a [`SyncCoordinator::trigger_sync`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// A drain pass ran to completion.
    Completed(DrainReport),
    /// The device is offline; nothing was attempted.
    Offline,
    /// Another pass is in flight; this trigger was coalesced.
    AlreadyRunning,
}

/// Counters for one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries whose gateway call was attempted.
    pub attempted: usize,
    /// Entries confirmed and removed.
    pub succeeded: usize,
    /// Entries that failed and were requeued.
    pub failed: usize,
    /// Entries that exhausted their retry budget and were dropped.
    pub abandoned: usize,
    /// Entries deferred by their backoff gate.
    pub deferred: usize,
    /// Entries still queued after the pass.
    pub remaining: usize,
}

/// Running totals across drain passes.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed drain passes.
    pub drains_completed: u64,
    /// Entries confirmed across all passes.
    pub entries_synced: u64,
    /// Entry failures (requeues) across all passes.
    pub entries_failed: u64,
    /// Entries abandoned across all passes.
    pub entries_abandoned: u64,
    /// Message of the most recent gateway failure, if any.
    pub last_error: Option<String>,
}

/// The authoritative effect of one successfully drained entry.
enum AppliedEntry {
    Created { local_id: ItemId, item: Item },
    Updated { item: Item },
    Deleted { id: ItemId },
}

/// Orchestrates optimistic local mutation, offline queueing, and drain
/// passes against the remote gateway.
///
/// All collaborators are injected at construction, so tests substitute an
/// in-memory store, a mock gateway, and a manual clock freely.
///
/// # Serialization
///
/// A single mutex serializes every store+queue read-modify-write (mutation
/// bodies, per-entry drain reconciliation). The lock is **not** held across
/// gateway calls - those are the suspension points where other mutations
/// may proceed. Identity reassignment after a confirmed create happens
/// inside one critical section, so no reader observes a server id alongside
/// a stale local-id queue entry.
pub struct SyncCoordinator<G: RemoteGateway> {
    config: SyncConfig,
    store: Arc<LocalStore>,
    queue: Arc<OfflineQueue>,
    gateway: Arc<G>,
    monitor: Arc<ConnectivityMonitor>,
    time: Arc<dyn TimeSource>,
    write_lock: Mutex<()>,
    draining: AtomicBool,
    stats: RwLock<SyncStats>,
}

impl<G: RemoteGateway> SyncCoordinator<G> {
    /// Creates a coordinator over injected collaborators, using the system
    /// clock.
    pub fn new(
        config: SyncConfig,
        store: Arc<LocalStore>,
        queue: Arc<OfflineQueue>,
        gateway: G,
        monitor: Arc<ConnectivityMonitor>,
    ) -> Self {
        Self {
            config,
            store,
            queue,
            gateway: Arc::new(gateway),
            monitor,
            time: Arc::new(SystemTimeSource),
            write_lock: Mutex::new(()),
            draining: AtomicBool::new(false),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Replaces the time source (tests use a manual clock).
    #[must_use]
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// The injected local store.
    #[must_use]
    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    /// The injected offline queue.
    #[must_use]
    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// The injected gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// The injected connectivity monitor.
    #[must_use]
    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    // ---- mutation path ----

    /// Applies a mutation: local store first (optimistic), then the remote
    /// gateway if connected, falling back to the offline queue.
    ///
    /// A mutation never fails because the remote side failed - the
    /// divergence is visible only through the item's sync status.
    ///
    /// # Errors
    ///
    /// Returns an error only for local persistence failures or an update
    /// targeting an unknown item.
    pub fn mutate(&self, mutation: Mutation) -> SyncResult<MutationOutcome> {
        match mutation {
            Mutation::Create(draft) => self.mutate_create(draft),
            Mutation::Update(id, patch) => self.mutate_update(id, patch),
            Mutation::Delete(id) => self.mutate_delete(id),
        }
    }

    fn mutate_create(&self, draft: ItemDraft) -> SyncResult<MutationOutcome> {
        let now = self.time.now_ms();
        let connected = self.monitor.current().connected;

        let (item, local_id, queued) = {
            let _guard = self.write_lock.lock();
            let local_id = self.store.next_local_id(now);
            let item = Item::from_draft(&draft, local_id, now);
            self.store.put_item(&item)?;

            if connected {
                (item, local_id, None)
            } else {
                let entry = self.queue.enqueue(
                    QueueAction::Create {
                        draft: draft.clone(),
                        local_id,
                    },
                    now,
                )?;
                (item, local_id, Some(entry.id))
            }
        };

        if let Some(entry_id) = queued {
            debug!(local_id, entry_id, "create queued while offline");
            return Ok(MutationOutcome::Pending {
                item: Some(item),
                entry_id,
            });
        }

        match self.gateway.create(&draft) {
            Ok(remote) => {
                let _guard = self.write_lock.lock();
                let confirmed = Item::from_remote(&remote);
                self.store.reassign_item_id(local_id, &confirmed)?;
                info!(local_id, server_id = confirmed.id, "create confirmed");
                Ok(MutationOutcome::Synced {
                    item: Some(confirmed),
                })
            }
            Err(err) => {
                warn!(local_id, error = %err, "create failed remotely, queueing");
                let _guard = self.write_lock.lock();
                let mut failed = item;
                failed.sync_status = SyncStatus::Failed;
                self.store.put_item(&failed)?;
                let entry = self
                    .queue
                    .enqueue(QueueAction::Create { draft, local_id }, now)?;
                self.note_error(&err);
                Ok(MutationOutcome::Failed {
                    item: Some(failed),
                    entry_id: entry.id,
                })
            }
        }
    }

    fn mutate_update(&self, id: ItemId, patch: ItemPatch) -> SyncResult<MutationOutcome> {
        let now = self.time.now_ms();
        let connected = self.monitor.current().connected;

        let (item, queued) = {
            let _guard = self.write_lock.lock();
            let mut item = self
                .store
                .item(id)?
                .ok_or(SyncError::UnknownItem { id })?;
            item.apply_patch(&patch, now);
            item.sync_status = SyncStatus::Pending;
            self.store.put_item(&item)?;

            if connected {
                (item, None)
            } else {
                let entry = self.queue.enqueue(
                    QueueAction::Update {
                        id,
                        patch: patch.clone(),
                    },
                    now,
                )?;
                (item, Some(entry.id))
            }
        };

        if let Some(entry_id) = queued {
            debug!(id, entry_id, "update queued while offline");
            return Ok(MutationOutcome::Pending {
                item: Some(item),
                entry_id,
            });
        }

        match self.gateway.update(id, &patch) {
            Ok(remote) => {
                let _guard = self.write_lock.lock();
                let confirmed = Item::from_remote(&remote);
                self.store.put_item(&confirmed)?;
                info!(id, "update confirmed");
                Ok(MutationOutcome::Synced {
                    item: Some(confirmed),
                })
            }
            Err(err) => {
                warn!(id, error = %err, "update failed remotely, queueing");
                let _guard = self.write_lock.lock();
                let mut failed = item;
                failed.sync_status = SyncStatus::Failed;
                self.store.put_item(&failed)?;
                let entry = self.queue.enqueue(QueueAction::Update { id, patch }, now)?;
                self.note_error(&err);
                Ok(MutationOutcome::Failed {
                    item: Some(failed),
                    entry_id: entry.id,
                })
            }
        }
    }

    fn mutate_delete(&self, id: ItemId) -> SyncResult<MutationOutcome> {
        let now = self.time.now_ms();
        let connected = self.monitor.current().connected;

        let queued = {
            let _guard = self.write_lock.lock();
            self.store.delete_item(id)?;

            if connected {
                None
            } else {
                let entry = self.queue.enqueue(QueueAction::Delete { id }, now)?;
                Some(entry.id)
            }
        };

        if let Some(entry_id) = queued {
            debug!(id, entry_id, "delete queued while offline");
            return Ok(MutationOutcome::Pending {
                item: None,
                entry_id,
            });
        }

        match self.gateway.delete(id) {
            Ok(()) => {
                info!(id, "delete confirmed");
                Ok(MutationOutcome::Synced { item: None })
            }
            Err(err) => {
                warn!(id, error = %err, "delete failed remotely, queueing");
                let _guard = self.write_lock.lock();
                let entry = self.queue.enqueue(QueueAction::Delete { id }, now)?;
                self.note_error(&err);
                Ok(MutationOutcome::Failed {
                    item: None,
                    entry_id: entry.id,
                })
            }
        }
    }

    // ---- drain path ----

    /// Runs a drain pass if the device is connected and no pass is already
    /// in flight (manual refresh / connectivity-regained trigger).
    ///
    /// # Errors
    ///
    /// Returns an error only for local persistence failures; gateway
    /// failures are absorbed into the report.
    pub fn trigger_sync(&self) -> SyncResult<DrainOutcome> {
        if !self.monitor.current().connected {
            debug!("drain skipped: offline");
            return Ok(DrainOutcome::Offline);
        }

        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("drain skipped: already running");
            return Ok(DrainOutcome::AlreadyRunning);
        }

        let result = self.drain_pass();
        self.draining.store(false, Ordering::SeqCst);
        result.map(DrainOutcome::Completed)
    }

    /// Feeds a raw platform network event to the monitor and drains once if
    /// it was a transition to connected. Returns `None` when no drain was
    /// due (no transition, or a transition to disconnected).
    ///
    /// # Errors
    ///
    /// Returns an error only for local persistence failures.
    pub fn handle_transition(&self, state: ConnectivityState) -> SyncResult<Option<DrainOutcome>> {
        let transitioned = self.monitor.update(state.clone());
        if transitioned && state.connected {
            self.trigger_sync().map(Some)
        } else {
            Ok(None)
        }
    }

    fn drain_pass(&self) -> SyncResult<DrainReport> {
        let now = self.time.now_ms();
        let snapshot = self.queue.snapshot();
        info!(entries = snapshot.len(), "drain pass started");

        let mut report = DrainReport::default();
        // Local ids reassigned earlier in this pass; later entries that
        // still reference them are rewritten before their gateway call.
        let mut id_map: HashMap<ItemId, ItemId> = HashMap::new();

        for mut entry in snapshot {
            match &mut entry.action {
                QueueAction::Update { id, .. } | QueueAction::Delete { id } => {
                    if let Some(new_id) = id_map.get(id) {
                        *id = *new_id;
                    }
                }
                QueueAction::Create { .. } => {}
            }

            if !entry.is_due(now) {
                report.deferred += 1;
                continue;
            }

            report.attempted += 1;
            match self.apply_entry(&entry) {
                Ok(applied) => {
                    let _guard = self.write_lock.lock();
                    match applied {
                        AppliedEntry::Created { local_id, item } => {
                            self.store.reassign_item_id(local_id, &item)?;
                            self.queue.retarget(local_id, item.id)?;
                            id_map.insert(local_id, item.id);
                        }
                        AppliedEntry::Updated { item } => {
                            self.store.put_item(&item)?;
                        }
                        AppliedEntry::Deleted { id } => {
                            self.store.delete_item(id)?;
                        }
                    }
                    self.queue.remove(entry.id)?;
                    report.succeeded += 1;
                }
                Err(err) => {
                    // Per-entry failure isolation: requeue (or abandon) and
                    // keep going
                    let _guard = self.write_lock.lock();
                    self.note_error(&err);
                    let next_retry = entry.retry_count + 1;

                    if next_retry >= self.config.retry.max_attempts {
                        warn!(
                            entry_id = entry.id,
                            retries = entry.retry_count,
                            error = %err,
                            "entry exhausted retry budget, abandoning"
                        );
                        self.queue.remove(entry.id)?;
                        self.store
                            .set_item_sync_status(entry.action.item_id(), SyncStatus::Abandoned)?;
                        report.abandoned += 1;
                    } else {
                        let delay = self.config.retry.delay_for_attempt(next_retry);
                        let gate = now + delay.as_millis() as i64;
                        warn!(
                            entry_id = entry.id,
                            retry = next_retry,
                            error = %err,
                            "entry failed, requeueing"
                        );
                        self.queue.requeue(entry.clone(), Some(gate))?;
                        self.store
                            .set_item_sync_status(entry.action.item_id(), SyncStatus::Failed)?;
                        report.failed += 1;
                    }
                }
            }
        }

        self.store.set_setting("lastSync", json!(now))?;
        report.remaining = self.queue.len();

        {
            let mut stats = self.stats.write();
            stats.drains_completed += 1;
            stats.entries_synced += report.succeeded as u64;
            stats.entries_failed += report.failed as u64;
            stats.entries_abandoned += report.abandoned as u64;
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            abandoned = report.abandoned,
            deferred = report.deferred,
            remaining = report.remaining,
            "drain pass finished"
        );
        Ok(report)
    }

    /// Issues the gateway call for one entry. No locks are held here - this
    /// is the pass's suspension point.
    fn apply_entry(&self, entry: &QueueEntry) -> Result<AppliedEntry, GatewayError> {
        match &entry.action {
            QueueAction::Create { draft, local_id } => {
                self.gateway.create(draft).map(|remote| AppliedEntry::Created {
                    local_id: *local_id,
                    item: Item::from_remote(&remote),
                })
            }
            QueueAction::Update { id, patch } => {
                self.gateway
                    .update(*id, patch)
                    .map(|remote| AppliedEntry::Updated {
                        item: Item::from_remote(&remote),
                    })
            }
            QueueAction::Delete { id } => self
                .gateway
                .delete(*id)
                .map(|()| AppliedEntry::Deleted { id: *id }),
        }
    }

    fn note_error(&self, err: &GatewayError) {
        self.stats.write().last_error = Some(err.to_string());
    }

    // ---- read path ----

    /// Returns a collection's documents in store order.
    #[must_use]
    pub fn read(&self, collection: Collection) -> Vec<Value> {
        self.store.get(collection)
    }

    /// Returns all items, typed.
    ///
    /// # Errors
    ///
    /// Returns an error if stored documents do not parse.
    pub fn items(&self) -> SyncResult<Vec<Item>> {
        Ok(self.store.items()?)
    }

    /// Returns one item by id, typed.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document does not parse.
    pub fn item(&self, id: ItemId) -> SyncResult<Option<Item>> {
        Ok(self.store.item(id)?)
    }

    /// Searches a collection and records the query in the search history.
    ///
    /// # Errors
    ///
    /// Returns an error if recording the query fails.
    pub fn search(&self, collection: Collection, query: &str) -> SyncResult<Vec<Value>> {
        if !query.trim().is_empty() {
            self.store.record_search(query)?;
        }
        Ok(self.store.search(collection, query))
    }

    /// Searches items, typed, recording the query in the search history.
    ///
    /// # Errors
    ///
    /// Returns an error if recording fails or documents do not parse.
    pub fn search_items(&self, query: &str) -> SyncResult<Vec<Item>> {
        if !query.trim().is_empty() {
            self.store.record_search(query)?;
        }
        Ok(self.store.search_items(query)?)
    }

    /// Pulls the authoritative item list and merges it into the store
    /// (manual refresh). Returns how many records were merged.
    ///
    /// # Errors
    ///
    /// Unlike mutations, a refresh cannot degrade to queueing: gateway
    /// failures are surfaced.
    pub fn refresh(&self, filters: &ListFilters) -> SyncResult<usize> {
        let remotes = self.gateway.list(filters)?;

        let _guard = self.write_lock.lock();
        for remote in &remotes {
            self.store.put_item(&Item::from_remote(remote))?;
        }
        info!(count = remotes.len(), "refreshed from remote");
        Ok(remotes.len())
    }

    /// Wipes items, categories, users, search history, and the offline
    /// queue. Settings survive.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails part-way.
    pub fn clear_local_data(&self) -> SyncResult<()> {
        let _guard = self.write_lock.lock();
        self.store.clear_all_data()?;
        self.queue.clear()?;
        Ok(())
    }

    // ---- observation ----

    /// The last-known connectivity state.
    #[must_use]
    pub fn connectivity(&self) -> ConnectivityState {
        self.monitor.current()
    }

    /// Subscribes to de-duplicated connectivity transitions.
    pub fn subscribe_connectivity(&self) -> Receiver<ConnectivityState> {
        self.monitor.subscribe()
    }

    /// Running totals across drain passes.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }
}
