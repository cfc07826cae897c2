//! Remote gateway abstraction for sync operations.
//!
//! The gateway is the engine's only view of the remote service. It is
//! consumed, not fully specified here: its own retry/backoff internals are
//! its concern, and the coordinator simply blocks on each call until it
//! resolves to a typed success or failure.

use crate::error::{GatewayError, GatewayResult};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use trove_core::{CategoryId, ItemDraft, ItemId, ItemPatch, ItemStatus, RemoteItem, TimestampMs};
use uuid::Uuid;

/// Filters for listing remote items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilters {
    /// Restrict to found or lost items.
    pub status: Option<ItemStatus>,
    /// Restrict to one category.
    pub category_id: Option<CategoryId>,
    /// Free-text filter, applied remotely.
    pub query: Option<String>,
}

impl ListFilters {
    /// No filtering: list everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}

/// Thin transport abstraction issuing create/read/update/delete calls to
/// the remote service.
///
/// Calls are synchronous from the coordinator's point of view. `update` and
/// `delete` are idempotent by nature; `create` is **not** - a retried
/// create after an ambiguous failure can produce a duplicate remote record.
/// Drafts carry a client idempotency token so a server can deduplicate,
/// but that is the server's concern.
///
/// Implementations attach the bearer credential to every call; credential
/// acquisition is out of the engine's scope.
pub trait RemoteGateway: Send + Sync {
    /// Creates a remote record, returning the authoritative result
    /// (notably the server-assigned id).
    fn create(&self, draft: &ItemDraft) -> GatewayResult<RemoteItem>;

    /// Applies a partial update to the remote record with the given id.
    fn update(&self, id: ItemId, patch: &ItemPatch) -> GatewayResult<RemoteItem>;

    /// Deletes the remote record with the given id.
    fn delete(&self, id: ItemId) -> GatewayResult<()>;

    /// Lists remote records matching the filters.
    fn list(&self, filters: &ListFilters) -> GatewayResult<Vec<RemoteItem>>;
}

/// A recorded call against the [`MockGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    /// `create` with the draft's title.
    Create(String),
    /// `update` with the target id.
    Update(ItemId),
    /// `delete` with the target id.
    Delete(ItemId),
    /// `list`.
    List,
}

/// An in-memory gateway for testing.
///
/// Behaves like a tiny remote store: creates assign ids from a counter,
/// updates and deletes hit the held records, and every call is logged.
/// Failures are injected per item id, per draft title, as one-shot errors,
/// or by making the whole gateway unreachable.
pub struct MockGateway {
    items: Mutex<Vec<RemoteItem>>,
    seen_tokens: Mutex<HashMap<Uuid, ItemId>>,
    calls: Mutex<Vec<GatewayCall>>,
    failing_ids: Mutex<HashSet<ItemId>>,
    failing_titles: Mutex<HashSet<String>>,
    one_shot_errors: Mutex<VecDeque<GatewayError>>,
    unreachable: AtomicBool,
    dedupe_tokens: AtomicBool,
    next_id: AtomicI64,
    now: AtomicI64,
}

impl MockGateway {
    /// Creates a mock whose server-assigned ids start at 501.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            seen_tokens: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing_ids: Mutex::new(HashSet::new()),
            failing_titles: Mutex::new(HashSet::new()),
            one_shot_errors: Mutex::new(VecDeque::new()),
            unreachable: AtomicBool::new(false),
            dedupe_tokens: AtomicBool::new(false),
            next_id: AtomicI64::new(501),
            now: AtomicI64::new(0),
        }
    }

    /// Sets the timestamp stamped onto authoritative results.
    pub fn set_now(&self, now: TimestampMs) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Makes every call fail with a retryable transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Enables server-side deduplication of create idempotency tokens:
    /// a repeated token returns the already-created record.
    pub fn set_dedupe_tokens(&self, dedupe: bool) {
        self.dedupe_tokens.store(dedupe, Ordering::SeqCst);
    }

    /// Makes update/delete calls for `id` fail with a retryable transport
    /// error until cleared.
    pub fn fail_id(&self, id: ItemId) {
        self.failing_ids.lock().insert(id);
    }

    /// Makes create calls for drafts with this title fail with a retryable
    /// transport error until cleared.
    pub fn fail_title(&self, title: impl Into<String>) {
        self.failing_titles.lock().insert(title.into());
    }

    /// Clears all persistent failure injection.
    pub fn clear_failures(&self) {
        self.failing_ids.lock().clear();
        self.failing_titles.lock().clear();
    }

    /// Queues an error consumed by the next call, whatever it is.
    pub fn push_error(&self, error: GatewayError) {
        self.one_shot_errors.lock().push_back(error);
    }

    /// Returns the calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    /// Returns the records the "server" currently holds.
    #[must_use]
    pub fn remote_items(&self) -> Vec<RemoteItem> {
        self.items.lock().clone()
    }

    /// Seeds a record into the "server" directly.
    pub fn seed_remote(&self, item: RemoteItem) {
        self.items.lock().push(item);
    }

    fn check_reachable(&self) -> GatewayResult<()> {
        if let Some(err) = self.one_shot_errors.lock().pop_front() {
            return Err(err);
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(GatewayError::transport_retryable("gateway unreachable"));
        }
        Ok(())
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteGateway for MockGateway {
    fn create(&self, draft: &ItemDraft) -> GatewayResult<RemoteItem> {
        self.calls.lock().push(GatewayCall::Create(draft.title.clone()));
        self.check_reachable()?;
        if self.failing_titles.lock().contains(&draft.title) {
            return Err(GatewayError::transport_retryable("injected create failure"));
        }

        if self.dedupe_tokens.load(Ordering::SeqCst) {
            if let Some(existing_id) = self.seen_tokens.lock().get(&draft.client_token) {
                let items = self.items.lock();
                if let Some(existing) = items.iter().find(|i| i.id == *existing_id) {
                    return Ok(existing.clone());
                }
            }
        }

        let now = self.now.load(Ordering::SeqCst);
        let item = RemoteItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: draft.status,
            location: draft.location.clone(),
            image_path: draft.image_path.clone(),
            category_id: draft.category_id,
            created_at: now,
            updated_at: now,
        };
        self.seen_tokens.lock().insert(draft.client_token, item.id);
        self.items.lock().push(item.clone());
        Ok(item)
    }

    fn update(&self, id: ItemId, patch: &ItemPatch) -> GatewayResult<RemoteItem> {
        self.calls.lock().push(GatewayCall::Update(id));
        self.check_reachable()?;
        if self.failing_ids.lock().contains(&id) {
            return Err(GatewayError::transport_retryable("injected update failure"));
        }

        let now = self.now.load(Ordering::SeqCst);
        let mut items = self.items.lock();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(GatewayError::Conflict { id })?;

        if let Some(title) = &patch.title {
            item.title = title.clone();
        }
        if let Some(description) = &patch.description {
            item.description = description.clone();
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(location) = &patch.location {
            item.location = location.clone();
        }
        if let Some(image_path) = &patch.image_path {
            item.image_path = Some(image_path.clone());
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        item.updated_at = now;
        Ok(item.clone())
    }

    fn delete(&self, id: ItemId) -> GatewayResult<()> {
        self.calls.lock().push(GatewayCall::Delete(id));
        self.check_reachable()?;
        if self.failing_ids.lock().contains(&id) {
            return Err(GatewayError::transport_retryable("injected delete failure"));
        }

        // Delete is idempotent: deleting an absent record succeeds
        self.items.lock().retain(|i| i.id != id);
        Ok(())
    }

    fn list(&self, filters: &ListFilters) -> GatewayResult<Vec<RemoteItem>> {
        self.calls.lock().push(GatewayCall::List);
        self.check_reachable()?;

        let needle = filters.query.as_deref().map(str::to_lowercase);
        Ok(self
            .items
            .lock()
            .iter()
            .filter(|i| filters.status.is_none_or(|s| i.status == s))
            .filter(|i| filters.category_id.is_none_or(|c| i.category_id == c))
            .filter(|i| {
                needle.as_deref().is_none_or(|q| {
                    i.title.to_lowercase().contains(q)
                        || i.description.to_lowercase().contains(q)
                        || i.location.to_lowercase().contains(q)
                })
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> ItemDraft {
        ItemDraft::new(title, "desc", ItemStatus::Lost, "Library", 7)
    }

    #[test]
    fn create_assigns_server_ids() {
        let gateway = MockGateway::new();
        let a = gateway.create(&draft("Wallet")).unwrap();
        let b = gateway.create(&draft("Keys")).unwrap();

        assert_eq!(a.id, 501);
        assert_eq!(b.id, 502);
        assert_eq!(gateway.remote_items().len(), 2);
    }

    #[test]
    fn update_missing_record_conflicts() {
        let gateway = MockGateway::new();
        let result = gateway.update(999, &ItemPatch::title("X"));
        assert!(matches!(result, Err(GatewayError::Conflict { id: 999 })));
    }

    #[test]
    fn delete_is_idempotent() {
        let gateway = MockGateway::new();
        let item = gateway.create(&draft("Wallet")).unwrap();

        gateway.delete(item.id).unwrap();
        gateway.delete(item.id).unwrap();
        assert!(gateway.remote_items().is_empty());
    }

    #[test]
    fn unreachable_fails_everything() {
        let gateway = MockGateway::new();
        gateway.set_unreachable(true);

        let result = gateway.create(&draft("Wallet"));
        assert!(matches!(
            result,
            Err(GatewayError::Transport { retryable: true, .. })
        ));
    }

    #[test]
    fn one_shot_error_consumed_once() {
        let gateway = MockGateway::new();
        gateway.push_error(GatewayError::transport_retryable("flaky"));

        assert!(gateway.create(&draft("Wallet")).is_err());
        assert!(gateway.create(&draft("Wallet")).is_ok());
    }

    #[test]
    fn token_dedupe_returns_existing_record() {
        let gateway = MockGateway::new();
        gateway.set_dedupe_tokens(true);

        let d = draft("Wallet");
        let first = gateway.create(&d).unwrap();
        let second = gateway.create(&d).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(gateway.remote_items().len(), 1);
    }

    #[test]
    fn list_applies_filters() {
        let gateway = MockGateway::new();
        gateway.create(&draft("Blue Backpack")).unwrap();
        let mut found = draft("Umbrella");
        found.status = ItemStatus::Found;
        gateway.create(&found).unwrap();

        let lost = gateway
            .list(&ListFilters {
                status: Some(ItemStatus::Lost),
                ..ListFilters::all()
            })
            .unwrap();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].title, "Blue Backpack");

        let by_query = gateway
            .list(&ListFilters {
                query: Some("umbrella".into()),
                ..ListFilters::all()
            })
            .unwrap();
        assert_eq!(by_query.len(), 1);
    }

    #[test]
    fn calls_are_logged_in_order() {
        let gateway = MockGateway::new();
        let item = gateway.create(&draft("Wallet")).unwrap();
        gateway.update(item.id, &ItemPatch::title("Purse")).unwrap();
        gateway.delete(item.id).unwrap();

        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::Create("Wallet".into()),
                GatewayCall::Update(item.id),
                GatewayCall::Delete(item.id),
            ]
        );
    }
}
