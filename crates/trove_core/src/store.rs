//! Durable local store of named JSON document collections.
//!
//! The store is the device-side source of truth. Collections are JSON
//! document arrays cached in memory and written through to the storage
//! backend on every mutation - an operation is durable before it returns,
//! and a persistence failure leaves both memory and disk unchanged.

use crate::error::{CoreError, CoreResult};
use crate::item::{Category, Item, SyncStatus, User};
use crate::{ItemId, TimestampMs, UserId};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;
use trove_storage::StorageBackend;

const SETTINGS_KEY: &str = "settings";
const SEARCH_HISTORY_KEY: &str = "search_history";
/// Most-recent-first search history is capped at this many entries.
const SEARCH_HISTORY_CAP: usize = 10;
/// Fields scanned by `search`.
const SEARCH_FIELDS: [&str; 3] = ["title", "description", "location"];

/// The named document collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Found/lost item records.
    Items,
    /// Item categories.
    Categories,
    /// Cached user records.
    Users,
}

impl Collection {
    /// All collections, in persisted-key order.
    pub const ALL: [Collection; 3] = [Collection::Items, Collection::Categories, Collection::Users];

    /// The storage key this collection persists under.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Categories => "categories",
            Collection::Users => "users",
        }
    }
}

/// Summary counters over the store (for diagnostics screens).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total item records.
    pub total_items: usize,
    /// Items whose origin is local (created on this device).
    pub locally_created: usize,
    /// Items currently pending or failed (awaiting a drain).
    pub pending_sync: usize,
    /// Total cached users.
    pub total_users: usize,
    /// The `lastSync` setting, if a drain has completed.
    pub last_sync: Option<TimestampMs>,
}

/// Durable key-grouped persistence for items, categories, users, settings,
/// and search history.
///
/// # Contract
///
/// - [`get`](Self::get) returns a collection's documents in store order
/// - [`put`](Self::put) upserts by `id`: an existing document is merged
///   field-by-field (incoming fields win, absent fields are preserved),
///   otherwise the document is appended
/// - [`delete`](Self::delete) removes by `id`, no-op if absent
/// - [`search`](Self::search) matches `title`, `description`, or `location`
///   case-insensitively, in store order
///
/// All operations are write-through: the new collection state is persisted
/// before the call returns, and a persistence failure surfaces as a fatal
/// [`CoreError`] with no partial write.
pub struct LocalStore {
    backend: Arc<dyn StorageBackend>,
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
    settings: RwLock<Map<String, Value>>,
    search_history: RwLock<Vec<String>>,
    last_local_id: AtomicI64,
}

impl LocalStore {
    /// Opens a store over the given backend, loading all persisted
    /// collections and seeding default categories into an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or persisted data does not
    /// parse.
    pub fn open(backend: Arc<dyn StorageBackend>) -> CoreResult<Self> {
        let mut collections = HashMap::new();
        for collection in Collection::ALL {
            let docs: Vec<Value> = match backend.read(collection.key())? {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => Vec::new(),
            };
            collections.insert(collection, docs);
        }

        let settings: Map<String, Value> = match backend.read(SETTINGS_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Map::new(),
        };

        let search_history: Vec<String> = match backend.read(SEARCH_HISTORY_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };

        let store = Self {
            backend,
            collections: RwLock::new(collections),
            settings: RwLock::new(settings),
            search_history: RwLock::new(search_history),
            last_local_id: AtomicI64::new(0),
        };

        store.seed_default_categories()?;
        Ok(store)
    }

    /// Seeds the default categories when the collection is empty.
    fn seed_default_categories(&self) -> CoreResult<()> {
        let empty = self.collections.read()[&Collection::Categories].is_empty();
        if !empty {
            return Ok(());
        }

        let docs: Vec<Value> = Category::defaults()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;
        self.persist(Collection::Categories, &docs)?;
        self.collections
            .write()
            .insert(Collection::Categories, docs);
        debug!("seeded default categories");
        Ok(())
    }

    fn persist(&self, collection: Collection, docs: &[Value]) -> CoreResult<()> {
        let bytes = serde_json::to_vec(docs)?;
        self.backend.write(collection.key(), &bytes)?;
        Ok(())
    }

    fn doc_id(doc: &Value) -> Option<i64> {
        doc.get("id").and_then(Value::as_i64)
    }

    // ---- generic document contract ----

    /// Returns the collection's documents in store order.
    #[must_use]
    pub fn get(&self, collection: Collection) -> Vec<Value> {
        self.collections.read()[&collection].clone()
    }

    /// Upserts a document by `id`.
    ///
    /// If a document with the same `id` exists, incoming fields overwrite it
    /// field-by-field (last-write-wins) and fields absent from the incoming
    /// document are preserved. Otherwise the document is appended.
    ///
    /// Returns the stored (merged) document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not an object with an integer
    /// `id`, or if persistence fails (in which case nothing changed).
    pub fn put(&self, collection: Collection, doc: Value) -> CoreResult<Value> {
        let incoming = doc.as_object().ok_or_else(|| CoreError::NotAnObject {
            collection: collection.key().into(),
        })?;
        let id = Self::doc_id(&doc).ok_or_else(|| CoreError::MissingId {
            collection: collection.key().into(),
        })?;

        let mut guard = self.collections.write();
        let mut docs = guard[&collection].clone();

        let stored = match docs.iter_mut().find(|d| Self::doc_id(d) == Some(id)) {
            Some(existing) => {
                if let Some(fields) = existing.as_object_mut() {
                    for (key, value) in incoming {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                existing.clone()
            }
            None => {
                docs.push(doc.clone());
                doc
            }
        };

        self.persist(collection, &docs)?;
        guard.insert(collection, docs);
        debug!(collection = collection.key(), id, "put document");
        Ok(stored)
    }

    /// Removes the document with the given `id`. Returns whether a document
    /// was removed; absence is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing
    /// changed).
    pub fn delete(&self, collection: Collection, id: i64) -> CoreResult<bool> {
        let mut guard = self.collections.write();
        let docs = &guard[&collection];

        if !docs.iter().any(|d| Self::doc_id(d) == Some(id)) {
            return Ok(false);
        }

        let remaining: Vec<Value> = docs
            .iter()
            .filter(|d| Self::doc_id(d) != Some(id))
            .cloned()
            .collect();

        self.persist(collection, &remaining)?;
        guard.insert(collection, remaining);
        debug!(collection = collection.key(), id, "deleted document");
        Ok(true)
    }

    /// Returns documents whose `title`, `description`, or `location`
    /// case-insensitively contain `query`, in store order.
    #[must_use]
    pub fn search(&self, collection: Collection, query: &str) -> Vec<Value> {
        let needle = query.to_lowercase();
        self.collections.read()[&collection]
            .iter()
            .filter(|doc| {
                SEARCH_FIELDS.iter().any(|field| {
                    doc.get(field)
                        .and_then(Value::as_str)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            })
            .cloned()
            .collect()
    }

    // ---- typed item accessors ----

    /// Returns all item records.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored document does not parse as an item.
    pub fn items(&self) -> CoreResult<Vec<Item>> {
        self.get(Collection::Items)
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(CoreError::from))
            .collect()
    }

    /// Returns the item with the given id, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document does not parse as an item.
    pub fn item(&self, id: ItemId) -> CoreResult<Option<Item>> {
        self.get(Collection::Items)
            .into_iter()
            .find(|doc| Self::doc_id(doc) == Some(id))
            .map(|doc| serde_json::from_value(doc).map_err(CoreError::from))
            .transpose()
    }

    /// Upserts an item record.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn put_item(&self, item: &Item) -> CoreResult<()> {
        self.put(Collection::Items, serde_json::to_value(item)?)?;
        Ok(())
    }

    /// Removes an item record. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn delete_item(&self, id: ItemId) -> CoreResult<bool> {
        self.delete(Collection::Items, id)
    }

    /// Returns items matching `query` (case-insensitive, title/description/
    /// location).
    ///
    /// # Errors
    ///
    /// Returns an error if a matching document does not parse as an item.
    pub fn search_items(&self, query: &str) -> CoreResult<Vec<Item>> {
        self.search(Collection::Items, query)
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(CoreError::from))
            .collect()
    }

    /// Sets an item's sync status. Returns whether the item existed.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn set_item_sync_status(&self, id: ItemId, status: SyncStatus) -> CoreResult<bool> {
        match self.item(id)? {
            Some(mut item) => {
                item.sync_status = status;
                self.put_item(&item)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replaces a locally-identified item with its authoritative,
    /// server-identified version in one atomic step.
    ///
    /// The old record (if still present) is removed and the new record
    /// upserted under a single lock acquisition and a single persisted
    /// write, so no reader observes a state with both ids or neither.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing
    /// changed).
    pub fn reassign_item_id(&self, old_id: ItemId, item: &Item) -> CoreResult<()> {
        let incoming = serde_json::to_value(item)?;

        let mut guard = self.collections.write();
        let mut docs: Vec<Value> = guard[&Collection::Items]
            .iter()
            .filter(|d| Self::doc_id(d) != Some(old_id))
            .cloned()
            .collect();

        match docs
            .iter_mut()
            .find(|d| Self::doc_id(d) == Some(item.id))
        {
            Some(existing) => *existing = incoming,
            None => docs.push(incoming),
        }

        self.persist(Collection::Items, &docs)?;
        guard.insert(Collection::Items, docs);
        debug!(old_id, new_id = item.id, "reassigned item id");
        Ok(())
    }

    /// Allocates a strictly-increasing local item id.
    ///
    /// Seeded from the millisecond clock; same-millisecond allocations bump
    /// by one so ids never collide within a process.
    pub fn next_local_id(&self, now: TimestampMs) -> ItemId {
        self.last_local_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .map(|last| now.max(last + 1))
            .unwrap_or(now)
    }

    // ---- typed category / user accessors ----

    /// Returns all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored document does not parse as a category.
    pub fn categories(&self) -> CoreResult<Vec<Category>> {
        self.get(Collection::Categories)
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(CoreError::from))
            .collect()
    }

    /// Upserts a category.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn put_category(&self, category: &Category) -> CoreResult<()> {
        self.put(Collection::Categories, serde_json::to_value(category)?)?;
        Ok(())
    }

    /// Returns all cached users.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored document does not parse as a user.
    pub fn users(&self) -> CoreResult<Vec<User>> {
        self.get(Collection::Users)
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(CoreError::from))
            .collect()
    }

    /// Returns the cached user with the given id, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document does not parse as a user.
    pub fn user(&self, id: UserId) -> CoreResult<Option<User>> {
        Ok(self.users()?.into_iter().find(|u| u.id == id))
    }

    /// Upserts a cached user.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn put_user(&self, user: &User) -> CoreResult<()> {
        self.put(Collection::Users, serde_json::to_value(user)?)?;
        Ok(())
    }

    // ---- settings ----

    /// Returns a copy of the flat settings map.
    #[must_use]
    pub fn settings(&self) -> Map<String, Value> {
        self.settings.read().clone()
    }

    /// Returns a single setting, if set.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<Value> {
        self.settings.read().get(key).cloned()
    }

    /// Sets a single setting, persisting the map.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing
    /// changed).
    pub fn set_setting(&self, key: impl Into<String>, value: Value) -> CoreResult<()> {
        let mut guard = self.settings.write();
        let mut updated = guard.clone();
        updated.insert(key.into(), value);

        let bytes = serde_json::to_vec(&updated)?;
        self.backend.write(SETTINGS_KEY, &bytes)?;
        *guard = updated;
        Ok(())
    }

    // ---- search history ----

    /// Records a search query: most-recent-first, deduplicated, capped.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails (in which case nothing
    /// changed).
    pub fn record_search(&self, query: &str) -> CoreResult<()> {
        let mut guard = self.search_history.write();

        let mut updated = Vec::with_capacity(SEARCH_HISTORY_CAP);
        updated.push(query.to_string());
        updated.extend(guard.iter().filter(|q| q.as_str() != query).cloned());
        updated.truncate(SEARCH_HISTORY_CAP);

        let bytes = serde_json::to_vec(&updated)?;
        self.backend.write(SEARCH_HISTORY_KEY, &bytes)?;
        *guard = updated;
        Ok(())
    }

    /// Returns the search history, most recent first.
    #[must_use]
    pub fn search_history(&self) -> Vec<String> {
        self.search_history.read().clone()
    }

    // ---- maintenance ----

    /// Clears items, categories, users, and search history. Settings are
    /// preserved (they survive a logout, as in the source client).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails part-way; cleared collections
    /// stay cleared.
    pub fn clear_all_data(&self) -> CoreResult<()> {
        let mut guard = self.collections.write();
        for collection in Collection::ALL {
            self.backend.remove(collection.key())?;
            guard.insert(collection, Vec::new());
        }
        drop(guard);

        self.backend.remove(SEARCH_HISTORY_KEY)?;
        self.search_history.write().clear();
        debug!("cleared local data");
        Ok(())
    }

    /// Returns summary counters over the store.
    ///
    /// # Errors
    ///
    /// Returns an error if stored items or users do not parse.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        let items = self.items()?;
        Ok(StoreStats {
            total_items: items.len(),
            locally_created: items
                .iter()
                .filter(|i| i.origin == crate::Origin::Local)
                .count(),
            pending_sync: items.iter().filter(|i| i.sync_status.is_queued()).count(),
            total_users: self.users()?.len(),
            last_sync: self.setting("lastSync").and_then(|v| v.as_i64()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemDraft, ItemStatus, Origin};
    use serde_json::json;
    use trove_storage::MemoryBackend;

    fn store() -> LocalStore {
        LocalStore::open(Arc::new(MemoryBackend::new())).unwrap()
    }

    fn item(id: ItemId, title: &str) -> Item {
        let draft = ItemDraft::new(title, "desc", ItemStatus::Lost, "Library", 7);
        Item::from_draft(&draft, id, 1000)
    }

    #[test]
    fn put_appends_new_document() {
        let store = store();
        store.put_item(&item(1, "Wallet")).unwrap();

        let items = store.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Wallet");
    }

    #[test]
    fn put_merges_by_id() {
        let store = store();
        store
            .put(Collection::Items, json!({"id": 1, "title": "Wallet", "location": "Library"}))
            .unwrap();
        store
            .put(Collection::Items, json!({"id": 1, "location": "Cafeteria"}))
            .unwrap();

        let docs = store.get(Collection::Items);
        assert_eq!(docs.len(), 1);
        // Incoming field wins, absent field preserved
        assert_eq!(docs[0]["location"], "Cafeteria");
        assert_eq!(docs[0]["title"], "Wallet");
    }

    #[test]
    fn upsert_is_idempotent() {
        let store = store();
        let record = item(1, "Wallet");
        store.put_item(&record).unwrap();
        store.put_item(&record).unwrap();

        assert_eq!(store.items().unwrap().len(), 1);
    }

    #[test]
    fn put_rejects_bad_documents() {
        let store = store();
        assert!(matches!(
            store.put(Collection::Items, json!([1, 2])),
            Err(CoreError::NotAnObject { .. })
        ));
        assert!(matches!(
            store.put(Collection::Items, json!({"title": "no id"})),
            Err(CoreError::MissingId { .. })
        ));
    }

    #[test]
    fn delete_is_noop_when_absent() {
        let store = store();
        assert!(!store.delete_item(99).unwrap());

        store.put_item(&item(1, "Wallet")).unwrap();
        assert!(store.delete_item(1).unwrap());
        assert!(store.items().unwrap().is_empty());
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let store = store();
        store.put_item(&item(1, "Blue Backpack")).unwrap();

        assert_eq!(store.search_items("backpack").unwrap().len(), 1);
        assert_eq!(store.search_items("BLUE").unwrap().len(), 1);
        // location match
        assert_eq!(store.search_items("library").unwrap().len(), 1);
        // description match
        assert_eq!(store.search_items("DESC").unwrap().len(), 1);
        assert!(store.search_items("umbrella").unwrap().is_empty());
    }

    #[test]
    fn search_preserves_store_order() {
        let store = store();
        store.put_item(&item(2, "Red Backpack")).unwrap();
        store.put_item(&item(1, "Blue Backpack")).unwrap();

        let found = store.search_items("backpack").unwrap();
        assert_eq!(found[0].id, 2);
        assert_eq!(found[1].id, 1);
    }

    #[test]
    fn default_categories_seeded_once() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let store = LocalStore::open(Arc::clone(&backend) as _).unwrap();
            assert_eq!(store.categories().unwrap().len(), 7);
            // Remove one; reopen must not re-seed a non-empty collection
            store.delete(Collection::Categories, 7).unwrap();
        }

        let store = LocalStore::open(backend).unwrap();
        assert_eq!(store.categories().unwrap().len(), 6);
    }

    #[test]
    fn settings_roundtrip() {
        let store = store();
        assert_eq!(store.setting("lastSync"), None);

        store.set_setting("lastSync", json!(1234)).unwrap();
        assert_eq!(store.setting("lastSync"), Some(json!(1234)));
        assert_eq!(store.settings().len(), 1);
    }

    #[test]
    fn search_history_dedups_and_caps() {
        let store = store();
        for i in 0..12 {
            store.record_search(&format!("query{i}")).unwrap();
        }
        store.record_search("query5").unwrap();

        let history = store.search_history();
        assert_eq!(history.len(), SEARCH_HISTORY_CAP);
        assert_eq!(history[0], "query5");
        // Deduplicated: only one copy of query5
        assert_eq!(history.iter().filter(|q| *q == "query5").count(), 1);
    }

    #[test]
    fn reassign_item_id_swaps_identity() {
        let store = store();
        let local = item(-47, "Wallet");
        store.put_item(&local).unwrap();

        let mut confirmed = local.clone();
        confirmed.id = 501;
        confirmed.origin = Origin::Remote;
        confirmed.sync_status = SyncStatus::Synced;
        store.reassign_item_id(-47, &confirmed).unwrap();

        let items = store.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 501);
        assert_eq!(items[0].sync_status, SyncStatus::Synced);
        assert!(store.item(-47).unwrap().is_none());
    }

    #[test]
    fn local_ids_strictly_increase() {
        let store = store();
        let a = store.next_local_id(1000);
        let b = store.next_local_id(1000);
        let c = store.next_local_id(999);
        assert!(a < b && b < c || (a == 1000 && b == 1001 && c == 1002));
    }

    #[test]
    fn clear_preserves_settings() {
        let store = store();
        store.put_item(&item(1, "Wallet")).unwrap();
        store.record_search("wallet").unwrap();
        store.set_setting("lastSync", json!(99)).unwrap();

        store.clear_all_data().unwrap();

        assert!(store.items().unwrap().is_empty());
        assert!(store.categories().unwrap().is_empty());
        assert!(store.search_history().is_empty());
        assert_eq!(store.setting("lastSync"), Some(json!(99)));
    }

    #[test]
    fn persistence_across_reopen() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let store = LocalStore::open(Arc::clone(&backend) as _).unwrap();
            store.put_item(&item(1, "Wallet")).unwrap();
            store.set_setting("lastSync", json!(5)).unwrap();
        }

        let store = LocalStore::open(backend).unwrap();
        assert_eq!(store.items().unwrap().len(), 1);
        assert_eq!(store.setting("lastSync"), Some(json!(5)));
    }

    #[test]
    fn stats_counts() {
        let store = store();
        let mut synced = item(1, "Wallet");
        synced.sync_status = SyncStatus::Synced;
        synced.origin = Origin::Remote;
        store.put_item(&synced).unwrap();
        store.put_item(&item(2, "Keys")).unwrap();
        store.set_setting("lastSync", json!(77)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.locally_created, 1);
        assert_eq!(stats.pending_sync, 1);
        assert_eq!(stats.last_sync, Some(77));
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = Arc::new(trove_storage::FileBackend::open(dir.path()).unwrap());
            let store = LocalStore::open(backend).unwrap();
            store.put_item(&item(1, "Wallet")).unwrap();
        }

        let backend = Arc::new(trove_storage::FileBackend::open(dir.path()).unwrap());
        let store = LocalStore::open(backend).unwrap();
        assert_eq!(store.items().unwrap().len(), 1);
        assert_eq!(store.categories().unwrap().len(), 7);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn upsert_same_id_is_idempotent(
                id in 1i64..1_000,
                title in "[a-zA-Z][a-zA-Z0-9 ]{0,15}",
            ) {
                let store = store();
                let record = item(id, &title);
                store.put_item(&record).unwrap();
                store.put_item(&record).unwrap();

                let items = store.items().unwrap();
                prop_assert_eq!(items.len(), 1);
                prop_assert_eq!(&items[0].title, &title);
            }

            #[test]
            fn search_matches_any_casing(title in "[a-zA-Z][a-zA-Z ]{0,15}") {
                let store = store();
                store.put_item(&item(1, &title)).unwrap();

                prop_assert_eq!(store.search_items(&title.to_uppercase()).unwrap().len(), 1);
                prop_assert_eq!(store.search_items(&title.to_lowercase()).unwrap().len(), 1);
            }
        }
    }

    #[test]
    fn merge_preserves_unknown_fields() {
        let store = store();
        store
            .put(
                Collection::Items,
                json!({"id": 1, "title": "Wallet", "legacyFlag": true}),
            )
            .unwrap();

        // A typed write touches only the item's own fields
        store.set_item_sync_status(1, SyncStatus::Synced).unwrap_err();
        // (the raw doc above is not a full item, so the typed path errors;
        // the raw merge path still preserves extras)
        store
            .put(Collection::Items, json!({"id": 1, "title": "Purse"}))
            .unwrap();

        let docs = store.get(Collection::Items);
        assert_eq!(docs[0]["legacyFlag"], true);
        assert_eq!(docs[0]["title"], "Purse");
    }
}
