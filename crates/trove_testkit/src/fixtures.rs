//! Sample data and wired component pairs.

use std::path::Path;
use std::sync::Arc;
use trove_core::{
    CoreResult, Item, ItemDraft, ItemStatus, LocalStore, OfflineQueue, RemoteItem, User,
};
use trove_storage::{FileBackend, MemoryBackend, StorageBackend};

/// A lost-item draft with the given title.
#[must_use]
pub fn draft(title: &str) -> ItemDraft {
    ItemDraft::new(
        title,
        format!("{title} (test record)"),
        ItemStatus::Lost,
        "Library",
        7,
    )
}

/// A found-item draft with the given title.
#[must_use]
pub fn found_draft(title: &str) -> ItemDraft {
    ItemDraft::new(
        title,
        format!("{title} (test record)"),
        ItemStatus::Found,
        "Front desk",
        7,
    )
}

/// A locally-stored item built from [`draft`].
#[must_use]
pub fn item(id: i64, title: &str) -> Item {
    Item::from_draft(&draft(title), id, 1_000)
}

/// An authoritative remote record.
#[must_use]
pub fn remote_item(id: i64, title: &str) -> RemoteItem {
    RemoteItem {
        id,
        title: title.into(),
        description: format!("{title} (test record)"),
        status: ItemStatus::Lost,
        location: "Library".into(),
        image_path: None,
        category_id: 7,
        created_at: 1_000,
        updated_at: 1_000,
    }
}

/// A cached user record.
#[must_use]
pub fn user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.into(),
        email: format!("{username}@example.com"),
        role: "member".into(),
        phone: None,
        created_at: 1_000,
    }
}

/// A store and queue sharing one in-memory backend.
///
/// # Errors
///
/// Returns an error if opening either component fails.
pub fn memory_pair() -> CoreResult<(Arc<LocalStore>, Arc<OfflineQueue>)> {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    pair_over(backend)
}

/// A store and queue sharing one file backend in the given directory.
///
/// # Errors
///
/// Returns an error if opening the backend or either component fails.
pub fn file_pair(dir: &Path) -> CoreResult<(Arc<LocalStore>, Arc<OfflineQueue>)> {
    let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::open(dir)?);
    pair_over(backend)
}

/// A store and queue over the given backend.
///
/// # Errors
///
/// Returns an error if opening either component fails.
pub fn pair_over(
    backend: Arc<dyn StorageBackend>,
) -> CoreResult<(Arc<LocalStore>, Arc<OfflineQueue>)> {
    let store = Arc::new(LocalStore::open(Arc::clone(&backend))?);
    let queue = Arc::new(OfflineQueue::open(backend)?);
    Ok((store, queue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_consistent() {
        let d = draft("Wallet");
        assert_eq!(d.status, ItemStatus::Lost);

        let f = found_draft("Umbrella");
        assert_eq!(f.status, ItemStatus::Found);

        let i = item(3, "Wallet");
        assert_eq!(i.id, 3);
        assert_eq!(i.title, "Wallet");
    }

    #[test]
    fn memory_pair_shares_a_backend() {
        let (store, queue) = memory_pair().unwrap();
        assert!(store.items().unwrap().is_empty());
        assert!(queue.is_empty());
    }
}
