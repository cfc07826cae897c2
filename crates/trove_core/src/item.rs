//! The lost-and-found data model.

use crate::{CategoryId, ItemId, TimestampMs, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an item was reported as found or as lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Someone found this item and handed it in.
    Found,
    /// Someone lost this item and is looking for it.
    Lost,
}

/// Origin of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Created locally, id assigned by this device.
    Local,
    /// Confirmed by the server, id assigned remotely.
    Remote,
}

/// Whether local state matches confirmed remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Local state matches the server.
    Synced,
    /// A mutation is queued, waiting for connectivity.
    Pending,
    /// The last remote attempt failed; the mutation is requeued.
    Failed,
    /// The mutation exhausted its retry budget and will not be retried.
    Abandoned,
}

impl SyncStatus {
    /// Returns true if a queue entry should exist for this status.
    #[must_use]
    pub fn is_queued(self) -> bool {
        matches!(self, SyncStatus::Pending | SyncStatus::Failed)
    }
}

/// A found/lost item record in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Item identifier. Locally assigned until the server confirms a create.
    pub id: ItemId,
    /// Short title, e.g. "Blue Backpack".
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Found or lost.
    pub status: ItemStatus,
    /// Where the item was found or last seen.
    pub location: String,
    /// Optional reference to a stored image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Category this item belongs to.
    pub category_id: CategoryId,
    /// Creation time (milliseconds since epoch).
    pub created_at: TimestampMs,
    /// Last update time (milliseconds since epoch).
    pub updated_at: TimestampMs,
    /// Whether the record originated locally or from the server.
    pub origin: Origin,
    /// Whether local state matches confirmed remote state.
    pub sync_status: SyncStatus,
}

impl Item {
    /// Builds an item from a draft, with a locally-assigned id.
    #[must_use]
    pub fn from_draft(draft: &ItemDraft, id: ItemId, now: TimestampMs) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: draft.status,
            location: draft.location.clone(),
            image_path: draft.image_path.clone(),
            category_id: draft.category_id,
            created_at: now,
            updated_at: now,
            origin: Origin::Local,
            sync_status: SyncStatus::Pending,
        }
    }

    /// Builds an item from an authoritative server record.
    #[must_use]
    pub fn from_remote(remote: &RemoteItem) -> Self {
        Self {
            id: remote.id,
            title: remote.title.clone(),
            description: remote.description.clone(),
            status: remote.status,
            location: remote.location.clone(),
            image_path: remote.image_path.clone(),
            category_id: remote.category_id,
            created_at: remote.created_at,
            updated_at: remote.updated_at,
            origin: Origin::Remote,
            sync_status: SyncStatus::Synced,
        }
    }

    /// Applies a patch in place, bumping `updated_at`.
    pub fn apply_patch(&mut self, patch: &ItemPatch, now: TimestampMs) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(image_path) = &patch.image_path {
            self.image_path = Some(image_path.clone());
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        self.updated_at = now;
    }
}

/// Payload for creating a new item.
///
/// Carries a client-generated idempotency token so a retried create after an
/// ambiguous failure can be deduplicated server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Found or lost.
    pub status: ItemStatus,
    /// Where the item was found or last seen.
    pub location: String,
    /// Optional reference to a stored image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Category this item belongs to.
    pub category_id: CategoryId,
    /// Client-generated idempotency token.
    pub client_token: Uuid,
}

impl ItemDraft {
    /// Creates a draft with a fresh idempotency token.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        status: ItemStatus,
        location: impl Into<String>,
        category_id: CategoryId,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status,
            location: location.into(),
            image_path: None,
            category_id,
            client_token: Uuid::new_v4(),
        }
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }
}

/// A partial update to an item. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    /// New title, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New status, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    /// New location, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New image reference, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// New category, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl ItemPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Patch that only changes the title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Patch that only changes the location.
    #[must_use]
    pub fn location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }
}

/// An authoritative item record as returned by the remote service.
///
/// Carries no `origin`/`sync_status` tags - those are local bookkeeping the
/// engine attaches when merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    /// Server-assigned identifier.
    pub id: ItemId,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Found or lost.
    pub status: ItemStatus,
    /// Where the item was found or last seen.
    pub location: String,
    /// Optional reference to a stored image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Category this item belongs to.
    pub category_id: CategoryId,
    /// Creation time (milliseconds since epoch).
    pub created_at: TimestampMs,
    /// Last update time (milliseconds since epoch).
    pub updated_at: TimestampMs,
}

/// An item category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Display color (hex string).
    pub color: String,
    /// Icon name.
    pub icon: String,
}

impl Category {
    /// The default categories seeded into an empty store.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        let seed = [
            (1, "Electronics", "#2196F3", "phone"),
            (2, "Clothing", "#4CAF50", "tshirt"),
            (3, "Books", "#FF9800", "book"),
            (4, "Jewelry", "#9C27B0", "diamond"),
            (5, "Keys", "#F44336", "key"),
            (6, "Documents", "#607D8B", "file"),
            (7, "Other", "#795548", "help-circle"),
        ];
        seed.into_iter()
            .map(|(id, name, color, icon)| Self {
                id,
                name: name.into(),
                color: color.into(),
                icon: icon.into(),
            })
            .collect()
    }
}

/// A cached user record. Users are cached locally but not synced through
/// the offline queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Role, e.g. "admin" or "member".
    pub role: String,
    /// Optional phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Account creation time (milliseconds since epoch).
    pub created_at: TimestampMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ItemDraft {
        ItemDraft::new("Wallet", "Brown leather wallet", ItemStatus::Lost, "Library", 7)
    }

    #[test]
    fn item_from_draft() {
        let item = Item::from_draft(&draft(), -1, 1000);

        assert_eq!(item.id, -1);
        assert_eq!(item.title, "Wallet");
        assert_eq!(item.origin, Origin::Local);
        assert_eq!(item.sync_status, SyncStatus::Pending);
        assert_eq!(item.created_at, 1000);
        assert_eq!(item.updated_at, 1000);
    }

    #[test]
    fn item_from_remote() {
        let remote = RemoteItem {
            id: 501,
            title: "Wallet".into(),
            description: "Brown leather wallet".into(),
            status: ItemStatus::Lost,
            location: "Library".into(),
            image_path: None,
            category_id: 7,
            created_at: 1000,
            updated_at: 2000,
        };

        let item = Item::from_remote(&remote);
        assert_eq!(item.id, 501);
        assert_eq!(item.origin, Origin::Remote);
        assert_eq!(item.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn apply_patch_merges_fields() {
        let mut item = Item::from_draft(&draft(), 1, 1000);
        item.apply_patch(&ItemPatch::location("Cafeteria"), 2000);

        assert_eq!(item.location, "Cafeteria");
        assert_eq!(item.title, "Wallet");
        assert_eq!(item.updated_at, 2000);
    }

    #[test]
    fn empty_patch() {
        assert!(ItemPatch::default().is_empty());
        assert!(!ItemPatch::title("New").is_empty());
    }

    #[test]
    fn drafts_get_distinct_tokens() {
        assert_ne!(draft().client_token, draft().client_token);
    }

    #[test]
    fn sync_status_queued() {
        assert!(SyncStatus::Pending.is_queued());
        assert!(SyncStatus::Failed.is_queued());
        assert!(!SyncStatus::Synced.is_queued());
        assert!(!SyncStatus::Abandoned.is_queued());
    }

    #[test]
    fn default_categories() {
        let defaults = Category::defaults();
        assert_eq!(defaults.len(), 7);
        assert_eq!(defaults[0].name, "Electronics");
        assert_eq!(defaults[6].name, "Other");
    }

    #[test]
    fn serialization_roundtrip() {
        let item = Item::from_draft(&draft(), 1, 1000);
        let json = serde_json::to_string(&item).unwrap();
        let parsed: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(item, parsed);

        // Tags serialize in the wire casing
        assert!(json.contains("\"syncStatus\":\"pending\""));
        assert!(json.contains("\"origin\":\"local\""));
    }
}
