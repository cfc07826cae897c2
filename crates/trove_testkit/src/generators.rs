//! Proptest strategies for the data model.

use proptest::prelude::*;
use trove_core::{ItemDraft, ItemPatch, ItemStatus};

/// Strategy over item statuses.
pub fn arb_status() -> impl Strategy<Value = ItemStatus> {
    prop_oneof![Just(ItemStatus::Found), Just(ItemStatus::Lost)]
}

/// Strategy over printable titles (1-24 chars, no control characters).
pub fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,23}"
}

/// Strategy over item drafts.
pub fn arb_draft() -> impl Strategy<Value = ItemDraft> {
    (
        arb_title(),
        "[a-zA-Z0-9 ]{0,40}",
        arb_status(),
        "[a-zA-Z ]{1,20}",
        1i64..=7,
    )
        .prop_map(|(title, description, status, location, category_id)| {
            ItemDraft::new(title, description, status, location, category_id)
        })
}

/// Strategy over non-empty patches.
pub fn arb_patch() -> impl Strategy<Value = ItemPatch> {
    (
        proptest::option::of(arb_title()),
        proptest::option::of("[a-zA-Z0-9 ]{0,40}"),
        proptest::option::of(arb_status()),
        proptest::option::of("[a-zA-Z ]{1,20}"),
    )
        .prop_map(|(title, description, status, location)| ItemPatch {
            title,
            description,
            status,
            location,
            image_path: None,
            category_id: None,
        })
        .prop_filter("patch must change something", |p| !p.is_empty())
}
