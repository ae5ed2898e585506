//! Normalization of raw host listings before they enter the data model.

use super::{Case, Item};
use crate::utils::file_detection::detect_document_type;

/// Returns `true` for archive bookkeeping entries that must never be shown.
pub fn is_internal_entry(name: &str, hidden_prefix: &str) -> bool {
    !hidden_prefix.is_empty() && name.starts_with(hidden_prefix)
}

/// Drops internal entries and fills in document types the host left out.
///
/// The host's order is kept; it is the default display order.
pub fn normalize_listing(raw: Vec<Item>, hidden_prefix: &str) -> Vec<Item> {
    raw.into_iter()
        .filter(|item| !is_internal_entry(&item.name, hidden_prefix))
        .map(|mut item| {
            if item.is_folder {
                item.doc_type = None;
                item.thumbnail = None;
                item.tag_id = None;
            } else {
                if item.doc_type.is_none() {
                    item.doc_type = Some(detect_document_type(&item.path));
                }
                item.folder_type = None;
                item.parent_document_name = None;
            }
            item
        })
        .collect()
}

/// Drops internal entries and sorts cases alphabetically by name.
pub fn normalize_cases(raw: Vec<Case>, hidden_prefix: &str) -> Vec<Case> {
    let mut cases: Vec<Case> = raw
        .into_iter()
        .filter(|case| !is_internal_entry(&case.name, hidden_prefix))
        .collect();
    cases.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    cases.dedup_by(|a, b| a.path == b.path);
    cases
}
