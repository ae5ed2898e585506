//! Provides text and tag filtering for a listing that keeps documents and
//! the folders extracted from them together.

use super::Item;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// The active filter criteria for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub query: String,
    pub tag_id: Option<String>,
}

impl SearchFilter {
    pub fn new(query: impl Into<String>, tag_id: Option<String>) -> Self {
        Self {
            query: query.into(),
            tag_id,
        }
    }

    /// `true` when neither a text query nor a tag filter is set.
    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.tag_id.is_none()
    }

    /// The lowercased query to match, or `None` for a blank query.
    ///
    /// Only a whitespace-only query is treated as blank. Otherwise leading,
    /// trailing and inner spaces all take part in the match.
    fn needle(&self) -> Option<String> {
        if self.query.trim().is_empty() {
            None
        } else {
            Some(self.query.to_lowercase())
        }
    }
}

/// Bidirectional links between PDF items and extraction folders whose
/// `parent_document_name` equals the PDF's name, ignoring case.
///
/// The relation is derived from names only. A folder whose parent name
/// matches no PDF in the listing is simply unlinked.
#[derive(Debug, Default)]
pub struct DocumentRelations {
    folders_by_document: HashMap<PathBuf, Vec<PathBuf>>,
    document_by_folder: HashMap<PathBuf, PathBuf>,
}

impl DocumentRelations {
    pub fn build(items: &[Item]) -> Self {
        // First PDF wins when several share a name.
        let mut pdf_by_name: HashMap<String, &Path> = HashMap::new();
        for item in items.iter().filter(|i| i.is_pdf()) {
            pdf_by_name
                .entry(item.name.to_lowercase())
                .or_insert(item.path.as_path());
        }

        let mut relations = Self::default();
        for folder in items.iter().filter(|i| i.is_folder) {
            let Some(parent_name) = &folder.parent_document_name else {
                continue;
            };
            if let Some(doc_path) = pdf_by_name.get(&parent_name.to_lowercase()) {
                relations
                    .folders_by_document
                    .entry(doc_path.to_path_buf())
                    .or_default()
                    .push(folder.path.clone());
                relations
                    .document_by_folder
                    .insert(folder.path.clone(), doc_path.to_path_buf());
            }
        }
        relations
    }

    pub fn linked_folders(&self, document: &Path) -> &[PathBuf] {
        self.folders_by_document
            .get(document)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn linked_document(&self, folder: &Path) -> Option<&Path> {
        self.document_by_folder.get(folder).map(PathBuf::as_path)
    }
}

/// A stateless helper for filtering listings.
pub struct SearchEngine;

impl SearchEngine {
    /// Returns the items of `items` that match `filter`, in their original order.
    ///
    /// A matching PDF pulls in all of its linked folders and a matching folder
    /// pulls in its linked PDF, so search never separates the two.
    pub fn filter_items(items: &[Item], filter: &SearchFilter) -> Vec<Item> {
        if filter.is_empty() {
            return items.to_vec();
        }

        let relations = DocumentRelations::build(items);
        let tags_by_path: HashMap<&Path, Option<&str>> = items
            .iter()
            .map(|i| (i.path.as_path(), i.tag_id.as_deref()))
            .collect();
        let needle = filter.needle();

        let mut matched: HashSet<&Path> = HashSet::new();
        for item in items {
            if !Self::matches_query(item, needle.as_deref()) {
                continue;
            }
            if let Some(wanted) = filter.tag_id.as_deref() {
                let tag = if item.is_folder {
                    relations
                        .linked_document(&item.path)
                        .and_then(|doc| tags_by_path.get(doc).copied().flatten())
                } else {
                    item.tag_id.as_deref()
                };
                if tag != Some(wanted) {
                    continue;
                }
            }
            matched.insert(item.path.as_path());
        }

        let mut closure: HashSet<&Path> = matched.clone();
        for path in &matched {
            let document = relations.linked_document(path).unwrap_or(*path);
            closure.insert(document);
            for folder in relations.linked_folders(document) {
                closure.insert(folder.as_path());
            }
        }

        items
            .iter()
            .filter(|item| closure.contains(item.path.as_path()))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on the item name. `needle` must
    /// already be lowercased.
    fn matches_query(item: &Item, needle: Option<&str>) -> bool {
        needle.map_or(true, |needle| item.name.to_lowercase().contains(needle))
    }
}
