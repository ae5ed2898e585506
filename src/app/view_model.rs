//! Responsible for transforming the `ArchiveState` into an `ArchiveView`.
//!
//! This module acts as a presentation layer, preparing data specifically for
//! consumption by the UI: breadcrumbs, resolved tags, and the links between
//! documents and the folders extracted from them.

use crate::core::{file_name_of, Case, CategoryTag, DocumentRelations, Item};
use serde::Serialize;
use std::path::PathBuf;

use super::state::ArchiveState;

/// A serializable representation of the engine state for the UI.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveView {
    pub cases: Vec<Case>,
    pub current_case: Option<Case>,
    pub current_folder: Option<PathBuf>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub items: Vec<ItemView>,
    pub total_items: usize,
    pub visible_items: usize,
    pub tags: Vec<CategoryTag>,
    pub search_query: String,
    pub tag_filter: Option<String>,
    pub is_loading: bool,
    pub can_go_back: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Breadcrumb {
    pub name: String,
    pub path: PathBuf,
}

/// A visible item with its tag resolved and its document relation attached.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub tag: Option<CategoryTag>,
    /// For an extraction folder: the PDF it was derived from.
    pub linked_document: Option<PathBuf>,
    /// For a PDF: the extraction folders derived from it.
    pub linked_folders: Vec<PathBuf>,
}

/// Creates the complete `ArchiveView` from the current `ArchiveState`.
pub fn generate_view(state: &ArchiveState) -> ArchiveView {
    let relations = DocumentRelations::build(&state.listing);

    let items = state
        .visible_items
        .iter()
        .map(|item| ItemView {
            tag: state.resolve_tag(item.tag_id.as_deref()).cloned(),
            linked_document: relations
                .linked_document(&item.path)
                .map(|p| p.to_path_buf()),
            linked_folders: relations.linked_folders(&item.path).to_vec(),
            item: item.clone(),
        })
        .collect();

    let current_case = state.navigator.current_case().cloned();
    let breadcrumbs = state
        .navigator
        .breadcrumbs()
        .into_iter()
        .enumerate()
        .map(|(i, path)| Breadcrumb {
            name: match (&current_case, i) {
                (Some(case), 0) => case.name.clone(),
                _ => file_name_of(&path),
            },
            path,
        })
        .collect();

    ArchiveView {
        cases: state.cases.clone(),
        current_folder: state.navigator.current_folder().map(|p| p.to_path_buf()),
        can_go_back: state.navigator.current_folder().is_some(),
        current_case,
        breadcrumbs,
        items,
        total_items: state.listing.len(),
        visible_items: state.visible_items.len(),
        tags: state.tags.clone(),
        search_query: state.search_query.clone(),
        tag_filter: state.tag_filter.clone(),
        is_loading: state.is_loading(),
    }
}
