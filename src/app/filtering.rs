//! This module is responsible for mutating the engine state by applying filters.
//!
//! It takes the `ArchiveState` and recomputes `visible_items` from the raw
//! listing, the search query and the tag filter. The raw listing itself is
//! never reordered or modified here.

use crate::app::state::ArchiveState;
use crate::core::SearchEngine;

/// Applies the current search query and tag filter to the listing.
pub fn apply_filters(state: &mut ArchiveState) {
    state.visible_items = SearchEngine::filter_items(&state.listing, &state.filter());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DocumentType, Item};

    fn state_with_listing() -> ArchiveState {
        let mut state = ArchiveState::default();
        state.listing = vec![
            Item::file("/v/Case1/doc.pdf", DocumentType::Pdf).with_tag("t1"),
            Item::extraction_folder("/v/Case1/doc (pages)", "doc.pdf"),
            Item::file("/v/Case1/notes.txt", DocumentType::Other),
        ];
        state
    }

    #[test]
    fn test_no_filter_shows_everything_in_order() {
        let mut state = state_with_listing();
        apply_filters(&mut state);
        assert_eq!(state.visible_items, state.listing);
    }

    #[test]
    fn test_tag_filter_keeps_document_and_its_folder() {
        let mut state = state_with_listing();
        state.tag_filter = Some("t1".to_string());
        apply_filters(&mut state);

        let visible: Vec<_> = state.visible_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(visible, vec!["doc.pdf", "doc (pages)"]);
        assert_eq!(state.listing.len(), 3, "the raw listing is untouched");
    }

    #[test]
    fn test_query_without_matches_yields_empty_view() {
        let mut state = state_with_listing();
        state.search_query = "nonexistent".to_string();
        apply_filters(&mut state);
        assert!(state.visible_items.is_empty());
    }
}
