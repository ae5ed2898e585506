//! Defines the central, mutable state of the archive engine.

use crate::config::EngineConfig;
use crate::core::{Case, CategoryTag, Item, Navigator, SearchFilter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Holds the complete, mutable state of the engine.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` so that commands and the
/// completions of host calls can update it from different tasks. The lock is
/// never held across a host call.
pub struct ArchiveState {
    /// The engine's configuration settings.
    pub config: EngineConfig,
    /// All known cases, sorted by name.
    pub cases: Vec<Case>,
    /// All known category tags.
    pub tags: Vec<CategoryTag>,
    /// Current case, current folder and the folders visited on the way down.
    pub navigator: Navigator,
    /// The raw listing of the current browsing path, in host order.
    pub listing: Vec<Item>,
    /// The listing after search and tag filtering.
    pub visible_items: Vec<Item>,
    /// The current free-text query.
    pub search_query: String,
    /// The selected tag filter, if any.
    pub tag_filter: Option<String>,
    /// The path of the listing request in flight, if any.
    pub loading_path: Option<PathBuf>,
    /// Ticket of the most recently started listing request. Only the holder
    /// of the current ticket may write its result.
    pub load_generation: u64,
    /// Bumped whenever `listing` is replaced or cleared as a whole.
    pub listing_generation: u64,
    /// Paths with a rename, move or delete in flight.
    pub mutations_in_flight: HashSet<PathBuf>,
}

impl Default for ArchiveState {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl ArchiveState {
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            cases: Vec::new(),
            tags: Vec::new(),
            navigator: Navigator::new(),
            listing: Vec::new(),
            visible_items: Vec::new(),
            search_query: String::new(),
            tag_filter: None,
            loading_path: None,
            load_generation: 0,
            listing_generation: 0,
            mutations_in_flight: HashSet::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading_path.is_some()
    }

    pub fn filter(&self) -> SearchFilter {
        SearchFilter::new(self.search_query.clone(), self.tag_filter.clone())
    }

    /// Drops the listing of the previous location.
    pub fn clear_listing(&mut self) {
        self.listing.clear();
        self.visible_items.clear();
        self.loading_path = None;
        self.listing_generation += 1;
    }

    /// Marks a listing request for `path` as started and returns its ticket.
    pub fn begin_load(&mut self, path: PathBuf) -> u64 {
        self.loading_path = Some(path);
        self.load_generation += 1;
        self.load_generation
    }

    /// Installs a fresh listing from the host.
    pub fn replace_listing(&mut self, listing: Vec<Item>) {
        self.listing = listing;
        self.listing_generation += 1;
    }

    pub fn reset_search(&mut self) {
        self.search_query.clear();
        self.tag_filter = None;
    }

    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.listing.iter().position(|item| item.path == path)
    }

    pub fn find_item(&self, path: &Path) -> Option<&Item> {
        self.listing.iter().find(|item| item.path == path)
    }

    pub fn find_case_mut(&mut self, path: &Path) -> Option<&mut Case> {
        self.cases.iter_mut().find(|case| case.path == path)
    }

    /// Resolves a tag id. Ids of deleted tags resolve to `None`.
    pub fn resolve_tag(&self, id: Option<&str>) -> Option<&CategoryTag> {
        let id = id?;
        self.tags.iter().find(|tag| tag.id == id)
    }

    /// Writes `thumbnail` into the listing and visible entries for `path`.
    ///
    /// Returns `false` if the item is no longer listed.
    pub fn store_thumbnail(&mut self, path: &Path, thumbnail: &str) -> bool {
        let mut stored = false;
        for item in self
            .listing
            .iter_mut()
            .chain(self.visible_items.iter_mut())
            .filter(|item| item.path == path)
        {
            item.thumbnail = Some(thumbnail.to_string());
            stored = true;
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DocumentType;

    #[test]
    fn test_dangling_tag_resolves_to_none() {
        let mut state = ArchiveState::default();
        state.tags.push(CategoryTag {
            id: "t1".to_string(),
            name: "Urgent".to_string(),
            color: "#f00".to_string(),
        });
        assert_eq!(state.resolve_tag(Some("t1")).map(|t| t.name.as_str()), Some("Urgent"));
        assert!(state.resolve_tag(Some("deleted")).is_none());
        assert!(state.resolve_tag(None).is_none());
    }

    #[test]
    fn test_store_thumbnail_updates_both_lists() {
        let mut state = ArchiveState::default();
        let item = Item::file("/v/Case1/a.pdf", DocumentType::Pdf);
        state.listing.push(item.clone());
        state.visible_items.push(item);

        assert!(state.store_thumbnail(Path::new("/v/Case1/a.pdf"), "data:x"));
        assert_eq!(state.listing[0].thumbnail.as_deref(), Some("data:x"));
        assert_eq!(state.visible_items[0].thumbnail.as_deref(), Some("data:x"));
        assert!(!state.store_thumbnail(Path::new("/v/Case1/gone.pdf"), "data:x"));
    }

    #[test]
    fn test_each_load_gets_a_newer_ticket() {
        let mut state = ArchiveState::default();
        let first = state.begin_load(PathBuf::from("/v/Case1"));
        let second = state.begin_load(PathBuf::from("/v/Case1"));

        assert!(second > first);
        assert_eq!(state.load_generation, second);
        assert_eq!(state.loading_path, Some(PathBuf::from("/v/Case1")));
    }

    #[test]
    fn test_replacing_or_clearing_the_listing_bumps_its_generation() {
        let mut state = ArchiveState::default();
        let start = state.listing_generation;

        state.replace_listing(vec![Item::file("/v/Case1/a.pdf", DocumentType::Pdf)]);
        assert_eq!(state.listing_generation, start + 1);

        state.listing.push(Item::folder("/v/Case1/new"));
        assert_eq!(state.listing_generation, start + 1);

        state.clear_listing();
        assert_eq!(state.listing_generation, start + 2);
    }
}
