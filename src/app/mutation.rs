//! Optimistic rename and move.
//!
//! A `PendingMutation` applies the expected outcome of a rename or move to
//! the listing, the thumbnail cache and the navigation stack before the host
//! answers. It records everything it touched so that a rejection can put the
//! state back exactly, and a confirmation with a different final path can be
//! reconciled.

use super::filtering::apply_filters;
use super::state::ArchiveState;
use crate::core::{DocumentType, Item};
use crate::thumbnail::{Thumbnail, ThumbnailCache};
use crate::utils::file_detection::detect_document_type;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Rename,
    Move,
}

impl MutationKind {
    pub fn operation(self) -> &'static str {
        match self {
            MutationKind::Rename => "rename",
            MutationKind::Move => "move",
        }
    }
}

#[derive(Debug)]
pub struct PendingMutation {
    kind: MutationKind,
    old_path: PathBuf,
    optimistic_path: PathBuf,
    /// Browsing path and listing generation the optimistic edit was made on.
    /// The listing is only edited back if both still hold.
    listed_in: Option<PathBuf>,
    listing_generation: u64,
    /// Listing position and item as they were before the mutation.
    listing_entry: Option<(usize, Item)>,
    /// Whether the item stayed listed under its optimistic path.
    placed: bool,
    /// Cache entries at or below the old path, and at or below the target.
    moved_entries: Vec<(PathBuf, Thumbnail)>,
    displaced_entries: Vec<(PathBuf, Thumbnail)>,
    /// Navigation entries rewritten from `old_path`.
    route_rewrites: usize,
}

impl PendingMutation {
    /// Applies the optimistic outcome of moving `old_path` to `optimistic_path`.
    pub fn begin(
        kind: MutationKind,
        old_path: &Path,
        optimistic_path: &Path,
        state: &mut ArchiveState,
        cache: &ThumbnailCache,
    ) -> Self {
        let listing_entry = state
            .position_of(old_path)
            .map(|index| (index, state.listing[index].clone()));
        let moved_entries = cache.entries_under(old_path);
        let displaced_entries = cache.entries_under(optimistic_path);

        let mut placed = false;
        if let Some((index, _)) = &listing_entry {
            placed =
                optimistic_path.parent().map(Path::to_path_buf) == state.navigator.browsing_path();
            if placed {
                state.listing[*index].relocate(optimistic_path.to_path_buf());
            } else {
                state.listing.remove(*index);
            }
        }
        cache.rekey(old_path, optimistic_path);
        let route_rewrites = state.navigator.replace_path(old_path, optimistic_path);
        apply_filters(state);

        tracing::debug!(
            "Optimistic {}: {:?} -> {:?}",
            kind.operation(),
            old_path,
            optimistic_path
        );

        Self {
            kind,
            old_path: old_path.to_path_buf(),
            optimistic_path: optimistic_path.to_path_buf(),
            listed_in: state.navigator.browsing_path(),
            listing_generation: state.listing_generation,
            listing_entry,
            placed,
            moved_entries,
            displaced_entries,
            route_rewrites,
        }
    }

    /// `true` if the open folder or a folder above it was rewritten.
    pub fn touches_route(&self) -> bool {
        self.route_rewrites > 0
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn old_path(&self) -> &Path {
        &self.old_path
    }

    pub fn optimistic_path(&self) -> &Path {
        &self.optimistic_path
    }

    /// `true` if the mutated item is a folder, as far as the engine can tell.
    pub fn is_folder(&self) -> bool {
        match &self.listing_entry {
            Some((_, item)) => item.is_folder,
            None => {
                self.touches_route()
                    || self.moved_entries.iter().any(|(path, _)| path != &self.old_path)
            }
        }
    }

    /// The document type of the mutated item, or `None` for a folder.
    pub fn doc_type(&self) -> Option<DocumentType> {
        if self.is_folder() {
            return None;
        }
        let listed = self.listing_entry.as_ref().and_then(|(_, item)| item.doc_type);
        Some(listed.unwrap_or_else(|| detect_document_type(&self.old_path)))
    }

    /// `true` while the listing is still the one the optimistic edit was
    /// applied to: same location, not reloaded or cleared since.
    fn listing_untouched(&self, state: &ArchiveState) -> bool {
        state.listing_generation == self.listing_generation
            && state.navigator.browsing_path() == self.listed_in
    }

    /// Reconciles with the path the host actually produced.
    pub fn settle(self, canonical: &Path, state: &mut ArchiveState, cache: &ThumbnailCache) {
        if canonical != self.optimistic_path {
            tracing::debug!(
                "Host placed {:?} at {:?} instead of {:?}",
                self.old_path,
                canonical,
                self.optimistic_path
            );
            cache.rekey(&self.optimistic_path, canonical);
            state.navigator.replace_path(&self.optimistic_path, canonical);
        }

        if self.listing_untouched(state) {
            if let Some(index) = state.position_of(&self.optimistic_path) {
                state.listing[index].relocate(canonical.to_path_buf());
            }
        } else if let Some(index) = state.position_of(&self.old_path) {
            // A listing loaded while the host was still working shows the
            // item where it used to be.
            let stays_listed =
                canonical.parent().map(Path::to_path_buf) == state.navigator.browsing_path();
            if stays_listed && state.position_of(canonical).is_none() {
                state.listing[index].relocate(canonical.to_path_buf());
            } else {
                state.listing.remove(index);
            }
        }
        apply_filters(state);
    }

    /// Puts listing, cache and navigation back to their pre-mutation state.
    ///
    /// A listing that was reloaded or replaced while the mutation was in
    /// flight already reflects the host and is left alone.
    pub fn rollback(self, state: &mut ArchiveState, cache: &ThumbnailCache) {
        tracing::debug!(
            "Rolling back {} of {:?}",
            self.kind.operation(),
            self.old_path
        );
        if self.listing_untouched(state) {
            if self.placed {
                if let Some(index) = state.position_of(&self.optimistic_path) {
                    state.listing.remove(index);
                }
            }
            if let Some((index, item)) = self.listing_entry {
                if state.position_of(&self.old_path).is_none() {
                    let index = index.min(state.listing.len());
                    state.listing.insert(index, item);
                }
            }
        } else {
            tracing::debug!(
                "Listing changed while {:?} was pending; keeping the newer one",
                self.old_path
            );
        }

        cache.restore_under(&self.optimistic_path, self.displaced_entries);
        cache.restore_under(&self.old_path, self.moved_entries);

        if self.route_rewrites > 0 {
            state
                .navigator
                .replace_path(&self.optimistic_path, &self.old_path);
        }
        apply_filters(state);
    }
}
