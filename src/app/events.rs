//! Defines the events the engine sends to the UI layer.

use std::path::PathBuf;

use super::view_model::ArchiveView;
use crate::thumbnail::Thumbnail;

/// Events sent from the engine to the UI.
#[derive(Debug)]
pub enum EngineEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<ArchiveView>),
    /// A failure the user should see, with context for guidance text.
    ShowError {
        message: String,
        operation: Option<&'static str>,
        path: Option<PathBuf>,
    },
    /// A preview finished for an item still in the listing.
    ThumbnailReady { path: PathBuf, thumbnail: Thumbnail },
}
