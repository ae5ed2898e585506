//! Asynchronous work that feeds the state: listing loads and thumbnail hydration.

use std::path::{Path, PathBuf};

use super::events::EngineEvent;
use super::filtering::apply_filters;
use super::helpers::{surface_error, with_state_and_notify};
use super::proxy::EventProxy;
use super::ArchiveEngine;
use crate::core::listing::normalize_listing;
use crate::core::EngineError;
use crate::thumbnail::Thumbnail;

/// Loads the listing of the current browsing path.
///
/// The target and a load ticket are captured when the request starts. If the
/// user has navigated elsewhere, or a newer load has started, by the time the
/// host answers, the response is discarded and the state is left alone.
pub async fn refresh_listing<P: EventProxy>(engine: &ArchiveEngine<P>) -> Result<(), EngineError> {
    let request = with_state_and_notify(&engine.state, &engine.proxy, |s| {
        match s.navigator.browsing_path() {
            Some(path) => {
                let ticket = s.begin_load(path.clone());
                Some((path, ticket))
            }
            None => {
                s.clear_listing();
                apply_filters(s);
                None
            }
        }
    });
    let Some((target, ticket)) = request else {
        return Ok(());
    };

    tracing::debug!("Loading listing for {:?}", target);
    let result = engine.service.list_directory(&target).await;

    let outcome = {
        let mut state_guard = engine
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        let stale = state_guard.load_generation != ticket
            || state_guard.navigator.browsing_path().as_deref() != Some(target.as_path());
        if stale {
            tracing::debug!("Discarding stale listing for {:?}", target);
            return Ok(());
        }
        state_guard.loading_path = None;
        match result {
            Ok(raw) => {
                let mut listing = normalize_listing(raw, &state_guard.config.hidden_prefix);
                for item in listing.iter_mut().filter(|i| !i.is_folder) {
                    if let Some(thumbnail) = engine.cache.get(&item.path) {
                        item.thumbnail = Some(thumbnail.as_data_uri().to_string());
                    }
                }
                tracing::info!("Listed {} items in {:?}", listing.len(), target);
                state_guard.replace_listing(listing);
                apply_filters(&mut state_guard);
                Ok(())
            }
            Err(e) => Err(EngineError::from_host("list directory", target, e)),
        }
    };

    let view = engine.view();
    engine
        .proxy
        .send_event(EngineEvent::StateUpdate(Box::new(view)));
    outcome.map_err(|e| surface_error(&engine.proxy, e))
}

/// Produces the thumbnail for a listed file and stores it on the item.
///
/// Returns `None` for folders and for paths no longer in the listing.
/// `ThumbnailReady` is only sent if the item is still listed when the
/// thumbnail arrives.
pub async fn request_thumbnail<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    path: &Path,
) -> Option<Thumbnail> {
    let doc_type = {
        let state_guard = engine
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard
            .find_item(path)
            .filter(|item| !item.is_folder)
            .and_then(|item| item.doc_type)
    }?;

    let thumbnail = engine.cache.get_or_generate(path, doc_type).await;

    let stored = engine
        .state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .store_thumbnail(path, thumbnail.as_data_uri());
    if stored {
        engine.proxy.send_event(EngineEvent::ThumbnailReady {
            path: path.to_path_buf(),
            thumbnail: thumbnail.clone(),
        });
    } else {
        tracing::debug!("{:?} left the listing before its thumbnail arrived", path);
    }
    Some(thumbnail)
}

/// Requests thumbnails for every visible file that has none yet.
///
/// Returns the number of thumbnails delivered.
pub async fn hydrate_visible<P: EventProxy>(engine: &ArchiveEngine<P>) -> usize {
    let pending: Vec<PathBuf> = {
        let state_guard = engine
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard
            .visible_items
            .iter()
            .filter(|item| !item.is_folder && item.thumbnail.is_none())
            .map(|item| item.path.clone())
            .collect()
    };

    let mut delivered = 0;
    for path in pending {
        if request_thumbnail(engine, &path).await.is_some() {
            delivered += 1;
        }
    }
    delivered
}

/// Spawns `hydrate_visible` on the runtime.
pub fn spawn_hydration<P: EventProxy>(engine: &ArchiveEngine<P>) -> tokio::task::JoinHandle<usize> {
    let engine = engine.clone();
    tokio::spawn(async move { hydrate_visible(&engine).await })
}
