//! The engine layer: shared state, commands and background tasks.
//!
//! - `state`: the single mutable `ArchiveState` behind a mutex.
//! - `commands`: the operations a UI invokes.
//! - `tasks`: listing loads and thumbnail hydration.
//! - `mutation`: optimistic rename/move records with rollback.
//! - `filtering` / `view_model`: derive what the UI renders.

pub mod commands;
pub mod events;
pub mod filtering;
pub mod helpers;
pub mod mutation;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;
use crate::core::EngineError;
use crate::host::FileService;
use crate::thumbnail::{DocumentRenderer, RenderingGenerator, ThumbnailCache, ThumbnailGenerator};
use proxy::EventProxy;
use state::ArchiveState;
use view_model::{generate_view, ArchiveView};

/// Everything a command needs: the host boundary, the thumbnail cache,
/// the shared state and the channel to the UI.
pub struct ArchiveEngine<P: EventProxy> {
    pub service: Arc<dyn FileService>,
    pub cache: Arc<ThumbnailCache>,
    pub state: Arc<Mutex<ArchiveState>>,
    pub proxy: P,
}

impl<P: EventProxy> Clone for ArchiveEngine<P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            cache: self.cache.clone(),
            state: self.state.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

impl<P: EventProxy> ArchiveEngine<P> {
    /// Builds an engine whose PDFs and videos are rasterized by `renderer`.
    pub fn new(
        service: Arc<dyn FileService>,
        renderer: Arc<dyn DocumentRenderer>,
        proxy: P,
        config: EngineConfig,
    ) -> Self {
        let generator = RenderingGenerator::new(service.clone(), renderer, config.thumbnail_size);
        Self::with_generator(service, Arc::new(generator), proxy, config)
    }

    pub fn with_generator(
        service: Arc<dyn FileService>,
        generator: Arc<dyn ThumbnailGenerator>,
        proxy: P,
        config: EngineConfig,
    ) -> Self {
        let cache = ThumbnailCache::new(
            service.clone(),
            generator,
            config.persisted_types.iter().copied(),
        );
        Self {
            service,
            cache: Arc::new(cache),
            state: Arc::new(Mutex::new(ArchiveState::with_config(config))),
            proxy,
        }
    }

    /// The current view, without notifying the UI.
    pub fn view(&self) -> ArchiveView {
        let state_guard = self
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        generate_view(&state_guard)
    }

    /// Fails fast when the host is unreachable, before any state is touched.
    pub(crate) fn ensure_available(&self, operation: &'static str) -> Result<(), EngineError> {
        if self.service.is_available() {
            Ok(())
        } else {
            Err(helpers::surface_error(
                &self.proxy,
                EngineError::ServiceUnavailable { operation },
            ))
        }
    }
}
