//! Contains helper functions to reduce boilerplate code in other `app` modules.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::events::EngineEvent;
use super::proxy::EventProxy;
use super::state::ArchiveState;
use super::view_model::generate_view;
use crate::core::EngineError;

/// A helper function that locks the `ArchiveState`, performs a mutation,
/// and then automatically sends a `StateUpdate` event to the UI.
///
/// The closure's return value is passed through, so callers can carry
/// decisions made under the lock out of it.
pub fn with_state_and_notify<F, R, P: EventProxy>(
    state: &Arc<Mutex<ArchiveState>>,
    proxy: &P,
    update_fn: F,
) -> R
where
    F: FnOnce(&mut ArchiveState) -> R,
{
    let mut state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");

    let result = update_fn(&mut state_guard);

    let view = generate_view(&state_guard);
    proxy.send_event(EngineEvent::StateUpdate(Box::new(view)));

    result
}

/// Sends the error to the UI and hands it back for the caller to return.
pub fn surface_error<P: EventProxy>(proxy: &P, err: EngineError) -> EngineError {
    tracing::warn!("{}", err);
    proxy.send_event(EngineEvent::ShowError {
        message: err.user_message(),
        operation: err.operation(),
        path: err.path().cloned(),
    });
    err
}

/// Marks a path as being mutated for as long as the guard lives.
pub struct MutationGuard {
    state: Arc<Mutex<ArchiveState>>,
    path: PathBuf,
}

impl MutationGuard {
    /// Fails with `MutationInProgress` if `path` already has a mutation in flight.
    pub fn acquire(state: &Arc<Mutex<ArchiveState>>, path: &Path) -> Result<Self, EngineError> {
        let mut state_guard = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        if !state_guard.mutations_in_flight.insert(path.to_path_buf()) {
            return Err(EngineError::MutationInProgress(path.to_path_buf()));
        }
        Ok(Self {
            state: state.clone(),
            path: path.to_path_buf(),
        })
    }
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        if let Ok(mut state_guard) = self.state.lock() {
            state_guard.mutations_in_flight.remove(&self.path);
        }
    }
}
