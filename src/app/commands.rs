//! Contains all the command handlers a UI invokes.
//!
//! Each handler validates its input, talks to the host through the engine's
//! `FileService`, and updates the `ArchiveState`. Every state change is
//! followed by a `StateUpdate` event. Failures are sent as `ShowError` events
//! and also returned to the caller.

use std::path::{Path, PathBuf};

use super::filtering::apply_filters;
use super::helpers::{surface_error, with_state_and_notify, MutationGuard};
use super::mutation::{MutationKind, PendingMutation};
use super::proxy::EventProxy;
use super::state::ArchiveState;
use super::tasks::refresh_listing;
use super::ArchiveEngine;
use crate::config;
use crate::core::listing::normalize_cases;
use crate::core::{file_name_of, Case, CategoryTag, EngineError, Item};
use crate::host::{HostResult, MutationResult};

/// Loads cases and tags, then reopens the last case if configured to.
pub async fn initialize<P: EventProxy>(engine: &ArchiveEngine<P>) -> Result<(), EngineError> {
    load_cases(engine).await?;
    if let Err(e) = load_tags(engine).await {
        tracing::warn!("Starting without category tags: {}", e);
    }

    let reopen = {
        let state_guard = engine
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        let config = &state_guard.config;
        config
            .last_case
            .clone()
            .filter(|_| config.auto_open_last_case)
            .filter(|last| state_guard.cases.iter().any(|c| &c.path == last))
    };
    if let Some(case_path) = reopen {
        tracing::info!("Reopening last case {:?}", case_path);
        select_case(engine, Some(&case_path)).await?;
    }
    Ok(())
}

/// Writes the engine configuration to `dir`, or the default config directory.
pub fn save_settings<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    dir: Option<&Path>,
) -> anyhow::Result<()> {
    let config = engine
        .state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .config
        .clone();
    config::settings::save_config(&config, dir)
}

// --- Cases ---

pub async fn load_cases<P: EventProxy>(engine: &ArchiveEngine<P>) -> Result<(), EngineError> {
    engine.ensure_available("list cases")?;
    let raw = engine.service.list_cases().await.map_err(|e| {
        surface_error(&engine.proxy, EngineError::from_host("list cases", "", e))
    })?;

    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        s.cases = normalize_cases(raw, &s.config.hidden_prefix);
        let current = s.navigator.current_case().map(|c| c.path.clone());
        if let Some(case) = current.and_then(|p| s.cases.iter().find(|c| c.path == p).cloned()) {
            s.navigator.update_case(case);
        }
    });
    Ok(())
}

/// Switches to the case at `case_path`, or closes the current case with `None`.
///
/// Folder, stack, listing and search are always reset.
pub async fn select_case<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    case_path: Option<&Path>,
) -> Result<(), EngineError> {
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        let case = case_path.map(|path| {
            s.cases
                .iter()
                .find(|c| c.path == path)
                .cloned()
                .unwrap_or_else(|| Case::new(path, file_name_of(path)))
        });
        s.config.last_case = case.as_ref().map(|c| c.path.clone());
        s.navigator.select_case(case);
        s.clear_listing();
        s.reset_search();
        apply_filters(s);
    });
    refresh_listing(engine).await
}

/// Creates a case and opens it.
pub async fn start_case<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    name: &str,
    description: Option<&str>,
    tag_id: Option<&str>,
) -> Result<PathBuf, EngineError> {
    engine.ensure_available("create case")?;
    let name = validate_name("create case", Path::new(name), name)
        .map_err(|e| surface_error(&engine.proxy, e))?;

    let path = engine
        .service
        .create_case(name, description, tag_id)
        .await
        .map_err(|e| surface_error(&engine.proxy, EngineError::from_host("create case", name, e)))?;
    tracing::info!("Created case {:?}", path);

    load_cases(engine).await?;
    select_case(engine, Some(&path)).await?;
    Ok(path)
}

pub async fn delete_case<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    case_path: &Path,
) -> Result<(), EngineError> {
    engine.ensure_available("delete case")?;
    let _guard = MutationGuard::acquire(&engine.state, case_path)
        .map_err(|e| surface_error(&engine.proxy, e))?;

    engine.service.delete_case(case_path).await.map_err(|e| {
        surface_error(&engine.proxy, EngineError::from_host("delete case", case_path, e))
    })?;
    engine.cache.invalidate_prefix(case_path);

    let was_open = with_state_and_notify(&engine.state, &engine.proxy, |s| {
        s.cases.retain(|c| c.path != case_path);
        let was_open = s.navigator.current_case().map(|c| c.path.as_path()) == Some(case_path);
        if was_open {
            s.navigator.select_case(None);
            s.config.last_case = None;
            s.clear_listing();
            apply_filters(s);
        }
        was_open
    });
    tracing::info!("Deleted case {:?} (was open: {})", case_path, was_open);
    Ok(())
}

/// Sets or clears the background image of a case.
pub async fn set_case_background<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    case_path: &Path,
    image_path: Option<&Path>,
) -> Result<Option<String>, EngineError> {
    engine.ensure_available("set background")?;
    let stored = engine
        .service
        .update_case_background(case_path, image_path)
        .await
        .map_err(|e| {
            surface_error(&engine.proxy, EngineError::from_host("set background", case_path, e))
        })?;

    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        update_case_record(s, case_path, |case| case.background_image = stored.clone());
    });
    Ok(stored)
}

fn update_case_record(
    state: &mut ArchiveState,
    case_path: &Path,
    update: impl Fn(&mut Case),
) {
    if let Some(case) = state.find_case_mut(case_path) {
        update(case);
    }
    if let Some(mut current) = state.navigator.current_case().cloned() {
        if current.path == case_path {
            update(&mut current);
            state.navigator.update_case(current);
        }
    }
}

// --- Navigation ---

pub async fn open_folder<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    path: &Path,
) -> Result<(), EngineError> {
    with_state_and_notify(&engine.state, &engine.proxy, |s| -> Result<(), EngineError> {
        s.navigator.open_folder(path)?;
        s.clear_listing();
        Ok(())
    })
    .map_err(|e| surface_error(&engine.proxy, e))?;
    refresh_listing(engine).await
}

pub async fn go_back_to_case<P: EventProxy>(engine: &ArchiveEngine<P>) -> Result<(), EngineError> {
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        s.navigator.go_back_to_case();
        s.clear_listing();
    });
    refresh_listing(engine).await
}

pub async fn go_back_to_parent_folder<P: EventProxy>(
    engine: &ArchiveEngine<P>,
) -> Result<(), EngineError> {
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        s.navigator.go_back_to_parent_folder();
        s.clear_listing();
    });
    refresh_listing(engine).await
}

/// Breadcrumb navigation to any folder on the route, or the case root.
pub async fn navigate_to_folder<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    path: &Path,
) -> Result<(), EngineError> {
    let moved = with_state_and_notify(&engine.state, &engine.proxy, |s| {
        let before = s.navigator.browsing_path();
        s.navigator.navigate_to_folder(path);
        let moved = s.navigator.browsing_path() != before;
        if moved {
            s.clear_listing();
        }
        moved
    });
    if moved {
        refresh_listing(engine).await?;
    }
    Ok(())
}

// --- Search ---

pub fn set_search_query<P: EventProxy>(engine: &ArchiveEngine<P>, query: &str) {
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        s.search_query = query.to_string();
        apply_filters(s);
    });
}

pub fn set_tag_filter<P: EventProxy>(engine: &ArchiveEngine<P>, tag_id: Option<&str>) {
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        s.tag_filter = tag_id.map(str::to_string);
        apply_filters(s);
    });
}

// --- File mutations ---

/// Creates a folder in the current browsing path and lists it without a reload.
pub async fn create_folder<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    name: &str,
) -> Result<PathBuf, EngineError> {
    engine.ensure_available("create folder")?;
    let parent = current_browsing_path(engine, "create folder")?;
    let name = validate_name("create folder", &parent, name)
        .map_err(|e| surface_error(&engine.proxy, e))?;

    let path = engine
        .service
        .create_folder(&parent, name)
        .await
        .map_err(|e| {
            surface_error(
                &engine.proxy,
                EngineError::from_host("create folder", parent.join(name), e),
            )
        })?;

    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        let still_here = s.navigator.browsing_path().as_deref() == Some(parent.as_path());
        if still_here && s.position_of(&path).is_none() {
            s.listing.push(Item::folder(path.clone()));
            apply_filters(s);
        }
    });
    Ok(path)
}

/// Copies files into the current case. `None` lets the host pick the files.
pub async fn add_files<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    file_paths: Option<&[PathBuf]>,
) -> Result<Vec<PathBuf>, EngineError> {
    engine.ensure_available("add files")?;
    let case_path = {
        let state_guard = engine
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard.navigator.current_case().map(|c| c.path.clone())
    }
    .ok_or_else(|| {
        surface_error(
            &engine.proxy,
            EngineError::NoCaseSelected {
                operation: "add files",
            },
        )
    })?;

    let added = engine
        .service
        .add_files(&case_path, file_paths)
        .await
        .map_err(|e| {
            surface_error(&engine.proxy, EngineError::from_host("add files", &case_path, e))
        })?;
    tracing::info!("Added {} files to {:?}", added.len(), case_path);

    let at_case_root = {
        let state_guard = engine
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard.navigator.browsing_path().as_deref() == Some(case_path.as_path())
    };
    if !added.is_empty() && at_case_root {
        refresh_listing(engine).await?;
    }
    Ok(added)
}

/// Renames an item, showing the new name before the host confirms it.
///
/// Returns the final path reported by the host.
pub async fn rename_item<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    path: &Path,
    new_name: &str,
) -> Result<PathBuf, EngineError> {
    engine.ensure_available("rename")?;
    let new_name = validate_name("rename", path, new_name)
        .map_err(|e| surface_error(&engine.proxy, e))?;
    let optimistic = path.with_file_name(new_name);
    if optimistic == path {
        return Ok(optimistic);
    }
    ensure_target_free(engine, "rename", path, &optimistic)?;
    let _guard = MutationGuard::acquire(&engine.state, path)
        .map_err(|e| surface_error(&engine.proxy, e))?;

    let pending = with_state_and_notify(&engine.state, &engine.proxy, |s| {
        PendingMutation::begin(MutationKind::Rename, path, &optimistic, s, &engine.cache)
    });
    let outcome = engine.service.rename_file(path, new_name).await;
    conclude(engine, pending, outcome).await
}

/// Moves an item into `dest_folder`.
///
/// The item leaves the listing immediately unless the destination is the
/// folder being browsed. Returns the final path reported by the host.
pub async fn move_item<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    path: &Path,
    dest_folder: &Path,
) -> Result<PathBuf, EngineError> {
    engine.ensure_available("move")?;
    let Some(name) = path.file_name() else {
        return Err(surface_error(
            &engine.proxy,
            EngineError::MutationRejected {
                operation: "move",
                path: path.to_path_buf(),
                message: "invalid source path".to_string(),
            },
        ));
    };
    if dest_folder.starts_with(path) {
        return Err(surface_error(
            &engine.proxy,
            EngineError::MutationRejected {
                operation: "move",
                path: path.to_path_buf(),
                message: "a folder cannot be moved into itself".to_string(),
            },
        ));
    }
    let optimistic = dest_folder.join(name);
    if optimistic == path {
        return Ok(optimistic);
    }
    ensure_target_free(engine, "move", path, &optimistic)?;
    let _guard = MutationGuard::acquire(&engine.state, path)
        .map_err(|e| surface_error(&engine.proxy, e))?;

    let pending = with_state_and_notify(&engine.state, &engine.proxy, |s| {
        PendingMutation::begin(MutationKind::Move, path, &optimistic, s, &engine.cache)
    });
    let outcome = engine.service.move_file_to_folder(path, dest_folder).await;
    conclude(engine, pending, outcome).await
}

/// Refuses a rename or move onto a path the listing already shows.
fn ensure_target_free<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    operation: &'static str,
    path: &Path,
    target: &Path,
) -> Result<(), EngineError> {
    let taken = engine
        .state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .position_of(target)
        .is_some();
    if taken {
        return Err(surface_error(
            &engine.proxy,
            EngineError::MutationRejected {
                operation,
                path: path.to_path_buf(),
                message: format!("{} already exists", file_name_of(target)),
            },
        ));
    }
    Ok(())
}

/// Settles or rolls back an optimistic rename/move from the host's answer.
async fn conclude<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    pending: PendingMutation,
    outcome: HostResult<MutationResult>,
) -> Result<PathBuf, EngineError> {
    let operation = pending.kind().operation();
    let old_path = pending.old_path().to_path_buf();

    let canonical = match outcome {
        Ok(result) if result.success => Ok(result
            .new_path
            .unwrap_or_else(|| pending.optimistic_path().to_path_buf())),
        Ok(result) => Err(EngineError::MutationRejected {
            operation,
            path: old_path.clone(),
            message: result
                .error
                .unwrap_or_else(|| "the file service reported a failure".to_string()),
        }),
        Err(e) => Err(EngineError::from_host(operation, &old_path, e)),
    };

    match canonical {
        Ok(canonical) => {
            let doc_type = pending.doc_type();
            let touches_route = pending.touches_route();
            with_state_and_notify(&engine.state, &engine.proxy, |s| {
                pending.settle(&canonical, s, &engine.cache)
            });
            match doc_type {
                Some(doc_type) => {
                    engine
                        .cache
                        .rekey_persisted(&old_path, &canonical, doc_type)
                        .await
                }
                None => engine.cache.rekey_persisted_tree(&old_path, &canonical).await,
            }
            tracing::info!("{} {:?} -> {:?}", operation, old_path, canonical);
            if touches_route {
                refresh_listing(engine).await?;
            }
            Ok(canonical)
        }
        Err(err) => {
            with_state_and_notify(&engine.state, &engine.proxy, |s| {
                pending.rollback(s, &engine.cache)
            });
            Err(surface_error(&engine.proxy, err))
        }
    }
}

/// Deletes an item from the listing, or the folder currently open.
///
/// Deleting the open folder (or one above it) steps back out of it and
/// reloads; any other delete just drops the item from the listing.
pub async fn delete_item<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    path: &Path,
) -> Result<(), EngineError> {
    engine.ensure_available("delete")?;
    let (is_folder, doc_type) = {
        let state_guard = engine
            .state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        match state_guard.find_item(path) {
            Some(item) => Some((item.is_folder, item.doc_type)),
            None if state_guard.navigator.is_on_current_route(path) => Some((true, None)),
            None => None,
        }
    }
    .ok_or_else(|| surface_error(&engine.proxy, EngineError::NotFound(path.to_path_buf())))?;
    let _guard = MutationGuard::acquire(&engine.state, path)
        .map_err(|e| surface_error(&engine.proxy, e))?;

    let snapshot = engine.cache.invalidate(path);
    if let Some(doc_type) = doc_type {
        engine.cache.discard_persisted(path, doc_type).await;
    }

    if let Err(e) = engine.service.delete_file(path, is_folder).await {
        engine.cache.restore(path, snapshot);
        return Err(surface_error(
            &engine.proxy,
            EngineError::from_host("delete", path, e),
        ));
    }
    if is_folder {
        engine.cache.invalidate_prefix(path);
    }
    tracing::info!("Deleted {:?}", path);

    let left_folder = with_state_and_notify(&engine.state, &engine.proxy, |s| {
        if s.navigator.is_on_current_route(path) {
            s.navigator.navigate_to_folder(path);
            s.navigator.go_back_to_parent_folder();
            s.clear_listing();
            true
        } else {
            if let Some(index) = s.position_of(path) {
                s.listing.remove(index);
            }
            apply_filters(s);
            false
        }
    });
    if left_folder {
        refresh_listing(engine).await?;
    }
    Ok(())
}

// --- Tags ---

pub async fn load_tags<P: EventProxy>(engine: &ArchiveEngine<P>) -> Result<(), EngineError> {
    engine.ensure_available("list tags")?;
    let tags = engine.service.get_category_tags().await.map_err(|e| {
        surface_error(&engine.proxy, EngineError::from_host("list tags", "", e))
    })?;
    with_state_and_notify(&engine.state, &engine.proxy, |s| s.tags = tags);
    Ok(())
}

pub async fn create_tag<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    name: &str,
    color: &str,
) -> Result<CategoryTag, EngineError> {
    engine.ensure_available("create tag")?;
    let tag = engine
        .service
        .create_category_tag(name, color)
        .await
        .map_err(|e| surface_error(&engine.proxy, EngineError::from_host("create tag", name, e)))?;
    with_state_and_notify(&engine.state, &engine.proxy, |s| s.tags.push(tag.clone()));
    Ok(tag)
}

/// Deletes a tag. Items keep the dangling id, which resolves to no tag.
pub async fn delete_tag<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    tag_id: &str,
) -> Result<(), EngineError> {
    engine.ensure_available("delete tag")?;
    engine
        .service
        .delete_category_tag(tag_id)
        .await
        .map_err(|e| {
            surface_error(&engine.proxy, EngineError::from_host("delete tag", tag_id, e))
        })?;
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        s.tags.retain(|t| t.id != tag_id);
        if s.tag_filter.as_deref() == Some(tag_id) {
            s.tag_filter = None;
            apply_filters(s);
        }
    });
    Ok(())
}

pub async fn set_item_tag<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    path: &Path,
    tag_id: Option<&str>,
) -> Result<(), EngineError> {
    engine.ensure_available("tag")?;
    engine
        .service
        .set_category_tag(path, tag_id)
        .await
        .map_err(|e| surface_error(&engine.proxy, EngineError::from_host("tag", path, e)))?;
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        if let Some(index) = s.position_of(path) {
            if !s.listing[index].is_folder {
                s.listing[index].tag_id = tag_id.map(str::to_string);
            }
        }
        apply_filters(s);
    });
    Ok(())
}

pub async fn set_case_tag<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    case_path: &Path,
    tag_id: Option<&str>,
) -> Result<(), EngineError> {
    engine.ensure_available("tag")?;
    engine
        .service
        .set_category_tag(case_path, tag_id)
        .await
        .map_err(|e| surface_error(&engine.proxy, EngineError::from_host("tag", case_path, e)))?;
    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        update_case_record(s, case_path, |case| case.tag_id = tag_id.map(str::to_string));
    });
    Ok(())
}

// --- Deep links ---

/// Opens the case and folder holding `document`, wherever it lives.
pub async fn reveal_document<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    document: &Path,
) -> Result<(), EngineError> {
    engine.ensure_available("find document")?;
    let already_listed = engine
        .state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .find_item(document)
        .is_some();
    if already_listed {
        return Ok(());
    }

    let location = engine
        .service
        .find_document_across_cases(document)
        .await
        .map_err(|e| {
            surface_error(&engine.proxy, EngineError::from_host("find document", document, e))
        })?
        .ok_or_else(|| {
            surface_error(&engine.proxy, EngineError::NotFound(document.to_path_buf()))
        })?;
    tracing::info!("Revealing {:?} in {:?}", document, location.case_path);

    with_state_and_notify(&engine.state, &engine.proxy, |s| {
        let case = s
            .cases
            .iter()
            .find(|c| c.path == location.case_path)
            .cloned()
            .unwrap_or_else(|| Case::new(&location.case_path, file_name_of(&location.case_path)));
        s.config.last_case = Some(case.path.clone());
        s.navigator.select_case(Some(case));
        if let Some(folder) = location
            .folder_path
            .filter(|f| f.as_path() != location.case_path.as_path())
        {
            s.navigator.jump_to_folder(folder);
        }
        s.clear_listing();
        s.reset_search();
        apply_filters(s);
    });
    refresh_listing(engine).await?;

    let found = engine
        .state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .find_item(document)
        .is_some();
    if found {
        Ok(())
    } else {
        Err(surface_error(
            &engine.proxy,
            EngineError::NotFound(document.to_path_buf()),
        ))
    }
}

// --- Helpers ---

fn current_browsing_path<P: EventProxy>(
    engine: &ArchiveEngine<P>,
    operation: &'static str,
) -> Result<PathBuf, EngineError> {
    engine
        .state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .navigator
        .browsing_path()
        .ok_or_else(|| surface_error(&engine.proxy, EngineError::NoCaseSelected { operation }))
}

/// Trims `name` and rejects names that are empty or would escape the folder.
fn validate_name<'a>(
    operation: &'static str,
    path: &Path,
    name: &'a str,
) -> Result<&'a str, EngineError> {
    let name = name.trim();
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(EngineError::MutationRejected {
            operation,
            path: path.to_path_buf(),
            message: format!("\"{}\" is not a valid name", name),
        });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::EngineEvent;
    use crate::core::DocumentType;
    use crate::utils::in_memory_host::{
        drain_events, error_messages, last_state_update, test_engine, CountingGenerator,
        InMemoryFileService, TestEngine,
    };
    use crate::utils::test_helpers::setup_test_logging;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    const CASE: &str = "/v/Case1";

    /// Harness with one case holding `a.pdf`, `sub/` and `b.jpg`, already open.
    struct TestHarness {
        service: Arc<InMemoryFileService>,
        engine: TestEngine,
        rx: UnboundedReceiver<EngineEvent>,
    }

    impl TestHarness {
        async fn new() -> Self {
            setup_test_logging();
            let service = Arc::new(InMemoryFileService::new());
            service.add_case(CASE, "Case1");
            service.add_item(CASE, Item::file("/v/Case1/a.pdf", DocumentType::Pdf));
            service.add_item(CASE, Item::folder("/v/Case1/sub"));
            service.add_item(CASE, Item::file("/v/Case1/b.jpg", DocumentType::Image));

            let generator = Arc::new(CountingGenerator::new(Duration::ZERO));
            let (engine, mut rx) = test_engine(service.clone(), generator);
            load_cases(&engine).await.unwrap();
            select_case(&engine, Some(Path::new(CASE))).await.unwrap();
            drain_events(&mut rx);
            Self {
                service,
                engine,
                rx,
            }
        }

        fn visible_names(&self) -> Vec<String> {
            self.engine
                .view()
                .items
                .into_iter()
                .map(|i| i.item.name)
                .collect()
        }
    }

    #[tokio::test]
    async fn test_select_case_loads_listing() {
        let mut h = TestHarness::new().await;
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub", "b.jpg"]);

        select_case(&h.engine, None).await.unwrap();
        let view = last_state_update(&mut h.rx).unwrap();
        assert!(view.current_case.is_none());
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_open_folder_without_case_is_rejected() {
        let mut h = TestHarness::new().await;
        select_case(&h.engine, None).await.unwrap();

        let err = open_folder(&h.engine, Path::new("/v/Case1/sub"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoCaseSelected { .. }));
        assert_eq!(error_messages(&mut h.rx), vec!["Please open a case first."]);
    }

    #[tokio::test]
    async fn test_rename_success_keeps_position() {
        let h = TestHarness::new().await;
        let new_path = rename_item(&h.engine, Path::new("/v/Case1/a.pdf"), "c.pdf")
            .await
            .unwrap();
        assert_eq!(new_path, PathBuf::from("/v/Case1/c.pdf"));
        assert_eq!(h.visible_names(), vec!["c.pdf", "sub", "b.jpg"]);
    }

    #[tokio::test]
    async fn test_rename_rejection_rolls_back() {
        let mut h = TestHarness::new().await;
        h.service.fail("rename", "target exists");

        let err = rename_item(&h.engine, Path::new("/v/Case1/a.pdf"), "c.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MutationRejected { .. }));
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub", "b.jpg"]);
        assert_eq!(
            error_messages(&mut h.rx),
            vec!["Could not rename \"a.pdf\": target exists"]
        );
    }

    #[tokio::test]
    async fn test_rename_onto_listed_name_is_rejected_before_host_call() {
        let mut h = TestHarness::new().await;

        let err = rename_item(&h.engine, Path::new("/v/Case1/a.pdf"), "b.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MutationRejected { .. }));
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub", "b.jpg"]);
        assert_eq!(
            error_messages(&mut h.rx),
            vec!["Could not rename \"a.pdf\": b.jpg already exists"]
        );
        assert_eq!(h.service.listing(Path::new(CASE))[0].name, "a.pdf");
    }

    #[tokio::test]
    async fn test_rename_to_blank_name_is_rejected_before_host_call() {
        let h = TestHarness::new().await;
        let err = rename_item(&h.engine, Path::new("/v/Case1/a.pdf"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MutationRejected { .. }));
        assert_eq!(h.service.listing(Path::new(CASE)).len(), 3);
    }

    #[tokio::test]
    async fn test_move_into_subfolder_leaves_listing() {
        let h = TestHarness::new().await;
        move_item(&h.engine, Path::new("/v/Case1/b.jpg"), Path::new("/v/Case1/sub"))
            .await
            .unwrap();
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub"]);
        assert_eq!(h.service.listing(Path::new("/v/Case1/sub")).len(), 1);
    }

    #[tokio::test]
    async fn test_move_folder_into_itself_is_rejected() {
        let h = TestHarness::new().await;
        let err = move_item(
            &h.engine,
            Path::new("/v/Case1/sub"),
            Path::new("/v/Case1/sub/inner"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::MutationRejected { .. }));
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub", "b.jpg"]);
    }

    #[tokio::test]
    async fn test_unavailable_service_fails_before_state_changes() {
        let mut h = TestHarness::new().await;
        h.service.set_available(false);

        let err = rename_item(&h.engine, Path::new("/v/Case1/a.pdf"), "c.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ServiceUnavailable { .. }));
        assert!(last_state_update(&mut h.rx).is_none());
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub", "b.jpg"]);
    }

    #[tokio::test]
    async fn test_delete_item_removes_without_reload() {
        let h = TestHarness::new().await;
        let loads = h.service.listing_requests();
        delete_item(&h.engine, Path::new("/v/Case1/b.jpg"))
            .await
            .unwrap();
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub"]);
        assert_eq!(h.service.listing_requests(), loads);
    }

    #[tokio::test]
    async fn test_delete_unknown_item_is_not_found() {
        let h = TestHarness::new().await;
        let err = delete_item(&h.engine, Path::new("/v/Case1/nope.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_folder_inserts_without_reload() {
        let h = TestHarness::new().await;
        let loads = h.service.listing_requests();
        let path = create_folder(&h.engine, " evidence ").await.unwrap();
        assert_eq!(path, PathBuf::from("/v/Case1/evidence"));
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub", "b.jpg", "evidence"]);
        assert_eq!(h.service.listing_requests(), loads);
    }

    #[tokio::test]
    async fn test_add_files_reloads_case_root() {
        let h = TestHarness::new().await;
        let added = add_files(&h.engine, Some(&[PathBuf::from("/home/u/scan.png")]))
            .await
            .unwrap();
        assert_eq!(added, vec![PathBuf::from("/v/Case1/scan.png")]);
        assert_eq!(h.visible_names(), vec!["a.pdf", "sub", "b.jpg", "scan.png"]);
    }

    #[tokio::test]
    async fn test_tag_lifecycle_and_filter() {
        let h = TestHarness::new().await;
        let tag = create_tag(&h.engine, "Urgent", "#f00").await.unwrap();
        set_item_tag(&h.engine, Path::new("/v/Case1/a.pdf"), Some(&tag.id))
            .await
            .unwrap();

        set_tag_filter(&h.engine, Some(&tag.id));
        assert_eq!(h.visible_names(), vec!["a.pdf"]);
        assert_eq!(
            h.engine.view().items[0].tag.as_ref().map(|t| t.name.as_str()),
            Some("Urgent")
        );

        delete_tag(&h.engine, &tag.id).await.unwrap();
        let view = h.engine.view();
        assert!(view.tag_filter.is_none());
        assert_eq!(view.items.len(), 3);
        assert!(view.items[0].tag.is_none());
        assert_eq!(view.items[0].item.tag_id.as_deref(), Some(tag.id.as_str()));
    }

    #[tokio::test]
    async fn test_set_case_tag_and_background_update_current_case() {
        let h = TestHarness::new().await;
        set_case_tag(&h.engine, Path::new(CASE), Some("t1"))
            .await
            .unwrap();
        let stored = set_case_background(&h.engine, Path::new(CASE), Some(Path::new("/img/bg.png")))
            .await
            .unwrap();

        let view = h.engine.view();
        let current = view.current_case.unwrap();
        assert_eq!(current.tag_id.as_deref(), Some("t1"));
        assert_eq!(current.background_image, stored);
        assert_eq!(view.cases[0].background_image.as_deref(), Some("/img/bg.png"));
    }

    #[tokio::test]
    async fn test_start_case_opens_new_case() {
        let h = TestHarness::new().await;
        let path = start_case(&h.engine, "Case2", Some("fraud"), None)
            .await
            .unwrap();
        let view = h.engine.view();
        assert_eq!(view.current_case.map(|c| c.path), Some(path));
        assert_eq!(view.cases.len(), 2);
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_delete_open_case_closes_it() {
        let h = TestHarness::new().await;
        delete_case(&h.engine, Path::new(CASE)).await.unwrap();
        let view = h.engine.view();
        assert!(view.current_case.is_none());
        assert!(view.cases.is_empty());
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_navigate_to_current_folder_does_not_reload() {
        let h = TestHarness::new().await;
        open_folder(&h.engine, Path::new("/v/Case1/sub")).await.unwrap();
        let loads = h.service.listing_requests();
        navigate_to_folder(&h.engine, Path::new("/v/Case1/sub"))
            .await
            .unwrap();
        assert_eq!(h.service.listing_requests(), loads);
    }

    #[tokio::test]
    async fn test_save_settings_writes_last_case() {
        let h = TestHarness::new().await;
        let dir = tempfile::tempdir().unwrap();
        save_settings(&h.engine, Some(dir.path())).unwrap();
        let loaded = config::settings::load_config(Some(dir.path())).unwrap();
        assert_eq!(loaded.last_case, Some(PathBuf::from(CASE)));
    }
}
