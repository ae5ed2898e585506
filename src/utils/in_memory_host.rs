//! In-memory stand-ins for the host process and the thumbnail generator.
//!
//! Compiled for this crate's own tests and, behind the `test-helpers`
//! feature, for downstream integration tests.

use crate::app::events::EngineEvent;
use crate::app::view_model::ArchiveView;
use crate::app::ArchiveEngine;
use crate::config::EngineConfig;
use crate::core::{Case, CategoryTag, DocumentLocation, DocumentType, EngineError, HostError, Item};
use crate::host::{FileService, HostResult, MutationResult};
use crate::thumbnail::{Thumbnail, ThumbnailGenerator};
use crate::utils::file_detection::detect_document_type;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Default)]
struct HostData {
    cases: Vec<Case>,
    dirs: HashMap<PathBuf, Vec<Item>>,
    tags: Vec<CategoryTag>,
    persisted: HashMap<PathBuf, Thumbnail>,
    locations: HashMap<PathBuf, DocumentLocation>,
    failures: HashMap<&'static str, String>,
    placements: HashMap<PathBuf, PathBuf>,
    listing_delays: HashMap<PathBuf, Duration>,
    next_listing_delays: HashMap<PathBuf, Duration>,
    mutation_delay: Option<Duration>,
    next_tag: usize,
}

/// An in-memory stand-in for the host process.
///
/// Directories are plain vectors of items. Operations can be made to fail by
/// name (`"list"`, `"rename"`, `"move"`, `"delete"`, ...), listings can be
/// delayed per directory, and the whole service can be taken offline.
pub struct InMemoryFileService {
    data: Mutex<HostData>,
    available: AtomicBool,
    thumbnail_requests: AtomicUsize,
    listing_requests: AtomicUsize,
}

impl Default for InMemoryFileService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFileService {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HostData::default()),
            available: AtomicBool::new(true),
            thumbnail_requests: AtomicUsize::new(0),
            listing_requests: AtomicUsize::new(0),
        }
    }

    fn data(&self) -> MutexGuard<'_, HostData> {
        self.data
            .lock()
            .expect("Mutex was poisoned. This should not happen.")
    }

    /// Fails with `Unavailable` when offline, or with the configured rejection for `operation`.
    fn check(&self, operation: &'static str) -> HostResult<MutexGuard<'_, HostData>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable);
        }
        let data = self.data();
        if let Some(message) = data.failures.get(operation) {
            return Err(HostError::Rejected(message.clone()));
        }
        Ok(data)
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn add_case(&self, path: impl Into<PathBuf>, name: &str) {
        let path = path.into();
        let mut data = self.data();
        data.dirs.entry(path.clone()).or_default();
        data.cases.push(Case::new(path, name));
    }

    pub fn add_item(&self, dir: impl Into<PathBuf>, item: Item) {
        let mut data = self.data();
        if item.is_folder {
            data.dirs.entry(item.path.clone()).or_default();
        }
        data.dirs.entry(dir.into()).or_default().push(item);
    }

    pub fn add_tag(&self, id: &str, name: &str, color: &str) {
        self.data().tags.push(CategoryTag {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        });
    }

    pub fn listing(&self, dir: &Path) -> Vec<Item> {
        self.data().dirs.get(dir).cloned().unwrap_or_default()
    }

    pub fn fail(&self, operation: &'static str, message: &str) {
        self.data().failures.insert(operation, message.to_string());
    }

    /// Makes the next rename or move of `path` land on `canonical`.
    pub fn place_at(&self, path: impl Into<PathBuf>, canonical: impl Into<PathBuf>) {
        self.data().placements.insert(path.into(), canonical.into());
    }

    pub fn delay_listing(&self, dir: impl Into<PathBuf>, delay: Duration) {
        self.data().listing_delays.insert(dir.into(), delay);
    }

    /// Delays only the next listing of `dir`. Listings are read when the
    /// request arrives, so a delayed answer carries the older contents.
    pub fn delay_next_listing(&self, dir: impl Into<PathBuf>, delay: Duration) {
        self.data().next_listing_delays.insert(dir.into(), delay);
    }

    /// Makes rename, move and delete take `delay` before answering.
    pub fn delay_mutations(&self, delay: Duration) {
        self.data().mutation_delay = Some(delay);
    }

    async fn pause_for_mutation(&self) {
        let delay = self.data().mutation_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn locate(&self, document: impl Into<PathBuf>, location: DocumentLocation) {
        self.data().locations.insert(document.into(), location);
    }

    pub fn persist(&self, path: impl Into<PathBuf>, thumbnail: Thumbnail) {
        self.data().persisted.insert(path.into(), thumbnail);
    }

    pub fn persisted(&self, path: &Path) -> Option<Thumbnail> {
        self.data().persisted.get(path).cloned()
    }

    pub fn thumbnail_requests(&self) -> usize {
        self.thumbnail_requests.load(Ordering::SeqCst)
    }

    pub fn listing_requests(&self) -> usize {
        self.listing_requests.load(Ordering::SeqCst)
    }

    fn relocate(data: &mut HostData, from: &Path, to: &Path) -> HostResult<()> {
        let dest = to.parent().unwrap_or(to).to_path_buf();
        let taken = data
            .dirs
            .get(&dest)
            .is_some_and(|items| items.iter().any(|item| item.path == to));
        if taken && from != to {
            return Err(HostError::Rejected("target already exists".to_string()));
        }
        let parent = from.parent().unwrap_or(from).to_path_buf();
        let siblings = data.dirs.entry(parent).or_default();
        let index = siblings
            .iter()
            .position(|item| item.path == from)
            .ok_or_else(|| HostError::Rejected("no such file".to_string()))?;
        if dest.as_path() == from.parent().unwrap_or(from) {
            siblings[index].relocate(to.to_path_buf());
        } else {
            let mut item = siblings.remove(index);
            item.relocate(to.to_path_buf());
            data.dirs.entry(dest).or_default().push(item);
        }

        let moved: Vec<PathBuf> = data
            .dirs
            .keys()
            .filter(|dir| dir.starts_with(from))
            .cloned()
            .collect();
        for dir in moved {
            if let (Some(items), Ok(rest)) = (data.dirs.remove(&dir), dir.strip_prefix(from)) {
                let new_dir = if rest.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(rest)
                };
                let items = items
                    .into_iter()
                    .map(|mut item| {
                        if let Some(name) = item.path.file_name().map(|n| n.to_os_string()) {
                            item.relocate(new_dir.join(name));
                        }
                        item
                    })
                    .collect();
                data.dirs.insert(new_dir, items);
            }
        }
        Ok(())
    }

    fn mutate(
        &self,
        operation: &'static str,
        path: &Path,
        target: PathBuf,
    ) -> HostResult<MutationResult> {
        let mut data = match self.check(operation) {
            Ok(data) => data,
            Err(HostError::Rejected(message)) => return Ok(MutationResult::failed(message)),
            Err(e) => return Err(e),
        };
        let target = data.placements.remove(path).unwrap_or(target);
        match Self::relocate(&mut data, path, &target) {
            Ok(()) => Ok(MutationResult::succeeded(target)),
            Err(e) => Ok(MutationResult::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl FileService for InMemoryFileService {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn list_cases(&self) -> HostResult<Vec<Case>> {
        Ok(self.check("list cases")?.cases.clone())
    }

    async fn list_directory(&self, path: &Path) -> HostResult<Vec<Item>> {
        self.listing_requests.fetch_add(1, Ordering::SeqCst);
        let (listing, delay) = {
            let mut data = self.check("list")?;
            let delay = data
                .next_listing_delays
                .remove(path)
                .or_else(|| data.listing_delays.get(path).copied());
            (data.dirs.get(path).cloned(), delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        listing.ok_or_else(|| HostError::Rejected("no such directory".to_string()))
    }

    async fn create_case(
        &self,
        name: &str,
        description: Option<&str>,
        tag_id: Option<&str>,
    ) -> HostResult<PathBuf> {
        let mut data = self.check("create case")?;
        let path = PathBuf::from("/archive").join(name);
        let mut case = Case::new(path.clone(), name);
        case.description = description.map(str::to_string);
        case.tag_id = tag_id.map(str::to_string);
        data.cases.push(case);
        data.dirs.entry(path.clone()).or_default();
        Ok(path)
    }

    async fn create_folder(&self, parent: &Path, name: &str) -> HostResult<PathBuf> {
        let mut data = self.check("create folder")?;
        let path = parent.join(name);
        data.dirs.entry(path.clone()).or_default();
        data.dirs
            .entry(parent.to_path_buf())
            .or_default()
            .push(Item::folder(path.clone()));
        Ok(path)
    }

    async fn delete_case(&self, path: &Path) -> HostResult<()> {
        let mut data = self.check("delete case")?;
        data.cases.retain(|c| c.path != path);
        data.dirs.retain(|dir, _| !dir.starts_with(path));
        Ok(())
    }

    async fn delete_file(&self, path: &Path, _is_folder: bool) -> HostResult<()> {
        self.pause_for_mutation().await;
        let mut data = self.check("delete")?;
        for items in data.dirs.values_mut() {
            items.retain(|item| item.path != path);
        }
        data.dirs.retain(|dir, _| !dir.starts_with(path));
        Ok(())
    }

    async fn rename_file(&self, path: &Path, new_name: &str) -> HostResult<MutationResult> {
        self.pause_for_mutation().await;
        self.mutate("rename", path, path.with_file_name(new_name))
    }

    async fn move_file_to_folder(
        &self,
        path: &Path,
        dest_folder: &Path,
    ) -> HostResult<MutationResult> {
        self.pause_for_mutation().await;
        let name = path.file_name().unwrap_or_default();
        self.mutate("move", path, dest_folder.join(name))
    }

    async fn add_files(
        &self,
        case_path: &Path,
        file_paths: Option<&[PathBuf]>,
    ) -> HostResult<Vec<PathBuf>> {
        let mut data = self.check("add files")?;
        let mut added = Vec::new();
        for source in file_paths.unwrap_or_default() {
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = case_path.join(name);
            data.dirs
                .entry(case_path.to_path_buf())
                .or_default()
                .push(Item::file(target.clone(), detect_document_type(&target)));
            added.push(target);
        }
        Ok(added)
    }

    async fn update_case_background(
        &self,
        case_path: &Path,
        image_path: Option<&Path>,
    ) -> HostResult<Option<String>> {
        let mut data = self.check("set background")?;
        let stored = image_path.map(|p| p.display().to_string());
        if let Some(case) = data.cases.iter_mut().find(|c| c.path == case_path) {
            case.background_image = stored.clone();
        }
        Ok(stored)
    }

    async fn get_file_thumbnail(&self, path: &Path) -> HostResult<Thumbnail> {
        self.thumbnail_requests.fetch_add(1, Ordering::SeqCst);
        self.check("thumbnail")?;
        Ok(Thumbnail::from_data_uri(format!("data:host,{}", path.display())))
    }

    async fn read_persisted_thumbnail(&self, path: &Path) -> HostResult<Option<Thumbnail>> {
        Ok(self.check("read thumbnail")?.persisted.get(path).cloned())
    }

    async fn save_persisted_thumbnail(&self, path: &Path, thumbnail: &Thumbnail) -> HostResult<()> {
        self.check("save thumbnail")?
            .persisted
            .insert(path.to_path_buf(), thumbnail.clone());
        Ok(())
    }

    async fn delete_persisted_thumbnail(&self, path: &Path) -> HostResult<()> {
        self.check("delete thumbnail")?.persisted.remove(path);
        Ok(())
    }

    async fn set_category_tag(&self, target: &Path, tag_id: Option<&str>) -> HostResult<()> {
        let mut data = self.check("tag")?;
        let tag_id = tag_id.map(str::to_string);
        for item in data.dirs.values_mut().flatten().filter(|i| i.path == target) {
            item.tag_id = tag_id.clone();
        }
        if let Some(case) = data.cases.iter_mut().find(|c| c.path == target) {
            case.tag_id = tag_id;
        }
        Ok(())
    }

    async fn get_category_tags(&self) -> HostResult<Vec<CategoryTag>> {
        Ok(self.check("list tags")?.tags.clone())
    }

    async fn create_category_tag(&self, name: &str, color: &str) -> HostResult<CategoryTag> {
        let mut data = self.check("create tag")?;
        data.next_tag += 1;
        let tag = CategoryTag {
            id: format!("tag-{}", data.next_tag),
            name: name.to_string(),
            color: color.to_string(),
        };
        data.tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete_category_tag(&self, id: &str) -> HostResult<()> {
        self.check("delete tag")?.tags.retain(|t| t.id != id);
        Ok(())
    }

    async fn find_document_across_cases(
        &self,
        path: &Path,
    ) -> HostResult<Option<DocumentLocation>> {
        Ok(self.check("find document")?.locations.get(path).cloned())
    }
}

/// A generator that succeeds after `delay` and counts its invocations.
pub struct CountingGenerator {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailGenerator for CountingGenerator {
    async fn generate(
        &self,
        path: &Path,
        _doc_type: DocumentType,
    ) -> Result<Thumbnail, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Thumbnail::from_data_uri(format!("data:gen,{}", path.display())))
    }
}

pub type TestEngine = ArchiveEngine<UnboundedSender<EngineEvent>>;

/// An engine over `service` whose events land in the returned receiver.
pub fn test_engine(
    service: Arc<InMemoryFileService>,
    generator: Arc<CountingGenerator>,
) -> (TestEngine, UnboundedReceiver<EngineEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let engine = ArchiveEngine::with_generator(service, generator, tx, EngineConfig::default());
    (engine, rx)
}

/// Takes every event sent so far without waiting.
pub fn drain_events(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The most recent `StateUpdate` among the pending events.
pub fn last_state_update(rx: &mut UnboundedReceiver<EngineEvent>) -> Option<Box<ArchiveView>> {
    drain_events(rx)
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::StateUpdate(view) => Some(view),
            _ => None,
        })
        .last()
}

/// The messages of every `ShowError` among the pending events.
pub fn error_messages(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<String> {
    drain_events(rx)
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::ShowError { message, .. } => Some(message),
            _ => None,
        })
        .collect()
}
