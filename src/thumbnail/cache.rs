//! The session-wide thumbnail cache.
//!
//! Two tiers sit in front of the generator: an in-process map keyed by file
//! path, and for expensive types the host's persistent thumbnail store. At
//! most one generation per path is in flight; concurrent callers for the
//! same path await the same result. Entries leave the map only through
//! `invalidate`, `rekey` or one of the restores; there is no size-based
//! eviction.

use super::generator::ThumbnailGenerator;
use super::Thumbnail;
use crate::core::{rebase, DocumentType};
use crate::host::FileService;
use crate::utils::file_detection::detect_document_type;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Persisted,
    Generated,
}

/// The shared result of one generation. `None` means it failed.
type Flight = Arc<OnceCell<Option<(Thumbnail, Origin)>>>;

pub struct ThumbnailCache {
    entries: Mutex<HashMap<PathBuf, Thumbnail>>,
    in_flight: Mutex<HashMap<PathBuf, Flight>>,
    service: Arc<dyn FileService>,
    generator: Arc<dyn ThumbnailGenerator>,
    persisted_types: HashSet<DocumentType>,
}

impl ThumbnailCache {
    pub fn new(
        service: Arc<dyn FileService>,
        generator: Arc<dyn ThumbnailGenerator>,
        persisted_types: impl IntoIterator<Item = DocumentType>,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            service,
            generator,
            persisted_types: persisted_types.into_iter().collect(),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Thumbnail>> {
        self.entries
            .lock()
            .expect("Mutex was poisoned. This should not happen.")
    }

    fn flights(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Flight>> {
        self.in_flight
            .lock()
            .expect("Mutex was poisoned. This should not happen.")
    }

    pub fn is_persisted(&self, doc_type: DocumentType) -> bool {
        self.persisted_types.contains(&doc_type)
    }

    /// The cached thumbnail for `path`, without generating anything.
    pub fn get(&self, path: &Path) -> Option<Thumbnail> {
        self.entries().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Returns the thumbnail for `path`, generating it at most once.
    ///
    /// Never fails: when generation fails the type's placeholder is returned
    /// and nothing is cached, so a later call retries.
    pub async fn get_or_generate(&self, path: &Path, doc_type: DocumentType) -> Thumbnail {
        if let Some(hit) = self.get(path) {
            return hit;
        }

        let flight = {
            let mut flights = self.flights();
            // Re-check under the flight lock: a flight may have committed
            // between the lookup above and now.
            if let Some(hit) = self.get(path) {
                return hit;
            }
            flights
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let outcome = flight
            .get_or_init(|| self.produce(path, doc_type))
            .await
            .clone();

        let committed = self.commit(path, &flight, outcome.as_ref().map(|(t, _)| t));

        match outcome {
            Some((thumbnail, origin)) => {
                if committed && origin == Origin::Generated && self.is_persisted(doc_type) {
                    if let Err(e) = self.service.save_persisted_thumbnail(path, &thumbnail).await {
                        tracing::warn!("Failed to persist thumbnail for {:?}: {}", path, e);
                    }
                }
                thumbnail
            }
            None => Thumbnail::placeholder(doc_type),
        }
    }

    async fn produce(&self, path: &Path, doc_type: DocumentType) -> Option<(Thumbnail, Origin)> {
        if self.is_persisted(doc_type) {
            match self.service.read_persisted_thumbnail(path).await {
                Ok(Some(thumbnail)) => return Some((thumbnail, Origin::Persisted)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to read persisted thumbnail for {:?}: {}", path, e);
                }
            }
        }

        match self.generator.generate(path, doc_type).await {
            Ok(thumbnail) => Some((thumbnail, Origin::Generated)),
            Err(e) => {
                tracing::warn!("Using placeholder thumbnail: {}", e);
                None
            }
        }
    }

    /// Ends `flight` for `path` and stores its result.
    ///
    /// Returns `false` if the flight was already ended by another waiter or
    /// dropped by `invalidate`/`rekey`, in which case nothing is stored.
    fn commit(&self, path: &Path, flight: &Flight, thumbnail: Option<&Thumbnail>) -> bool {
        let mut flights = self.flights();
        let is_current = flights
            .get(path)
            .is_some_and(|current| Arc::ptr_eq(current, flight));
        if !is_current {
            return false;
        }
        flights.remove(path);
        if let Some(thumbnail) = thumbnail {
            self.entries().insert(path.to_path_buf(), thumbnail.clone());
        }
        true
    }

    /// Removes the entry for `path` and discards any in-flight result for it.
    pub fn invalidate(&self, path: &Path) -> Option<Thumbnail> {
        let mut flights = self.flights();
        flights.remove(path);
        self.entries().remove(path)
    }

    /// Removes `path` and every entry below it.
    pub fn invalidate_prefix(&self, prefix: &Path) -> usize {
        let mut flights = self.flights();
        flights.retain(|p, _| !p.starts_with(prefix));
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|p, _| !p.starts_with(prefix));
        before - entries.len()
    }

    /// Moves the in-process entry for `old`, and every entry below it, to the
    /// same place under `new`.
    ///
    /// Entries already at or below `new` are replaced, so no key is ever
    /// duplicated. Generations in flight for either subtree are discarded.
    pub fn rekey(&self, old: &Path, new: &Path) {
        if old == new {
            return;
        }
        let mut flights = self.flights();
        flights.retain(|p, _| !p.starts_with(old) && !p.starts_with(new));
        let mut entries = self.entries();
        let moved = Self::take_under(&mut entries, old);
        entries.retain(|p, _| !p.starts_with(new));
        for (path, thumbnail) in moved {
            if let Some(rebased) = rebase(&path, old, new) {
                entries.insert(rebased, thumbnail);
            }
        }
    }

    fn take_under(
        entries: &mut HashMap<PathBuf, Thumbnail>,
        prefix: &Path,
    ) -> Vec<(PathBuf, Thumbnail)> {
        let keys: Vec<PathBuf> = entries
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|key| entries.remove(&key).map(|thumbnail| (key, thumbnail)))
            .collect()
    }

    /// Copies the entries at or below `prefix`, for a later `restore_under`.
    pub fn entries_under(&self, prefix: &Path) -> Vec<(PathBuf, Thumbnail)> {
        self.entries()
            .iter()
            .filter(|(p, _)| p.starts_with(prefix))
            .map(|(p, t)| (p.clone(), t.clone()))
            .collect()
    }

    /// Replaces everything at or below `prefix` with `snapshot`.
    pub fn restore_under(&self, prefix: &Path, snapshot: Vec<(PathBuf, Thumbnail)>) {
        let mut flights = self.flights();
        flights.retain(|p, _| !p.starts_with(prefix));
        let mut entries = self.entries();
        entries.retain(|p, _| !p.starts_with(prefix));
        entries.extend(snapshot);
    }

    /// Puts `path` back to exactly `snapshot`: present with that image, or absent.
    pub fn restore(&self, path: &Path, snapshot: Option<Thumbnail>) {
        let mut flights = self.flights();
        flights.remove(path);
        let mut entries = self.entries();
        match snapshot {
            Some(thumbnail) => {
                entries.insert(path.to_path_buf(), thumbnail);
            }
            None => {
                entries.remove(path);
            }
        }
    }

    /// Moves a persisted thumbnail from `old` to `new` in the host store.
    ///
    /// Best effort: failures are logged and the next request regenerates.
    pub async fn rekey_persisted(&self, old: &Path, new: &Path, doc_type: DocumentType) {
        if old == new || !self.is_persisted(doc_type) {
            return;
        }
        let moved = async {
            if let Some(thumbnail) = self.service.read_persisted_thumbnail(old).await? {
                self.service.save_persisted_thumbnail(new, &thumbnail).await?;
            }
            self.service.delete_persisted_thumbnail(old).await
        }
        .await;
        if let Err(e) = moved {
            tracing::warn!(
                "Failed to move persisted thumbnail {:?} -> {:?}: {}",
                old,
                new,
                e
            );
        }
    }

    /// Moves the persisted thumbnails of every file below the renamed folder
    /// `new` from their old place under `old`.
    ///
    /// The folder is walked through the host after it has moved, so files
    /// this session never displayed are covered too. Best effort.
    pub async fn rekey_persisted_tree(&self, old: &Path, new: &Path) {
        if old == new || self.persisted_types.is_empty() {
            return;
        }
        let mut pending = vec![new.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let items = match self.service.list_directory(&dir).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Failed to walk {:?} for persisted thumbnails: {}", dir, e);
                    continue;
                }
            };
            for item in items {
                if item.is_folder {
                    pending.push(item.path);
                    continue;
                }
                let doc_type = item
                    .doc_type
                    .unwrap_or_else(|| detect_document_type(&item.path));
                if let Some(previous) = rebase(&item.path, new, old) {
                    self.rekey_persisted(&previous, &item.path, doc_type).await;
                }
            }
        }
    }

    /// Deletes the persisted thumbnail for `path`, logging failures.
    pub async fn discard_persisted(&self, path: &Path, doc_type: DocumentType) {
        if !self.is_persisted(doc_type) {
            return;
        }
        if let Err(e) = self.service.delete_persisted_thumbnail(path).await {
            tracing::warn!("Failed to delete persisted thumbnail for {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Case, CategoryTag, DocumentLocation, EngineError, HostError, Item};
    use crate::host::{HostResult, MutationResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A host double exposing only a persistent thumbnail store and listings.
    #[derive(Default)]
    struct StoreOnlyService {
        store: Mutex<HashMap<PathBuf, Thumbnail>>,
        dirs: Mutex<HashMap<PathBuf, Vec<Item>>>,
        fail_writes: bool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl FileService for StoreOnlyService {
        async fn list_cases(&self) -> HostResult<Vec<Case>> {
            Ok(Vec::new())
        }
        async fn list_directory(&self, path: &Path) -> HostResult<Vec<Item>> {
            Ok(self.dirs.lock().unwrap().get(path).cloned().unwrap_or_default())
        }
        async fn create_case(
            &self,
            _: &str,
            _: Option<&str>,
            _: Option<&str>,
        ) -> HostResult<PathBuf> {
            Err(HostError::Rejected("unsupported".into()))
        }
        async fn create_folder(&self, _: &Path, _: &str) -> HostResult<PathBuf> {
            Err(HostError::Rejected("unsupported".into()))
        }
        async fn delete_case(&self, _: &Path) -> HostResult<()> {
            Ok(())
        }
        async fn delete_file(&self, _: &Path, _: bool) -> HostResult<()> {
            Ok(())
        }
        async fn rename_file(&self, _: &Path, _: &str) -> HostResult<MutationResult> {
            Ok(MutationResult::failed("unsupported"))
        }
        async fn move_file_to_folder(&self, _: &Path, _: &Path) -> HostResult<MutationResult> {
            Ok(MutationResult::failed("unsupported"))
        }
        async fn add_files(&self, _: &Path, _: Option<&[PathBuf]>) -> HostResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }
        async fn update_case_background(
            &self,
            _: &Path,
            _: Option<&Path>,
        ) -> HostResult<Option<String>> {
            Ok(None)
        }
        async fn get_file_thumbnail(&self, _: &Path) -> HostResult<Thumbnail> {
            Err(HostError::Rejected("unsupported".into()))
        }
        async fn read_persisted_thumbnail(&self, path: &Path) -> HostResult<Option<Thumbnail>> {
            Ok(self.store.lock().unwrap().get(path).cloned())
        }
        async fn save_persisted_thumbnail(
            &self,
            path: &Path,
            thumbnail: &Thumbnail,
        ) -> HostResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(HostError::Rejected("disk full".into()));
            }
            self.store
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), thumbnail.clone());
            Ok(())
        }
        async fn delete_persisted_thumbnail(&self, path: &Path) -> HostResult<()> {
            self.store.lock().unwrap().remove(path);
            Ok(())
        }
        async fn set_category_tag(&self, _: &Path, _: Option<&str>) -> HostResult<()> {
            Ok(())
        }
        async fn get_category_tags(&self) -> HostResult<Vec<CategoryTag>> {
            Ok(Vec::new())
        }
        async fn create_category_tag(&self, _: &str, _: &str) -> HostResult<CategoryTag> {
            Err(HostError::Rejected("unsupported".into()))
        }
        async fn delete_category_tag(&self, _: &str) -> HostResult<()> {
            Ok(())
        }
        async fn find_document_across_cases(
            &self,
            _: &Path,
        ) -> HostResult<Option<DocumentLocation>> {
            Ok(None)
        }
    }

    /// Counts invocations and answers after a short delay.
    struct CountingGenerator {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingGenerator {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
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
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(EngineError::Generation {
                    path: path.to_path_buf(),
                    message: "corrupt".to_string(),
                });
            }
            Ok(Thumbnail::from_data_uri(format!("data:test,{}", path.display())))
        }
    }

    fn cache_with(
        service: Arc<StoreOnlyService>,
        generator: Arc<CountingGenerator>,
    ) -> ThumbnailCache {
        ThumbnailCache::new(service, generator, [DocumentType::Pdf])
    }

    #[tokio::test]
    async fn test_concurrent_requests_generate_once() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service, generator.clone());
        let path = Path::new("/v/Case1/doc.pdf");

        let (a, b, c) = tokio::join!(
            cache.get_or_generate(path, DocumentType::Pdf),
            cache.get_or_generate(path, DocumentType::Pdf),
            cache.get_or_generate(path, DocumentType::Pdf),
        );

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_back_to_back_requests_decode_once() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service, generator.clone());
        let path = Path::new("/v/Case1/doc.pdf");

        let first = cache.get_or_generate(path, DocumentType::Pdf).await;
        let second = cache.get_or_generate(path, DocumentType::Pdf).await;

        assert_eq!(first, second);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persisted_hit_skips_generation() {
        let service = Arc::new(StoreOnlyService::default());
        let stored = Thumbnail::from_data_uri("data:stored");
        service
            .store
            .lock()
            .unwrap()
            .insert(PathBuf::from("/v/Case1/doc.pdf"), stored.clone());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service.clone(), generator.clone());

        let thumb = cache
            .get_or_generate(Path::new("/v/Case1/doc.pdf"), DocumentType::Pdf)
            .await;

        assert_eq!(thumb, stored);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.writes.load(Ordering::SeqCst), 0);
        assert!(cache.contains(Path::new("/v/Case1/doc.pdf")));
    }

    #[tokio::test]
    async fn test_generated_pdf_is_written_to_store() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service.clone(), generator);

        let thumb = cache
            .get_or_generate(Path::new("/v/Case1/doc.pdf"), DocumentType::Pdf)
            .await;

        let stored = service
            .store
            .lock()
            .unwrap()
            .get(Path::new("/v/Case1/doc.pdf"))
            .cloned();
        assert_eq!(stored, Some(thumb));
    }

    #[tokio::test]
    async fn test_store_write_failure_keeps_in_process_copy() {
        let service = Arc::new(StoreOnlyService {
            fail_writes: true,
            ..Default::default()
        });
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service.clone(), generator);

        let thumb = cache
            .get_or_generate(Path::new("/v/Case1/doc.pdf"), DocumentType::Pdf)
            .await;

        assert_eq!(service.writes.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(Path::new("/v/Case1/doc.pdf")), Some(thumb));
    }

    #[tokio::test]
    async fn test_images_bypass_the_store() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service.clone(), generator.clone());

        cache
            .get_or_generate(Path::new("/v/Case1/photo.jpg"), DocumentType::Image)
            .await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_returns_uncached_placeholder() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(true));
        let cache = cache_with(service, generator.clone());
        let path = Path::new("/v/Case1/broken.pdf");

        let thumb = cache.get_or_generate(path, DocumentType::Pdf).await;
        assert!(thumb.is_placeholder_for(DocumentType::Pdf));
        assert!(!cache.contains(path));

        cache.get_or_generate(path, DocumentType::Pdf).await;
        assert_eq!(
            generator.calls.load(Ordering::SeqCst),
            2,
            "a failed generation must be retried"
        );
    }

    #[tokio::test]
    async fn test_rekey_moves_entry_without_duplicating() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service, generator);
        let a = Path::new("/v/Case1/a.pdf");
        let b = Path::new("/v/Case1/b.pdf");

        let original = cache.get_or_generate(a, DocumentType::Pdf).await;
        cache.rekey(a, b);

        assert!(!cache.contains(a));
        assert_eq!(cache.get(b), Some(original));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_discards_in_flight_result() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = Arc::new(cache_with(service.clone(), generator));
        let path = PathBuf::from("/v/Case1/doc.pdf");

        let pending = {
            let cache = cache.clone();
            let path = path.clone();
            tokio::spawn(async move { cache.get_or_generate(&path, DocumentType::Pdf).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.invalidate(&path);
        pending.await.unwrap();

        assert!(!cache.contains(&path));
        assert_eq!(service.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_restore_puts_back_snapshot() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service, generator);
        let a = Path::new("/v/Case1/a.pdf");

        let original = cache.get_or_generate(a, DocumentType::Pdf).await;
        cache.invalidate(a);
        cache.restore(a, Some(original.clone()));
        assert_eq!(cache.get(a), Some(original));

        cache.restore(a, None);
        assert!(!cache.contains(a));
    }

    #[tokio::test]
    async fn test_invalidate_prefix_drops_folder_contents() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service, generator);

        cache
            .get_or_generate(Path::new("/v/Case1/sub/a.pdf"), DocumentType::Pdf)
            .await;
        cache
            .get_or_generate(Path::new("/v/Case1/keep.pdf"), DocumentType::Pdf)
            .await;

        assert_eq!(cache.invalidate_prefix(Path::new("/v/Case1/sub")), 1);
        assert!(cache.contains(Path::new("/v/Case1/keep.pdf")));
    }

    #[tokio::test]
    async fn test_rekey_persisted_moves_store_entry() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service.clone(), generator);
        let a = Path::new("/v/Case1/a.pdf");
        let b = Path::new("/v/Case1/b.pdf");

        let thumb = cache.get_or_generate(a, DocumentType::Pdf).await;
        cache.rekey_persisted(a, b, DocumentType::Pdf).await;

        let store = service.store.lock().unwrap();
        assert!(!store.contains_key(a));
        assert_eq!(store.get(b), Some(&thumb));
    }

    #[tokio::test]
    async fn test_rekey_moves_a_folder_subtree() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service, generator);
        let child = Path::new("/v/Case1/sub/x.pdf");
        let sibling = Path::new("/v/Case1/subway.pdf");

        let thumb = cache.get_or_generate(child, DocumentType::Pdf).await;
        cache.get_or_generate(sibling, DocumentType::Pdf).await;
        cache.rekey(Path::new("/v/Case1/sub"), Path::new("/v/Case1/renamed"));

        assert!(!cache.contains(child));
        assert_eq!(cache.get(Path::new("/v/Case1/renamed/x.pdf")), Some(thumb));
        assert!(cache.contains(sibling));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_restore_under_puts_back_a_replaced_entry() {
        let service = Arc::new(StoreOnlyService::default());
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service, generator);
        let a = Path::new("/v/Case1/a.pdf");
        let b = Path::new("/v/Case1/b.pdf");
        let thumb_a = cache.get_or_generate(a, DocumentType::Pdf).await;
        let thumb_b = cache.get_or_generate(b, DocumentType::Pdf).await;
        let saved_a = cache.entries_under(a);
        let saved_b = cache.entries_under(b);

        cache.rekey(a, b);
        assert_eq!(cache.get(b), Some(thumb_a.clone()));

        cache.restore_under(b, saved_b);
        cache.restore_under(a, saved_a);
        assert_eq!(cache.get(a), Some(thumb_a));
        assert_eq!(cache.get(b), Some(thumb_b));
    }

    #[tokio::test]
    async fn test_rekey_persisted_tree_follows_the_moved_folder() {
        let service = Arc::new(StoreOnlyService::default());
        let stored = Thumbnail::from_data_uri("data:stored");
        {
            let mut store = service.store.lock().unwrap();
            store.insert(PathBuf::from("/v/Case1/sub/deep/x.pdf"), stored.clone());
        }
        {
            let mut dirs = service.dirs.lock().unwrap();
            dirs.insert(
                PathBuf::from("/v/Case1/new"),
                vec![
                    Item::folder("/v/Case1/new/deep"),
                    Item::file("/v/Case1/new/photo.jpg", DocumentType::Image),
                ],
            );
            dirs.insert(
                PathBuf::from("/v/Case1/new/deep"),
                vec![Item::file("/v/Case1/new/deep/x.pdf", DocumentType::Pdf)],
            );
        }
        let generator = Arc::new(CountingGenerator::new(false));
        let cache = cache_with(service.clone(), generator);

        cache
            .rekey_persisted_tree(Path::new("/v/Case1/sub"), Path::new("/v/Case1/new"))
            .await;

        let store = service.store.lock().unwrap();
        assert!(!store.contains_key(Path::new("/v/Case1/sub/deep/x.pdf")));
        assert_eq!(store.get(Path::new("/v/Case1/new/deep/x.pdf")), Some(&stored));
        assert_eq!(store.len(), 1);
    }
}
