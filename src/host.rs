//! The boundary to the privileged host process that performs file-system I/O.
//!
//! The engine never touches the disk itself; it orchestrates calls through
//! `FileService` and reconciles the results. Tests provide an in-memory
//! implementation.

use crate::core::{Case, CategoryTag, DocumentLocation, HostError, Item};
use crate::thumbnail::Thumbnail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The outcome of a rename or move request.
///
/// The host may answer with `success == false` instead of an error; the
/// engine treats both as a rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    pub success: bool,
    pub new_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl MutationResult {
    pub fn succeeded(new_path: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            new_path: Some(new_path.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            new_path: None,
            error: Some(error.into()),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

#[async_trait]
pub trait FileService: Send + Sync {
    /// `false` when the host process cannot be reached at all.
    fn is_available(&self) -> bool {
        true
    }

    async fn list_cases(&self) -> HostResult<Vec<Case>>;

    /// Raw listing, including internal bookkeeping entries.
    async fn list_directory(&self, path: &Path) -> HostResult<Vec<Item>>;

    async fn create_case(
        &self,
        name: &str,
        description: Option<&str>,
        tag_id: Option<&str>,
    ) -> HostResult<PathBuf>;

    async fn create_folder(&self, parent: &Path, name: &str) -> HostResult<PathBuf>;

    async fn delete_case(&self, path: &Path) -> HostResult<()>;

    async fn delete_file(&self, path: &Path, is_folder: bool) -> HostResult<()>;

    async fn rename_file(&self, path: &Path, new_name: &str) -> HostResult<MutationResult>;

    async fn move_file_to_folder(
        &self,
        path: &Path,
        dest_folder: &Path,
    ) -> HostResult<MutationResult>;

    /// Copies files into a case. `None` lets the host ask the user for files.
    async fn add_files(
        &self,
        case_path: &Path,
        file_paths: Option<&[PathBuf]>,
    ) -> HostResult<Vec<PathBuf>>;

    /// Sets or clears a case background; returns the stored image reference.
    async fn update_case_background(
        &self,
        case_path: &Path,
        image_path: Option<&Path>,
    ) -> HostResult<Option<String>>;

    async fn get_file_thumbnail(&self, path: &Path) -> HostResult<Thumbnail>;

    async fn read_persisted_thumbnail(&self, path: &Path) -> HostResult<Option<Thumbnail>>;

    async fn save_persisted_thumbnail(&self, path: &Path, thumbnail: &Thumbnail) -> HostResult<()>;

    async fn delete_persisted_thumbnail(&self, path: &Path) -> HostResult<()>;

    async fn set_category_tag(&self, target: &Path, tag_id: Option<&str>) -> HostResult<()>;

    async fn get_category_tags(&self) -> HostResult<Vec<CategoryTag>>;

    async fn create_category_tag(&self, name: &str, color: &str) -> HostResult<CategoryTag>;

    async fn delete_category_tag(&self, id: &str) -> HostResult<()>;

    async fn find_document_across_cases(&self, path: &Path) -> HostResult<Option<DocumentLocation>>;
}
